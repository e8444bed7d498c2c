// Copyright (C) 2025 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

//! A library for submitting a plain, pre-formatted email to an SMTP
//! server.

#![allow(
  clippy::collapsible_else_if,
  clippy::collapsible_if,
  clippy::let_and_return,
  clippy::let_unit_value
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod message;

use std::error::Error as StdError;

use anyhow::Context as _;
use anyhow::Result;

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::authentication::Mechanism;
use lettre::transport::smtp::client::Tls;
use lettre::transport::smtp::client::TlsParameters;
use lettre::Address;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Tokio1Executor;

#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::load_config;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::system_config_path;
pub use crate::config::Account;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::Config;
pub use crate::message::build_message;


/// Check whether `host` refers to the local machine.
fn is_loopback(host: &str) -> bool {
  matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
}


/// Create the SMTP transport for the given account.
///
/// STARTTLS is mandatory unless the server is reachable over the
/// loopback interface, so that credentials never travel in clear
/// text across the network.
fn mailer(account: &Account<'_>) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
  let port = account
    .smtp_port
    .parse::<u16>()
    .with_context(|| format!("failed to parse SMTP port `{}`", account.smtp_port))?;
  let params = TlsParameters::new(account.smtp_host.to_string())
    .with_context(|| format!("failed to create TLS parameters for `{}`", account.smtp_host))?;
  let tls = if is_loopback(account.smtp_host) {
    Tls::Opportunistic(params)
  } else {
    Tls::Required(params)
  };
  let creds = Credentials::new(account.email.to_string(), account.password.to_string());

  let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(account.smtp_host)
    .port(port)
    .tls(tls)
    .credentials(creds)
    .authentication(vec![Mechanism::Plain])
    .build();
  Ok(mailer)
}


/// Create the SMTP envelope for a message from `from` to `recipients`.
fn envelope<R, S>(from: &str, recipients: R) -> Result<Envelope>
where
  R: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let from = from
    .parse::<Address>()
    .with_context(|| format!("failed to parse sender address `{from}`"))?;
  let to = recipients
    .into_iter()
    .map(|recipient| {
      let recipient = recipient.as_ref();
      recipient
        .parse::<Address>()
        .with_context(|| format!("failed to parse recipient address `{recipient}`"))
    })
    .collect::<Result<Vec<_>>>()?;

  let envelope = Envelope::new(Some(from), to).context("failed to create SMTP envelope")?;
  Ok(envelope)
}


/// Build a message and submit it to all `recipients` using the
/// provided transport, in a single transaction.
#[cfg_attr(
  feature = "tracing",
  tracing::instrument(skip_all, fields(host = account.smtp_host, port = account.smtp_port))
)]
pub async fn send_message<T, R, I, S>(
  transport: &T,
  account: &Account<'_>,
  subject: &str,
  body: &[u8],
  recipients: R,
) -> Result<()>
where
  T: AsyncTransport,
  T::Error: StdError + Send + Sync + 'static,
  R: IntoIterator<IntoIter = I>,
  I: Iterator<Item = S> + Clone,
  S: AsRef<str>,
{
  let recipients = recipients.into_iter();
  let envelope = envelope(account.email, recipients.clone())?;
  let message = build_message(account.email, subject, recipients, body);

  #[cfg(feature = "tracing")]
  tracing::debug!(
    recipients = envelope.to().len(),
    bytes = message.len(),
    "submitting message"
  );

  let _response = transport
    .send_raw(&envelope, &message)
    .await
    .with_context(|| format!("failed to send email via {}", account.smtp_host))?;
  Ok(())
}


/// Send an email with the given subject and body to all `recipients`
/// through the SMTP server of `account`.
pub async fn send_email<R, I, S>(
  account: &Account<'_>,
  subject: &str,
  body: &[u8],
  recipients: R,
) -> Result<()>
where
  R: IntoIterator<IntoIter = I>,
  I: Iterator<Item = S> + Clone,
  S: AsRef<str>,
{
  let mailer = mailer(account)
    .with_context(|| format!("failed to create SMTP mailer for {}", account.smtp_host))?;
  send_message(&mailer, account, subject, body, recipients).await
}


#[cfg(test)]
mod tests {
  use super::*;

  use lettre::transport::stub::AsyncStubTransport;

  use tokio::test;


  const ACCOUNT: Account<'static> = Account {
    email: "me@x.com",
    password: "secret",
    smtp_host: "smtp.x.com",
    smtp_port: "587",
  };


  /// Check that exactly one message is submitted, with the expected
  /// envelope and contents.
  #[test]
  async fn single_submission() {
    let transport = AsyncStubTransport::new_ok();
    let () = send_message(
      &transport,
      &ACCOUNT,
      "Test",
      b"Body text",
      ["dest@example.com"],
    )
    .await
    .unwrap();

    let messages = transport.messages().await;
    assert_eq!(messages.len(), 1);

    let (envelope, message) = &messages[0];
    assert_eq!(envelope.from(), Some(&"me@x.com".parse::<Address>().unwrap()));
    assert_eq!(envelope.to(), &["dest@example.com".parse::<Address>().unwrap()]);
    assert_eq!(
      message,
      "From: me@x.com\r\nTo: dest@example.com\r\nSubject: Test\r\n\r\nBody text"
    );
  }

  /// Check that all recipients end up in a single transaction, in
  /// order and without deduplication.
  #[test]
  async fn multiple_recipients() {
    let transport = AsyncStubTransport::new_ok();
    let recipients = vec!["a@x.com".to_string(), "b@y.com".to_string(), "a@x.com".to_string()];
    let () = send_message(&transport, &ACCOUNT, "", b"", &recipients)
      .await
      .unwrap();

    let messages = transport.messages().await;
    assert_eq!(messages.len(), 1);

    let (envelope, message) = &messages[0];
    let expected = recipients
      .iter()
      .map(|recipient| recipient.parse::<Address>().unwrap())
      .collect::<Vec<_>>();
    assert_eq!(envelope.to(), expected.as_slice());
    assert!(message.starts_with("From: me@x.com\r\nTo: a@x.com, b@y.com, a@x.com\r\n"));
  }

  /// Make sure that transport failures are reported.
  #[test]
  async fn transport_failure() {
    let transport = AsyncStubTransport::new_error();
    let err = send_message(&transport, &ACCOUNT, "Test", b"body", ["dest@example.com"])
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "failed to send email via smtp.x.com");
  }

  /// Check that invalid addresses are rejected before anything is
  /// submitted.
  #[test]
  async fn invalid_address() {
    let transport = AsyncStubTransport::new_ok();
    let err = send_message(&transport, &ACCOUNT, "Test", b"body", ["not an address"])
      .await
      .unwrap_err();
    assert_eq!(
      err.to_string(),
      "failed to parse recipient address `not an address`"
    );
    assert!(transport.messages().await.is_empty());
  }

  /// Check that a non-numeric port is reported as an error.
  #[test]
  async fn invalid_port() {
    let account = Account {
      smtp_port: "smtp",
      ..ACCOUNT
    };
    let err = send_email(&account, "Test", b"body", ["dest@example.com"])
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "failed to create SMTP mailer for smtp.x.com");
    assert_eq!(
      err.root_cause().to_string(),
      "invalid digit found in string"
    );
  }

  /// Check which hosts we consider local.
  #[test]
  async fn loopback_hosts() {
    assert!(is_loopback("localhost"));
    assert!(is_loopback("127.0.0.1"));
    assert!(is_loopback("::1"));
    assert!(!is_loopback("smtp.gmail.com"));
    assert!(!is_loopback("10.0.0.1"));
  }
}
