// Copyright (C) 2025 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(
  clippy::collapsible_if,
  clippy::fn_to_numeric_cast,
  clippy::let_and_return,
  clippy::let_unit_value
)]

mod args;

use std::borrow::Cow;
use std::env::args_os;
use std::env::var_os;
use std::ffi::OsString;
use std::io;
use std::io::IsTerminal as _;

use clap::Parser as _;

use anyhow::Context as _;
use anyhow::Result;

use psmtp::load_config;
use psmtp::send_email;
use psmtp::system_config_path;

use tokio::io::stdin;
use tokio::io::AsyncReadExt as _;

use tracing::info;
use tracing::subscriber::set_global_default as set_global_subscriber;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::FmtSubscriber;

use crate::args::normalize_args;
use crate::args::Args;


async fn run_impl(args: Args) -> Result<()> {
  // Recipients are checked first, so that a usage error never
  // causes the configuration or standard input to be read.
  let recipients = args.recipients()?;

  let Args {
    recipients: _,
    to: _,
    subject,
    config,
    verbosity: _,
  } = args;

  let path = if let Some(config) = config {
    Cow::Owned(config)
  } else {
    system_config_path()?
  };
  let config = load_config(&path)
    .await
    .with_context(|| format!("failed to load configuration from `{}`", path.display()))?;

  // At this point tokio's stdin does not sport the `is_terminal`
  // method so we have to go through std here.
  if io::stdin().is_terminal() {
    eprintln!("Please enter message (terminate with Ctrl-D):");
  }

  let mut body = Vec::new();
  let _count = stdin()
    .read_to_end(&mut body)
    .await
    .context("failed to read message from stdin")?;

  let subject = subject.as_deref().unwrap_or("");
  let () = send_email(&config.account(), subject, &body, recipients.iter()).await?;

  info!("email sent successfully");
  Ok(())
}

fn setup_tracing(verbosity: u8) -> Result<()> {
  let builder = FmtSubscriber::builder()
    .with_writer(io::stderr)
    .with_timer(ChronoLocal::new("%Y-%m-%dT%H:%M:%S%.3f%:z".to_string()));

  if verbosity != 0 {
    let level = match verbosity {
      1 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    };
    let subscriber = builder.with_max_level(level).finish();
    let () =
      set_global_subscriber(subscriber).with_context(|| "failed to set tracing subscriber")?;
  } else {
    let directive = var_os(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let directive = directive
      .to_str()
      .with_context(|| format!("env var `{}` is not valid UTF-8", EnvFilter::DEFAULT_ENV))?;
    let directive = if directive.is_empty() {
      "info"
    } else {
      directive
    };

    let subscriber = builder.with_env_filter(EnvFilter::new(directive)).finish();
    let () =
      set_global_subscriber(subscriber).with_context(|| "failed to set tracing subscriber")?;
  }
  Ok(())
}


/// Run the program and report errors, if any.
async fn run<A, T>(args: A) -> Result<()>
where
  A: IntoIterator<Item = T>,
  T: Into<OsString>,
{
  let args = match Args::try_parse_from(normalize_args(args)) {
    Ok(args) => args,
    Err(err) => match err.kind() {
      clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
        print!("{}", err);
        return Ok(())
      },
      _ => return Err(err.into()),
    },
  };

  let () = setup_tracing(args.verbosity)?;

  run_impl(args).await
}


#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  run(args_os()).await
}
