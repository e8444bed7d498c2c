// Copyright (C) 2025 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(feature = "config")]
use std::borrow::Cow;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use anyhow::bail;
#[cfg(feature = "config")]
use anyhow::Context as _;
#[cfg(feature = "config")]
use anyhow::Result;

#[cfg(feature = "config")]
use serde::Deserialize;


/// A type representing the account used for submitting an email.
#[derive(Clone, Copy)]
pub struct Account<'input> {
  /// The email address of the sender, also used as login.
  pub email: &'input str,
  /// The password to use for logging in.
  pub password: &'input str,
  /// The hostname of the SMTP server.
  pub smtp_host: &'input str,
  /// The port of the SMTP server, in textual form.
  pub smtp_port: &'input str,
}

impl Debug for Account<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Account")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .field("smtp_host", &self.smtp_host)
      .field("smtp_port", &self.smtp_port)
      .finish()
  }
}


/// The program's configuration, as read from a JSON file.
///
/// Unknown fields are ignored. Fields that are not present are
/// treated as empty and rejected by [`Config::validate`].
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
#[derive(Clone, Default, Deserialize)]
pub struct Config {
  /// The sender's email address.
  #[serde(default)]
  pub email: String,
  /// The SMTP password or app specific password.
  #[serde(default)]
  pub password: String,
  /// The hostname of the SMTP server (e.g., `smtp.gmail.com`).
  #[serde(default)]
  pub smtp_host: String,
  /// The port of the SMTP server (e.g., `"587"`).
  #[serde(default)]
  pub smtp_port: String,
}

#[cfg(feature = "config")]
impl Config {
  /// Check that all required fields are set.
  pub fn validate(&self) -> Result<()> {
    let missing = [
      ("email", &self.email),
      ("password", &self.password),
      ("smtp_host", &self.smtp_host),
      ("smtp_port", &self.smtp_port),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect::<Vec<_>>();

    if !missing.is_empty() {
      bail!(
        "incomplete config: missing required field(s) {}",
        missing.join(", ")
      )
    }
    Ok(())
  }

  /// Retrieve the account described by this configuration.
  pub fn account(&self) -> Account<'_> {
    Account {
      email: &self.email,
      password: &self.password,
      smtp_host: &self.smtp_host,
      smtp_port: &self.smtp_port,
    }
  }
}

#[cfg(feature = "config")]
impl Debug for Config {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(&self.account(), f)
  }
}


/// Retrieve the path to the per-user configuration file,
/// `~/.psmtp/config.json`.
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub fn system_config_path() -> Result<Cow<'static, Path>> {
  let home = dirs::home_dir().context("could not determine home directory")?;
  let path = home.join(".psmtp").join("config.json");
  Ok(Cow::Owned(path))
}


/// Load and validate the configuration stored at `path`.
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub async fn load_config(path: &Path) -> Result<Config> {
  let data = tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read configuration file `{}`", path.display()))?;
  let config = serde_json::from_slice::<Config>(&data)
    .with_context(|| format!("failed to parse `{}` contents as JSON", path.display()))?;
  let () = config.validate()?;
  Ok(config)
}
