// Copyright (C) 2025 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::ArgAction;
use clap::CommandFactory as _;
use clap::Parser;


/// Options that may be spelled with a single leading dash, e.g.,
/// `-subject`, in addition to the regular `--subject`.
const LONG_OPTIONS: [&str; 3] = ["config", "subject", "to"];
/// Short options that consume the following argument as value.
const SHORT_OPTIONS: [&str; 2] = ["c", "s"];


/// A program for sending an email read from standard input.
///
/// Example: echo "Hello, world!" | psmtp -s "Test Message" destination@gmail.com
#[derive(Debug, Parser)]
#[clap(name = "psmtp", version, args_override_self = true)]
pub(crate) struct Args {
  /// Comma-separated list of recipients.
  ///
  /// Ignored if --to is provided.
  #[clap(value_name = "RECIPIENTS")]
  pub recipients: Vec<String>,
  /// Comma-separated list of recipients (overrides the positional
  /// argument).
  #[clap(long, value_name = "CSV")]
  pub to: Option<String>,
  /// The subject to use for the email.
  #[clap(short, long)]
  pub subject: Option<String>,
  /// The path to the JSON configuration file; defaults to
  /// $HOME/.psmtp/config.json.
  #[clap(short, long)]
  pub config: Option<PathBuf>,
  /// Increase verbosity (can be supplied multiple times).
  #[clap(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
  pub verbosity: u8,
}

impl Args {
  /// Retrieve the list of recipients to send the email to.
  ///
  /// The value of `--to` takes precedence over the first positional
  /// argument. An error is reported if neither yields at least one
  /// recipient.
  pub fn recipients(&self) -> Result<Vec<String>, clap::Error> {
    let csv = self
      .to
      .as_deref()
      .filter(|to| !to.is_empty())
      .or_else(|| self.recipients.first().map(String::as_str));
    let recipients = csv.map(split_recipients).unwrap_or_default();

    if recipients.is_empty() {
      return Err(Self::command().error(
        ErrorKind::MissingRequiredArgument,
        "no recipients provided; use --to or pass them as positional argument",
      ))
    }
    Ok(recipients)
  }
}


/// Split a comma-separated list of recipients, dropping empty entries.
fn split_recipients(csv: &str) -> Vec<String> {
  csv
    .split(',')
    .map(str::trim)
    .filter(|recipient| !recipient.is_empty())
    .map(str::to_string)
    .collect()
}


/// Normalize a single argument, returning the possibly rewritten
/// argument and whether the next argument is to be treated as the
/// value of the option.
fn normalize_arg(arg: &str) -> (Cow<'_, str>, bool) {
  if let Some(option) = arg.strip_prefix("--") {
    let (name, value) = option
      .split_once('=')
      .map_or((option, None), |(name, value)| (name, Some(value)));
    if SHORT_OPTIONS.contains(&name) {
      (Cow::Owned(arg[1..].to_string()), value.is_none())
    } else {
      (Cow::Borrowed(arg), value.is_none() && LONG_OPTIONS.contains(&name))
    }
  } else if let Some(option) = arg.strip_prefix('-') {
    let (name, value) = option
      .split_once('=')
      .map_or((option, None), |(name, value)| (name, Some(value)));
    if LONG_OPTIONS.contains(&name) {
      (Cow::Owned(format!("-{arg}")), value.is_none())
    } else {
      (Cow::Borrowed(arg), SHORT_OPTIONS.contains(&option))
    }
  } else {
    (Cow::Borrowed(arg), false)
  }
}


/// Rewrite single-dash spellings of long options (`-config`,
/// `-subject`, `-to`) into their double-dash equivalents and
/// double-dash spellings of short options (`--c`, `--s`) into their
/// single-dash ones.
///
/// Option values and arguments following `--` are left untouched.
pub(crate) fn normalize_args<A, T>(args: A) -> Vec<OsString>
where
  A: IntoIterator<Item = T>,
  T: Into<OsString>,
{
  let mut args = args.into_iter().map(Into::into);
  let mut normalized = Vec::new();
  // The program name is never an option.
  if let Some(program) = args.next() {
    let () = normalized.push(program);
  }

  let mut expect_value = false;
  let mut terminated = false;

  for arg in args {
    let arg = if terminated || expect_value {
      expect_value = false;
      arg
    } else {
      match arg.to_str() {
        Some("--") => {
          terminated = true;
          arg
        },
        Some(string) => {
          let (string, value) = normalize_arg(string);
          expect_value = value;
          OsString::from(string.as_ref())
        },
        None => arg,
      }
    };
    let () = normalized.push(arg);
  }
  normalized
}
