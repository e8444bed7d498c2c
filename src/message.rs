// Copyright (C) 2025 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Assemble a raw message from the given header values and body.
///
/// `From`, `To`, and `Subject` headers are emitted in that order, each
/// terminated by CRLF, followed by an empty CRLF line and the body
/// bytes as-is. Header values are not encoded or escaped in any way.
pub fn build_message<R, S>(from: &str, subject: &str, recipients: R, body: &[u8]) -> Vec<u8>
where
  R: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let to = recipients
    .into_iter()
    .fold(String::new(), |mut to, recipient| {
      if !to.is_empty() {
        to.push_str(", ");
      }
      to.push_str(recipient.as_ref());
      to
    });

  let mut message = Vec::with_capacity(from.len() + to.len() + subject.len() + body.len() + 32);
  let () = message.extend_from_slice(format!("From: {from}\r\n").as_bytes());
  let () = message.extend_from_slice(format!("To: {to}\r\n").as_bytes());
  let () = message.extend_from_slice(format!("Subject: {subject}\r\n").as_bytes());
  let () = message.extend_from_slice(b"\r\n");
  let () = message.extend_from_slice(body);
  message
}
