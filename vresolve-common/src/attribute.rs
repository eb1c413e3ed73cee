/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 *  This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

//! plain-text attribute framing.
//!
//! a request or reply is a list of `name=value` lines closed by one
//! empty line. values are escaped with `%XX` so a hostile local part
//! cannot forge an attribute boundary. both endpoints must agree on
//! this file, there is no negotiation.

use anyhow::Context;

/// request attribute: the internalized recipient to resolve.
pub const ATTR_ADDR: &str = "addr";
/// reply attribute: name of the selected delivery channel.
pub const ATTR_TRANSPORT: &str = "transport";
/// reply attribute: next hop for the selected channel.
pub const ATTR_NEXTHOP: &str = "nexthop";
/// reply attribute: final internalized recipient.
pub const ATTR_RECIPIENT: &str = "recipient";
/// reply attribute: the flag word, decimal.
pub const ATTR_FLAGS: &str = "flags";

/// escape a value for transport: `%`, `=`, newline and every other
/// control byte become `%XX`.
#[must_use]
pub fn encode_value(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len());
    for byte in value.bytes() {
        if byte == b'%' || byte == b'=' || byte < 0x20 || byte == 0x7f {
            out.extend_from_slice(format!("%{byte:02X}").as_bytes());
        } else {
            out.push(byte);
        }
    }
    String::from_utf8(out).expect("escaping preserves utf8")
}

/// undo [`encode_value`].
///
/// # Errors
///
/// * a `%` escape is truncated or not hexadecimal
/// * the decoded bytes are not utf8
pub fn decode_value(value: &str) -> anyhow::Result<String> {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(byte) = bytes.next() {
        if byte == b'%' {
            let hex = [
                bytes
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("truncated %XX escape"))?,
                bytes
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("truncated %XX escape"))?,
            ];
            let hex = std::str::from_utf8(&hex).context("escape is not ascii")?;
            out.push(u8::from_str_radix(hex, 16).context("escape is not hexadecimal")?);
        } else {
            out.push(byte);
        }
    }
    String::from_utf8(out).context("decoded value is not utf8")
}

/// write an attribute list and its terminator, then flush.
///
/// # Errors
///
/// * the underlying stream failed to write or flush
pub fn write_attrs<W: std::io::Write>(
    stream: &mut W,
    attrs: &[(&str, &str)],
) -> anyhow::Result<()> {
    for (name, value) in attrs {
        stream
            .write_all(format!("{}={}\n", name, encode_value(value)).as_bytes())
            .context("failed to write attribute")?;
    }
    stream.write_all(b"\n").context("failed to write attribute terminator")?;
    stream.flush().context("failed to flush attribute stream")?;
    Ok(())
}

/// read one attribute list in strict mode.
///
/// exactly the attributes named in `expected` must be present, each
/// once, in any order; anything else aborts the request. returns the
/// decoded values in the order of `expected`, or `None` when the stream
/// is at end of file before the first line.
///
/// # Errors
///
/// * the underlying stream failed to read
/// * the stream closed in the middle of a list
/// * an attribute is unknown, duplicated or missing
pub fn read_attrs<R: std::io::BufRead>(
    stream: &mut R,
    expected: &[&str],
) -> anyhow::Result<Option<Vec<String>>> {
    let mut values: Vec<Option<String>> = vec![None; expected.len()];
    let mut seen_any = false;

    loop {
        let mut line = String::new();
        let size = stream.read_line(&mut line).context("failed to read attribute")?;
        if size == 0 {
            if seen_any {
                anyhow::bail!("stream closed inside an attribute list");
            }
            return Ok(None);
        }
        seen_any = true;

        let line = line.trim_end_matches('\n');
        if line.is_empty() {
            break;
        }

        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("malformed attribute line: '{}'", line))?;
        let slot = expected
            .iter()
            .position(|want| *want == name)
            .ok_or_else(|| anyhow::anyhow!("unexpected attribute: '{}'", name))?;
        if values[slot].is_some() {
            anyhow::bail!("duplicate attribute: '{}'", name);
        }
        values[slot] = Some(decode_value(value)?);
    }

    expected
        .iter()
        .zip(values)
        .map(|(name, value)| value.ok_or_else(|| anyhow::anyhow!("missing attribute: '{}'", name)))
        .collect::<anyhow::Result<Vec<String>>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut buffer = vec![];
        write_attrs(&mut buffer, &[(ATTR_ADDR, "user@example.com")]).unwrap();

        let mut cursor = std::io::Cursor::new(buffer);
        assert_eq!(
            read_attrs(&mut cursor, &[ATTR_ADDR]).unwrap().unwrap(),
            vec!["user@example.com".to_string()]
        );
        // the list was consumed, the stream is at end of file.
        assert!(read_attrs(&mut cursor, &[ATTR_ADDR]).unwrap().is_none());
    }

    #[test]
    fn escaping_control_bytes() {
        assert_eq!(encode_value("a=b%c\nd"), "a%3Db%25c%0Ad");
        assert_eq!(decode_value("a%3Db%25c%0Ad").unwrap(), "a=b%c\nd");
        // multi-byte characters pass through untouched.
        assert_eq!(encode_value("rené@example.com"), "rené@example.com");
        assert_eq!(
            decode_value(&encode_value("rené@example.com")).unwrap(),
            "rené@example.com"
        );
    }

    #[test]
    fn reply_order_is_fixed() {
        let mut buffer = vec![];
        write_attrs(
            &mut buffer,
            &[
                (ATTR_TRANSPORT, "smtp"),
                (ATTR_NEXTHOP, "example.com"),
                (ATTR_RECIPIENT, "u@example.com"),
                (ATTR_FLAGS, "16"),
            ],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "transport=smtp\nnexthop=example.com\nrecipient=u@example.com\nflags=16\n\n"
        );
    }

    #[test]
    fn strict_mode_rejects_unknown_and_missing() {
        let mut unknown = std::io::Cursor::new(b"addr=a@b\nbogus=1\n\n".to_vec());
        assert!(read_attrs(&mut unknown, &[ATTR_ADDR]).is_err());

        let mut missing = std::io::Cursor::new(b"\n".to_vec());
        assert!(read_attrs(&mut missing, &[ATTR_ADDR]).is_err());

        let mut duplicated = std::io::Cursor::new(b"addr=a@b\naddr=c@d\n\n".to_vec());
        assert!(read_attrs(&mut duplicated, &[ATTR_ADDR]).is_err());
    }

    #[test]
    fn truncated_list_is_an_error() {
        let mut truncated = std::io::Cursor::new(b"addr=a@b\n".to_vec());
        assert!(read_attrs(&mut truncated, &[ATTR_ADDR]).is_err());
    }
}
