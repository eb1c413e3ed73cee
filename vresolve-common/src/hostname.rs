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

/// upper bound on a hostname, dots included.
pub const VALID_HOSTNAME_LEN: usize = 256;

/// longest permitted label between dots.
pub const VALID_LABEL_LEN: usize = 63;

/// syntactic hostname check: dot-separated labels of ascii letters,
/// digits and interior hyphens.
///
/// this is looser than a full domain-name parser on purpose: the
/// resolver only needs to tell "could be a next hop" from garbage, and
/// single-label names must pass.
#[must_use]
pub fn valid_hostname(name: &str) -> bool {
    if name.is_empty() || name.len() > VALID_HOSTNAME_LEN {
        return false;
    }

    let mut label_len = 0;
    let mut last = '.';
    for ch in name.chars() {
        match ch {
            '.' => {
                if label_len == 0 || last == '-' {
                    return false;
                }
                label_len = 0;
            }
            '-' => {
                if label_len == 0 {
                    return false;
                }
                label_len += 1;
            }
            c if c.is_ascii_alphanumeric() => label_len += 1,
            _ => return false,
        }
        if label_len > VALID_LABEL_LEN {
            return false;
        }
        last = ch;
    }

    label_len != 0 && last != '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(valid_hostname("example.com"));
        assert!(valid_hostname("mail-1.sub.example.com"));
        assert!(valid_hostname("localhost"));
        assert!(valid_hostname("remote"));
        assert!(valid_hostname("0example.com"));
    }

    #[test]
    fn rejects_misplaced_delimiters() {
        assert!(!valid_hostname(""));
        assert!(!valid_hostname("."));
        assert!(!valid_hostname("a..b"));
        assert!(!valid_hostname(".example.com"));
        assert!(!valid_hostname("example.com."));
        assert!(!valid_hostname("-example.com"));
        assert!(!valid_hostname("example-.com"));
        assert!(!valid_hostname("example.com-"));
    }

    #[test]
    fn rejects_foreign_characters() {
        assert!(!valid_hostname("exa_mple.com"));
        assert!(!valid_hostname("user@example.com"));
        assert!(!valid_hostname("[127.0.0.1]"));
    }

    #[test]
    fn rejects_oversized_names() {
        assert!(!valid_hostname(&"a".repeat(VALID_LABEL_LEN + 1)));
        assert!(valid_hostname(&"a".repeat(VALID_LABEL_LEN)));

        let long = ["a".repeat(60).as_str(); 5].join(".");
        assert!(!valid_hostname(&long));
    }
}
