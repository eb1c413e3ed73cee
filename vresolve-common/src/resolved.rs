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

/// the flag word attached to a resolution result.
///
/// exactly one class bit is set on success; the independent bits can be
/// combined with any class. the numeric encoding is part of the wire
/// protocol and must match on both endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(into = "u32", from = "u32")]
pub struct ResolveFlags(u32);

impl ResolveFlags {
    /// destination is handled by the local delivery transport.
    pub const CLASS_LOCAL: Self = Self(1);
    /// destination is an alias-only virtual domain, mail bounces.
    pub const CLASS_ALIAS: Self = Self(2);
    /// destination is a virtual mailbox domain.
    pub const CLASS_VIRTUAL: Self = Self(4);
    /// destination is a domain this host relays for.
    pub const CLASS_RELAY: Self = Self(8);
    /// destination matched no list, the default transport applies.
    pub const CLASS_DEFAULT: Self = Self(16);
    /// routing operators survived into the local part of a remote destination.
    pub const FLAG_ROUTED: Self = Self(256);
    /// the nexthop does not look like a hostname or address literal.
    pub const FLAG_ERROR: Self = Self(512);
    /// a lookup backend failed transiently, the result is partial.
    pub const FLAG_FAIL: Self = Self(1024);

    const NAMES: [(Self, &'static str); 8] = [
        (Self::CLASS_LOCAL, "local"),
        (Self::CLASS_ALIAS, "alias"),
        (Self::CLASS_VIRTUAL, "virtual"),
        (Self::CLASS_RELAY, "relay"),
        (Self::CLASS_DEFAULT, "default"),
        (Self::FLAG_ROUTED, "routed"),
        (Self::FLAG_ERROR, "error"),
        (Self::FLAG_FAIL, "fail"),
    ];

    /// no bit set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// the raw flag word.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// true when every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// set every bit of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// only the class bits of the word.
    #[must_use]
    pub const fn class(self) -> Self {
        Self(self.0 & 0x1f)
    }
}

impl From<u32> for ResolveFlags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<ResolveFlags> for u32 {
    fn from(flags: ResolveFlags) -> Self {
        flags.0
    }
}

impl std::ops::BitOr for ResolveFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ResolveFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for ResolveFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// the triple a resolution produces, plus its flag word.
///
/// on success `transport` and `nexthop` are non-empty and `recipient`
/// has the `local@domain` form.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedAddr {
    /// name of the delivery channel that handles the recipient.
    pub transport: String,
    /// next hop handed to the transport, hostname or bracketed literal.
    pub nexthop: String,
    /// the final internalized recipient.
    pub recipient: String,
    /// classification of the destination.
    pub flags: ResolveFlags,
}
