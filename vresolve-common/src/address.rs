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

/// Address Email
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, Eq)]
#[serde(into = "String", try_from = "String")]
pub struct Address {
    #[serde(skip)]
    at_sign: usize,
    full: String,
}

impl TryFrom<String> for Address {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if let Err(error) = addr::parse_email_address(&value) {
            anyhow::bail!("'{}' is not a valid address: {}", value, error)
        }
        Ok(Self {
            at_sign: value.find('@').expect("must find '@' at this point"),
            full: value,
        })
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.full().to_string()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.full == other.full
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.full.hash(state);
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full)
    }
}

impl Address {
    /// wrap an internal-form recipient without validation.
    ///
    /// the resolver produces recipients that are syntactically anchored
    /// on `local@domain` but whose local part may hold routing operators
    /// the strict rfc parser rejects, so resolution results use this
    /// constructor. the domain is everything after the rightmost `@`.
    #[must_use]
    pub fn new_unchecked(full: String) -> Self {
        Self {
            at_sign: full.rfind('@').unwrap_or(full.len()),
            full,
        }
    }

    /// get the full email address.
    #[must_use]
    pub fn full(&self) -> &str {
        &self.full
    }

    /// get the user of the address.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.full[..self.at_sign]
    }

    /// get the fqdn of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        if self.at_sign == self.full.len() {
            ""
        } else {
            &self.full[self.at_sign + 1..]
        }
    }

    /// the same address with its local part extension removed, if the
    /// local part carries one (`user+ext@domain` with delimiter `+`).
    #[must_use]
    pub fn without_extension(&self, delimiter: char) -> Option<Self> {
        self.local_part().find(delimiter).map(|cut| {
            Self::new_unchecked(format!("{}@{}", &self.local_part()[..cut], self.domain()))
        })
    }
}
