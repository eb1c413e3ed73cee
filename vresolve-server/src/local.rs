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

/// the set of domains that name this host.
///
/// built once from the server hostname and the `mydestination`
/// parameter, immutable afterwards.
#[derive(Debug)]
pub struct LocalDomains {
    names: Vec<String>,
}

impl LocalDomains {
    /// collect the host's own names, lowercased.
    #[must_use]
    pub fn new(myhostname: &str, mydestination: &[String]) -> Self {
        let mut names = vec![myhostname.to_lowercase()];
        names.extend(mydestination.iter().map(|name| name.to_lowercase()));
        Self { names }
    }

    /// true iff `domain` names this host or an equivalent destination.
    ///
    /// one trailing dot is ignored; `[address-literal]` entries match
    /// literally.
    #[must_use]
    pub fn is_local_domain(&self, domain: &str) -> bool {
        let domain = domain.strip_suffix('.').unwrap_or(domain).to_lowercase();
        self.names.iter().any(|name| *name == domain)
    }
}
