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
use anyhow::Context;
use vresolve_common::Address;

/// outcome of a single table probe.
///
/// `Transient` travels out-of-band in the original design; here every
/// matcher reports it per call and the engine escalates it to the fail
/// flag at the lookup site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome<T> {
    /// the key matched, with the table's value.
    Found(T),
    /// the key is not in the table.
    NotFound,
    /// the backend failed, the caller should defer and retry.
    Transient,
}

impl<T> LookupOutcome<T> {
    /// true for [`LookupOutcome::Found`].
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// a list of domain patterns.
///
/// literal lists match a name by equality; parent-style lists also
/// match any subdomain of a listed pattern. matching is ascii
/// case-insensitive. a `fail:` pattern turns every probe into a
/// transient failure, which is how backend outages are drilled.
#[derive(Debug)]
pub struct DomainList {
    name: &'static str,
    parent_match: bool,
    always_fail: bool,
    patterns: Vec<String>,
}

impl DomainList {
    /// build a literal-matching list; `None` when no pattern is given.
    ///
    /// # Errors
    ///
    /// * a `file:` source could not be read
    pub fn literal(name: &'static str, patterns: &[String]) -> anyhow::Result<Option<Self>> {
        Self::build(name, false, patterns)
    }

    /// build a parent-style list; `None` when no pattern is given.
    ///
    /// # Errors
    ///
    /// * a `file:` source could not be read
    pub fn parent(name: &'static str, patterns: &[String]) -> anyhow::Result<Option<Self>> {
        Self::build(name, true, patterns)
    }

    fn build(
        name: &'static str,
        parent_match: bool,
        patterns: &[String],
    ) -> anyhow::Result<Option<Self>> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut list = Self {
            name,
            parent_match,
            always_fail: false,
            patterns: vec![],
        };
        for pattern in patterns {
            if pattern.starts_with("fail:") {
                list.always_fail = true;
            } else if let Some(path) = pattern.strip_prefix("file:") {
                for line in read_table_file(path)? {
                    list.patterns.push(line.to_lowercase());
                }
            } else {
                list.patterns.push(pattern.to_lowercase());
            }
        }
        Ok(Some(list))
    }

    /// the configuration parameter this list was built from.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// probe the list for a domain name.
    #[must_use]
    pub fn matches(&self, domain: &str) -> LookupOutcome<()> {
        if self.always_fail {
            return LookupOutcome::Transient;
        }

        let domain = domain.to_lowercase();
        for pattern in &self.patterns {
            if domain == *pattern {
                return LookupOutcome::Found(());
            }
            if self.parent_match
                && domain.len() > pattern.len()
                && domain.ends_with(pattern.as_str())
                && domain.as_bytes()[domain.len() - pattern.len() - 1] == b'.'
            {
                return LookupOutcome::Found(());
            }
        }
        LookupOutcome::NotFound
    }
}

/// a map keyed by addresses or domains.
///
/// sources are `inline:{key=value, ...}`, `file:path` with one
/// `key value` entry per line, or `fail:` to make every probe a
/// transient failure. keys are matched ascii case-insensitively.
#[derive(Debug)]
pub struct AddrMap {
    name: &'static str,
    always_fail: bool,
    entries: std::collections::HashMap<String, String>,
}

impl AddrMap {
    /// build a map from its sources; `None` when no source is given.
    ///
    /// # Errors
    ///
    /// * a source has an unknown scheme
    /// * an `inline:` source is not brace-enclosed `key=value` pairs
    /// * a `file:` source could not be read or holds a keyless line
    pub fn from_sources(name: &'static str, sources: &[String]) -> anyhow::Result<Option<Self>> {
        if sources.is_empty() {
            return Ok(None);
        }

        let mut map = Self {
            name,
            always_fail: false,
            entries: std::collections::HashMap::new(),
        };
        for source in sources {
            if source.starts_with("fail:") {
                map.always_fail = true;
            } else if let Some(inline) = source.strip_prefix("inline:") {
                let inline = inline
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .with_context(|| {
                        format!("{name}: inline source must be enclosed in braces: '{source}'")
                    })?;
                for entry in inline.split(',') {
                    let (key, value) = entry.split_once('=').with_context(|| {
                        format!("{name}: inline entry without '=': '{entry}'")
                    })?;
                    map.entries
                        .insert(key.trim().to_lowercase(), value.trim().to_string());
                }
            } else if let Some(path) = source.strip_prefix("file:") {
                for line in read_table_file(path)? {
                    let (key, value) = line
                        .split_once(char::is_whitespace)
                        .with_context(|| format!("{name}: entry without a value: '{line}'"))?;
                    map.entries
                        .insert(key.to_lowercase(), value.trim().to_string());
                }
            } else {
                anyhow::bail!("{name}: unknown table source: '{source}'");
            }
        }
        Ok(Some(map))
    }

    /// the configuration parameter this map was built from.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(&key.to_lowercase()).cloned()
    }

    /// probe the map the way user tables are searched: the full
    /// address, then the address with its extension removed, then the
    /// `@domain` catch-all.
    #[must_use]
    pub fn find_addr(&self, addr: &Address, delimiter: Option<char>) -> LookupOutcome<String> {
        if self.always_fail {
            return LookupOutcome::Transient;
        }

        if let Some(value) = self.get(addr.full()) {
            return LookupOutcome::Found(value);
        }
        if let Some(bare) = delimiter.and_then(|delimiter| addr.without_extension(delimiter)) {
            if let Some(value) = self.get(bare.full()) {
                return LookupOutcome::Found(value);
            }
        }
        if !addr.domain().is_empty() {
            if let Some(value) = self.get(&format!("@{}", addr.domain())) {
                return LookupOutcome::Found(value);
            }
        }
        LookupOutcome::NotFound
    }

    /// probe the map the way the transport table is searched: the full
    /// address, the address without extension, the domain, every parent
    /// domain, then the `*` catch-all.
    #[must_use]
    pub fn find_transport(&self, addr: &Address, delimiter: Option<char>) -> LookupOutcome<String> {
        if self.always_fail {
            return LookupOutcome::Transient;
        }

        if let Some(value) = self.get(addr.full()) {
            return LookupOutcome::Found(value);
        }
        if let Some(bare) = delimiter.and_then(|delimiter| addr.without_extension(delimiter)) {
            if let Some(value) = self.get(bare.full()) {
                return LookupOutcome::Found(value);
            }
        }

        let mut domain = addr.domain();
        while !domain.is_empty() {
            if let Some(value) = self.get(domain) {
                return LookupOutcome::Found(value);
            }
            domain = domain.split_once('.').map_or("", |(_, parent)| parent);
        }

        if let Some(value) = self.get("*") {
            return LookupOutcome::Found(value);
        }
        LookupOutcome::NotFound
    }
}

/// read a line-oriented table file, skipping blanks and `#` comments.
fn read_table_file(path: &str) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read table file '{path}'"))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
