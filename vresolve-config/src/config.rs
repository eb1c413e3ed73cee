#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

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

///
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(
        serialize_with = "crate::parser::semver::serialize",
        deserialize_with = "crate::parser::semver::deserialize"
    )]
    pub version_requirement: semver::VersionReq,
    #[serde(default)]
    pub server: ConfigServer,
    #[serde(default)]
    pub resolver: ConfigResolver,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServer {
    // TODO: parse valid fqdn
    #[serde(default = "ConfigServer::hostname")]
    pub domain: String,
    #[serde(default = "ConfigServer::default_listener")]
    pub listener: std::net::SocketAddr,
    #[serde(default)]
    pub logs: ConfigServerLogs,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServerLogs {
    #[serde(default = "ConfigServerLogs::default_filepath")]
    pub filepath: std::path::PathBuf,
    #[serde(default = "ConfigServerLogs::default_format")]
    pub format: String,
    #[serde(default)]
    pub level: std::collections::BTreeMap<String, log::LevelFilter>,
}

/// parameters of the address resolving engine.
///
/// the transports may carry a next hop of their own using the
/// `name:nexthop` form. an empty table parameter means the table is
/// absent and never matches.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigResolver {
    /// parse the raw internal form instead of requoting it first,
    /// hiding routing operators inside quoted local parts.
    #[serde(default)]
    pub resolve_dequoted: bool,
    /// rewrite `site!user` into `user@site` while resolving.
    #[serde(default = "ConfigResolver::default_true")]
    pub swap_bangpath: bool,
    /// rewrite `user%domain` into `user@domain` while resolving.
    #[serde(default = "ConfigResolver::default_true")]
    pub percent_hack: bool,
    /// domains considered local, on top of `server.domain`.
    #[serde(default = "ConfigResolver::default_mydestination")]
    pub mydestination: Vec<String>,
    /// when set, overrides the next hop of relay and default destinations.
    #[serde(default)]
    pub relayhost: String,
    /// separator of the optional local part extension, empty to disable.
    #[serde(default)]
    pub recipient_delimiter: String,
    #[serde(default = "ConfigResolver::default_local_transport")]
    pub local_transport: String,
    #[serde(default = "ConfigResolver::default_virt_transport")]
    pub virt_transport: String,
    #[serde(default = "ConfigResolver::default_relay_transport")]
    pub relay_transport: String,
    #[serde(default = "ConfigResolver::default_def_transport")]
    pub def_transport: String,
    #[serde(default = "ConfigResolver::default_error_transport")]
    pub error_transport: String,
    /// domain patterns this host relays for, parent-style matching.
    #[serde(default)]
    pub relay_domains: Vec<String>,
    /// alias-only virtual domains, literal matching.
    #[serde(default)]
    pub virt_alias_doms: Vec<String>,
    /// virtual mailbox domains, literal matching.
    #[serde(default)]
    pub virt_mailbox_doms: Vec<String>,
    /// sources of the relocated users table (`inline:`, `file:`, `fail:`).
    #[serde(default)]
    pub relocated_maps: Vec<String>,
    /// sources of the per-recipient transport table.
    #[serde(default)]
    pub transport_maps: Vec<String>,
}
