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
use crate::{Config, ConfigResolver, ConfigServer, ConfigServerLogs};

impl Default for Config {
    fn default() -> Self {
        Self {
            version_requirement: semver::VersionReq::STAR,
            server: ConfigServer::default(),
            resolver: ConfigResolver::default(),
        }
    }
}

impl Default for ConfigServer {
    fn default() -> Self {
        Self {
            domain: Self::hostname(),
            listener: Self::default_listener(),
            logs: ConfigServerLogs::default(),
        }
    }
}

impl ConfigServer {
    pub(crate) fn hostname() -> String {
        hostname::get()
            .map_or_else(
                |_| "localhost".to_string(),
                |name| name.to_string_lossy().into_owned(),
            )
    }

    pub(crate) fn default_listener() -> std::net::SocketAddr {
        "127.0.0.1:12301".parse().expect("valid address")
    }
}

impl Default for ConfigServerLogs {
    fn default() -> Self {
        Self {
            filepath: Self::default_filepath(),
            format: Self::default_format(),
            level: std::collections::BTreeMap::default(),
        }
    }
}

impl ConfigServerLogs {
    pub(crate) fn default_filepath() -> std::path::PathBuf {
        std::path::PathBuf::from_iter(["/", "var", "log", "vresolve", "vresolve.log"])
    }

    pub(crate) fn default_format() -> String {
        "{d} {l} - {m}{n}".to_string()
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self {
            resolve_dequoted: false,
            swap_bangpath: Self::default_true(),
            percent_hack: Self::default_true(),
            mydestination: Self::default_mydestination(),
            relayhost: String::default(),
            recipient_delimiter: String::default(),
            local_transport: Self::default_local_transport(),
            virt_transport: Self::default_virt_transport(),
            relay_transport: Self::default_relay_transport(),
            def_transport: Self::default_def_transport(),
            error_transport: Self::default_error_transport(),
            relay_domains: vec![],
            virt_alias_doms: vec![],
            virt_mailbox_doms: vec![],
            relocated_maps: vec![],
            transport_maps: vec![],
        }
    }
}

impl ConfigResolver {
    pub(crate) const fn default_true() -> bool {
        true
    }

    pub(crate) fn default_mydestination() -> Vec<String> {
        vec!["localhost".to_string()]
    }

    pub(crate) fn default_local_transport() -> String {
        "local".to_string()
    }

    pub(crate) fn default_virt_transport() -> String {
        "virtual".to_string()
    }

    pub(crate) fn default_relay_transport() -> String {
        "relay".to_string()
    }

    pub(crate) fn default_def_transport() -> String {
        "smtp".to_string()
    }

    pub(crate) fn default_error_transport() -> String {
        "error".to_string()
    }
}
