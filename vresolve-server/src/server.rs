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
use crate::endpoint::Endpoint;
use crate::resolver::Resolver;
use vresolve_config::{log_channel::SERVER, Config};

/// the resolver service on one listening socket.
///
/// clients are served one after the other on a single thread; scaling
/// out means running more instances, the tables are rebuilt by each and
/// nothing is shared between them.
pub struct Server {
    resolver: Resolver,
}

impl Server {
    /// build the engine from the configuration.
    ///
    /// # Errors
    ///
    /// * a table source is malformed or unreadable
    pub fn new(config: std::sync::Arc<Config>) -> anyhow::Result<Self> {
        Ok(Self {
            resolver: Resolver::new(config)?,
        })
    }

    /// direct access to the resolving engine.
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// accept and serve clients until the listener fails.
    ///
    /// a client error closes that connection and the loop moves on; it
    /// never takes the service down.
    ///
    /// # Errors
    ///
    /// * the listener failed to accept
    pub fn listen_and_serve(&self, listener: &std::net::TcpListener) -> anyhow::Result<()> {
        loop {
            let (stream, client_addr) = listener.accept()?;
            log::info!(target: SERVER, "connection from '{}'", client_addr);

            if let Err(error) = Endpoint::new(&self.resolver, stream).serve() {
                log::warn!(
                    target: SERVER,
                    "closing connection from '{}': {}",
                    client_addr,
                    error
                );
            }
        }
    }
}
