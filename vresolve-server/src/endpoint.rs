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
use crate::resolver::Resolver;
use vresolve_common::attribute::{
    read_attrs, write_attrs, ATTR_ADDR, ATTR_FLAGS, ATTR_NEXTHOP, ATTR_RECIPIENT, ATTR_TRANSPORT,
};
use vresolve_config::log_channel::{PROTO, RESOLVER};

/// the request-reply endpoint of one client connection.
///
/// requests are served strictly in order: reply N is flushed before
/// request N+1 is read. the per-request buffers live inside this value,
/// so one connection never shares state with another.
pub struct Endpoint<'r, S>
where
    S: std::io::Read + std::io::Write,
{
    resolver: &'r Resolver,
    stream: std::io::BufReader<S>,
}

impl<'r, S> Endpoint<'r, S>
where
    S: std::io::Read + std::io::Write,
{
    ///
    pub fn new(resolver: &'r Resolver, stream: S) -> Self {
        Self {
            resolver,
            stream: std::io::BufReader::new(stream),
        }
    }

    /// serve requests until the peer closes the stream.
    ///
    /// # Errors
    ///
    /// * a request was malformed (strict attribute mode)
    /// * the stream failed to read, write or flush
    pub fn serve(&mut self) -> anyhow::Result<()> {
        while self.serve_one()? {}
        Ok(())
    }

    /// read one request, resolve it, write the reply.
    ///
    /// returns `Ok(false)` when the peer closed the stream before a
    /// request, `Ok(true)` after a complete exchange. no partial reply
    /// is ever emitted: a bad request aborts before the first reply
    /// byte.
    ///
    /// # Errors
    ///
    /// * a request was malformed (strict attribute mode)
    /// * the stream failed to read, write or flush
    pub fn serve_one(&mut self) -> anyhow::Result<bool> {
        let addr = match read_attrs(&mut self.stream, &[ATTR_ADDR])? {
            Some(mut values) => values.swap_remove(0),
            None => return Ok(false),
        };

        let resolved = self.resolver.resolve_addr(&addr);

        log::debug!(
            target: RESOLVER,
            "{} -> (`{}' `{}' `{}' `{}')",
            addr,
            resolved.transport,
            resolved.nexthop,
            resolved.recipient,
            resolved.flags.bits()
        );

        if let Err(error) = write_attrs(
            self.stream.get_mut(),
            &[
                (ATTR_TRANSPORT, &resolved.transport),
                (ATTR_NEXTHOP, &resolved.nexthop),
                (ATTR_RECIPIENT, &resolved.recipient),
                (ATTR_FLAGS, &resolved.flags.bits().to_string()),
            ],
        ) {
            log::warn!(target: PROTO, "write resolver reply: {}", error);
            return Err(error);
        }

        Ok(true)
    }
}
