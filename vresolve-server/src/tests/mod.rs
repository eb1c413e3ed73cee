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
mod resolver;

use crate::Resolver;
use vresolve_config::Config;

/// a configuration anchored on a fixed hostname.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.domain = "myhost".to_string();
    config
}

/// build an engine over a modified test configuration.
pub fn test_resolver(modify: impl FnOnce(&mut Config)) -> Resolver {
    let mut config = test_config();
    modify(&mut config);
    Resolver::new(std::sync::Arc::new(config)).expect("test configuration must build")
}

/// an in-memory stream: reads from a canned request, collects writes.
pub struct Mock {
    input: std::io::Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl Mock {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: std::io::Cursor::new(input.to_vec()),
            output: vec![],
        }
    }

    pub fn written(&self) -> &[u8] {
        &self.output
    }
}

impl std::io::Read for Mock {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        std::io::Read::read(&mut self.input, buf)
    }
}

impl std::io::Write for Mock {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
