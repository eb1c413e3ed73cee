//! vResolve common definitions

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
//
#![allow(clippy::doc_markdown)]

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

/// email address in user@domain form.
pub mod address;
/// framed attribute protocol shared by the daemon and its clients.
pub mod attribute;
/// hostname syntax validation.
pub mod hostname;
/// abstraction of the libc.
pub mod libc_abstraction;
/// result of an address resolution.
pub mod resolved;
/// rfc 822 address token tree.
pub mod token;

pub use address::Address;
pub use resolved::{ResolveFlags, ResolvedAddr};
pub use token::{Token, TokenTree};

/// Re-exported dependencies
pub mod re {
    pub use addr;
    pub use anyhow;
    pub use log;
    pub use serde_json;
}
