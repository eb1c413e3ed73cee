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

/// return type of [fork]
pub enum ForkResult {
    /// to the parent, with the pid of the child process
    Parent(libc::pid_t),
    /// to the child
    Child,
}

/// create a child process
///
/// # Errors
///
/// see fork(2) ERRORS
#[inline]
pub fn fork() -> anyhow::Result<ForkResult> {
    match unsafe { libc::fork() } {
        -1 => Err(anyhow::anyhow!(
            "fork: '{}'",
            std::io::Error::last_os_error()
        )),
        0 => Ok(ForkResult::Child),
        child_pid => Ok(ForkResult::Parent(child_pid)),
    }
}

/// run a program as a background process
///
/// # Errors
///
/// see daemon(2) ERRORS
pub fn daemon() -> anyhow::Result<ForkResult> {
    match fork()? {
        ForkResult::Parent(_) => std::process::exit(0),
        ForkResult::Child => {
            setsid()?;
            fork()
        }
    }
}

/// run a program in a new session
///
/// # Errors
///
/// see setsid(2) ERRORS
pub fn setsid() -> anyhow::Result<libc::pid_t> {
    match unsafe { libc::setsid() } {
        -1 => Err(anyhow::anyhow!(
            "setsid: '{}'",
            std::io::Error::last_os_error()
        )),
        res => Ok(res),
    }
}
