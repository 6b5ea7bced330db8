//-
// Copyright (c) 2026, Freemail Developers
//
// This file is part of Freemail.
//
// Freemail is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public  License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Freemail is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Freemail. If not, see <http://www.gnu.org/licenses/>.

//! Utilities for working with threads.
//!
//! Some work, RSA key generation in particular, can run for minutes. Such
//! work is moved onto a dedicated thread so the caller can give up on it
//! after a deadline without holding any locks shared with other accounts.

use std::time::Duration;

use crossbeam::channel;
use log::warn;

/// Run `task` on a dedicated thread and wait at most `deadline` for its
/// result.
///
/// Returns `None` if the deadline passes or the task panics. In the former
/// case the thread keeps running to completion in the background, but its
/// result is discarded; `task` must therefore not have side effects that the
/// caller would need to undo.
pub fn run_with_deadline<T: Send + 'static>(
    name: &str,
    deadline: Duration,
    task: impl FnOnce() -> T + Send + 'static,
) -> Option<T> {
    let (send, recv) = channel::bounded(1);
    let spawned = std::thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            // Nobody is listening anymore if the deadline passed
            let _ = send.send(task());
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn worker '{}': {}", name, e);
        return None;
    }

    match recv.recv_timeout(deadline) {
        Ok(result) => Some(result),
        Err(channel::RecvTimeoutError::Timeout) => {
            warn!(
                "Worker '{}' did not finish within {:?}, abandoning it",
                name, deadline
            );
            None
        },
        Err(channel::RecvTimeoutError::Disconnected) => {
            warn!("Worker '{}' died without a result", name);
            None
        },
    }
}
