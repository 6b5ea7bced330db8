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

//! The persistent "next UID" counter of a folder.
//!
//! UIDs must never be reused, even if the files they named are gone, so the
//! counter is stored on its own rather than recomputed from the directory
//! contents. New values are staged in `.nextid-tmp` and renamed over
//! `.nextid`; since rename is atomic, readers see either the old or the new
//! value.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::support::error::Error;
use crate::support::file_ops::{self, IgnoreKinds};

pub const COUNTER_FILE: &str = ".nextid";
pub const STAGING_FILE: &str = ".nextid-tmp";

/// A monotonic counter that survives process restarts.
pub trait DurableCounter {
    /// Read the current value.
    ///
    /// An absent or unreadable counter reads as 1, the first UID.
    fn read(&self) -> u64;

    /// Store `value`, unless the stored value is already greater.
    ///
    /// Returns whether `value` was written.
    fn advance_if_not_behind(&self, value: u64) -> Result<bool, Error>;
}

/// `DurableCounter` implemented with a staging file and atomic rename.
///
/// This does no locking of its own. Within the process, the owning folder's
/// lock serialises writers; between processes, the "not behind" check keeps
/// the last writer from moving the counter backwards in all but the
/// narrowest of races, and the exclusive creation of message files catches
/// whatever slips through.
#[derive(Clone, Debug)]
pub struct RenameCounter {
    path: PathBuf,
    staging: PathBuf,
}

impl RenameCounter {
    pub fn new(dir: &Path) -> Self {
        RenameCounter {
            path: dir.join(COUNTER_FILE),
            staging: dir.join(STAGING_FILE),
        }
    }

    /// Bring the counter into a consistent state after a possible crash.
    ///
    /// A staging file left behind by an interrupted update is promoted if it
    /// is ahead of the live counter and discarded otherwise. The counter is
    /// then raised to at least `floor`, which the caller derives from the
    /// UIDs actually present on disk; it is never lowered.
    pub fn recover(&self, floor: u64) -> Result<(), Error> {
        if let Some(staged) = read_value(&self.staging) {
            if staged > self.read() {
                warn!(
                    "Recovering interrupted update of {}",
                    self.path.display()
                );
                fs::rename(&self.staging, &self.path)?;
            }
        }
        fs::remove_file(&self.staging).ignore_not_found()?;

        if self.read() < floor {
            warn!(
                "{} is behind the UIDs on disk, raising it to {}",
                self.path.display(),
                floor
            );
            self.advance_if_not_behind(floor)?;
        }

        Ok(())
    }

    fn stage(&self, value: u64) -> io::Result<()> {
        let mut file = fs::File::create(&self.staging)?;
        write!(file, "{}", value)?;
        file.sync_all()?;
        file_ops::chmod(&self.staging, 0o600)
    }
}

impl DurableCounter for RenameCounter {
    fn read(&self) -> u64 {
        read_value(&self.path).unwrap_or(1)
    }

    fn advance_if_not_behind(&self, value: u64) -> Result<bool, Error> {
        self.stage(value)?;

        if self.read() <= value {
            fs::rename(&self.staging, &self.path)?;
            Ok(true)
        } else {
            fs::remove_file(&self.staging).ignore_not_found()?;
            Ok(false)
        }
    }
}

fn read_value(path: &Path) -> Option<u64> {
    match file_ops::slurp(path, 64) {
        Ok(text) => match text.trim().parse::<u64>() {
            Ok(0) | Err(_) => {
                warn!("{} is corrupt: {:?}", path.display(), text);
                None
            },
            Ok(v) => Some(v),
        },
        Err(e) if io::ErrorKind::NotFound == e.kind() => None,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            None
        },
    }
}
