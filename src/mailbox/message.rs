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

use std::fmt;
use std::fs;
use std::io::Write;
use std::num::{NonZeroU32, NonZeroU64};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::support::error::Error;

lazy_static! {
    static ref MESSAGE_FILE: Regex =
        Regex::new("^([0-9]+)(?:,(.*))?$").unwrap();
}

/// A message's identifier within its folder.
///
/// UIDs start at 1 and are never reused within a folder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Uid(pub NonZeroU64);

impl Uid {
    pub fn of(uid: u64) -> Option<Self> {
        NonZeroU64::new(uid).map(Uid)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    #[cfg(test)]
    pub fn u(uid: u64) -> Self {
        Uid::of(uid).unwrap()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 1-based position of a message within one particular listing.
///
/// Sequence numbers are never stored; they are only meaningful relative to
/// the `MessageList` that produced them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Seqnum(pub NonZeroU32);

impl Seqnum {
    pub fn of(seqnum: u32) -> Option<Self> {
        NonZeroU32::new(seqnum).map(Seqnum)
    }

    fn from_index(ix: usize) -> Option<Self> {
        Seqnum::of((ix as u32).checked_add(1)?)
    }

    pub fn to_index(self) -> usize {
        self.0.get() as usize - 1
    }

    #[cfg(test)]
    pub fn u(seqnum: u32) -> Self {
        Seqnum::of(seqnum).unwrap()
    }
}

impl fmt::Display for Seqnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle on a single message file.
///
/// The file is named `<uid>` or `<uid>,<flags>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    uid: Uid,
    path: PathBuf,
    flags: String,
}

impl Message {
    pub(super) fn new(uid: Uid, path: PathBuf) -> Self {
        Message {
            uid,
            path,
            flags: String::new(),
        }
    }

    /// Build a handle from a directory entry, if the name is that of a
    /// message file.
    pub(super) fn from_file_name(dir: &Path, name: &str) -> Option<Self> {
        let cap = MESSAGE_FILE.captures(name)?;
        let uid = cap.get(1)?.as_str().parse::<u64>().ok().and_then(Uid::of)?;
        Some(Message {
            uid,
            path: dir.join(name),
            flags: cap.get(2).map_or("", |m| m.as_str()).to_owned(),
        })
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// The raw flag suffix of the file name, empty if there is none.
    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<u8>, Error> {
        Ok(fs::read(&self.path)?)
    }

    /// Fill in the content of the message.
    ///
    /// Message content is immutable once delivered; this is only for use on
    /// a freshly created message.
    pub fn write(&self, data: &[u8]) -> Result<(), Error> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    /// Replace the flag suffix by renaming the file.
    pub fn set_flags(&mut self, flags: &str) -> Result<(), Error> {
        if flags.contains(|c: char| '/' == c || c.is_control()) {
            return Err(Error::UnsafeName);
        }

        let name = if flags.is_empty() {
            self.uid.to_string()
        } else {
            format!("{},{}", self.uid, flags)
        };
        let new_path = self.path.with_file_name(name);
        if new_path != self.path {
            fs::rename(&self.path, &new_path)?;
            self.path = new_path;
        }
        self.flags = flags.to_owned();
        Ok(())
    }

    /// Permanently delete the message.
    pub fn remove(self) -> Result<(), Error> {
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

/// The messages of a folder at one point in time, in ascending UID order.
#[derive(Clone, Debug, Default)]
pub struct MessageList {
    messages: Vec<Message>,
}

impl MessageList {
    pub(super) fn new(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| m.uid);
        let before = messages.len();
        messages.dedup_by_key(|m| m.uid);
        if messages.len() != before {
            warn!(
                "{} message files share a UID with another; ignoring them",
                before - messages.len()
            );
        }
        MessageList { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate the messages with their sequence numbers.
    pub fn iter(&self) -> impl Iterator<Item = (Seqnum, &Message)> + '_ {
        self.messages
            .iter()
            .enumerate()
            .filter_map(|(ix, m)| Some((Seqnum::from_index(ix)?, m)))
    }

    pub fn get(&self, uid: Uid) -> Option<&Message> {
        self.messages
            .binary_search_by_key(&uid, |m| m.uid)
            .ok()
            .map(|ix| &self.messages[ix])
    }

    pub fn seqnum_of(&self, uid: Uid) -> Option<Seqnum> {
        self.messages
            .binary_search_by_key(&uid, |m| m.uid)
            .ok()
            .and_then(Seqnum::from_index)
    }

    pub fn by_seqnum(&self, seqnum: Seqnum) -> Option<&Message> {
        self.messages.get(seqnum.to_index())
    }

    pub fn uids(&self) -> impl Iterator<Item = Uid> + '_ {
        self.messages.iter().map(|m| m.uid)
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
