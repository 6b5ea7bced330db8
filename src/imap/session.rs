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

use std::sync::Arc;

use log::{info, warn};

use super::folder_path::{folder_path_matcher, parse_folder_path};
use crate::account::identity::IdentityManager;
use crate::mailbox::{Folder, MailboxStore, Seqnum, Uid};
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;

/// Name under which clients see the root folder.
pub const INBOX: &str = "INBOX";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderInfo {
    /// Full hierarchical name, e.g. `INBOX/Sent`.
    pub name: String,
    pub flags: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageInfo {
    pub uid: Uid,
    pub seqnum: Seqnum,
    pub flags: String,
}

/// The state of one client connection.
///
/// This is what a protocol command processor drives: it authenticates
/// against the `IdentityManager`, then works on the user's `MailboxStore`.
/// Folder names are hierarchical, delimited by `/`, and always start at
/// `INBOX`.
pub struct Session {
    log_prefix: LogPrefix,
    identity: Arc<IdentityManager>,
    store: Option<MailboxStore>,
    selected: Option<Folder>,
}

impl Session {
    pub fn new(log_prefix: LogPrefix, identity: Arc<IdentityManager>) -> Self {
        Session {
            log_prefix,
            identity,
            store: None,
            selected: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_some()
    }

    /// Log in as `username`.
    ///
    /// Returns whether the login succeeded. Failures are not explained to
    /// the caller.
    pub fn authenticate(&mut self, username: &str, password: &str) -> bool {
        if self.store.is_some() {
            warn!("{} Rejected second login attempt", self.log_prefix);
            return false;
        }

        if !self.identity.authenticate(username, password) {
            info!("{} Login failed", self.log_prefix);
            return false;
        }

        match self
            .identity
            .open_mailbox(username, self.log_prefix.clone())
        {
            Ok(store) => {
                self.log_prefix.set_user(username.to_owned());
                info!("{} Login successful", self.log_prefix);
                self.store = Some(store);
                true
            },
            Err(e) => {
                warn!(
                    "{} Failed to open mailbox of '{}': {}",
                    self.log_prefix, username, e
                );
                false
            },
        }
    }

    /// List all folders of the user, `INBOX` first and every parent before
    /// its children.
    pub fn list_folders(&self) -> Result<Vec<FolderInfo>, Error> {
        let store = self.store()?;
        let mut out = Vec::new();
        list_tree(&store.inbox(), INBOX.to_owned(), &mut out)?;
        Ok(out)
    }

    /// List the folders whose names match the wildcard `pattern`.
    pub fn list_folders_matching(
        &self,
        pattern: &str,
    ) -> Result<Vec<FolderInfo>, Error> {
        let matcher = folder_path_matcher(std::iter::once(pattern));
        let mut folders = self.list_folders()?;
        folders.retain(|f| matcher(&f.name));
        Ok(folders)
    }

    /// Make `name` the current folder.
    ///
    /// Returns the number of messages it contains.
    pub fn select(&mut self, name: &str) -> Result<usize, Error> {
        self.selected = None;
        let folder = self.resolve(name)?;
        let count = folder.list_messages()?.len();
        info!("{} Selected {}", self.log_prefix, name);
        self.selected = Some(folder);
        Ok(count)
    }

    pub fn unselect(&mut self) {
        self.selected = None;
    }

    /// List the messages of the current folder.
    pub fn list(&self) -> Result<Vec<MessageInfo>, Error> {
        self.store()?;
        let folder = self.selected.as_ref().ok_or(Error::NxMailbox)?;
        Ok(folder
            .list_messages()?
            .iter()
            .map(|(seqnum, message)| MessageInfo {
                uid: message.uid(),
                seqnum,
                flags: message.flags().to_owned(),
            })
            .collect())
    }

    /// Store a new message in the folder `name`, returning its UID.
    pub fn append(
        &self,
        name: &str,
        data: &[u8],
        flags: &str,
    ) -> Result<Uid, Error> {
        Ok(self.resolve(name)?.append(data, flags)?.uid())
    }

    /// Create the folder `name`, including any missing parents.
    pub fn create_folder(&self, name: &str) -> Result<(), Error> {
        let store = self.store()?;
        let path = split_path(name)?;
        let (last, parents) = match path.split_last() {
            Some(split) => split,
            None => return Err(Error::MailboxExists),
        };

        let mut folder = store.inbox();
        for &parent in parents {
            folder = match folder.get_sub_folder(parent)? {
                Some(child) => child,
                None => folder.make_sub_folder(parent)?,
            };
        }

        folder.make_sub_folder(last)?;
        info!("{} Created {}", self.log_prefix, name);
        Ok(())
    }

    /// Delete the folder `name`.
    ///
    /// If it is the selected folder, nothing is selected afterwards.
    pub fn delete_folder(&mut self, name: &str) -> Result<(), Error> {
        let folder = self.resolve(name)?;
        folder.delete()?;

        if self
            .selected
            .as_ref()
            .map_or(false, |s| s.path() == folder.path())
        {
            self.selected = None;
        }

        info!("{} Deleted {}", self.log_prefix, name);
        Ok(())
    }

    fn store(&self) -> Result<&MailboxStore, Error> {
        self.store.as_ref().ok_or(Error::NotAuthenticated)
    }

    fn resolve(&self, name: &str) -> Result<Folder, Error> {
        let store = self.store()?;
        let path = split_path(name)?;
        store.folder_by_path(&path)?.ok_or(Error::NxMailbox)
    }
}

/// Split `name` into the components below `INBOX`.
fn split_path(name: &str) -> Result<Vec<&str>, Error> {
    let mut parts = parse_folder_path(name);
    if Some(INBOX) != parts.next() {
        return Err(Error::NxMailbox);
    }
    Ok(parts.collect())
}

fn list_tree(
    folder: &Folder,
    name: String,
    out: &mut Vec<FolderInfo>,
) -> Result<(), Error> {
    let children = folder.list_sub_folders()?;
    out.push(FolderInfo {
        name: name.clone(),
        flags: if children.is_empty() {
            "(\\HasNoChildren)"
        } else {
            "(\\HasChildren)"
        },
    });

    for child in children {
        let child_name = format!("{}/{}", name, child.name());
        list_tree(&child, child_name, out)?;
    }
    Ok(())
}
