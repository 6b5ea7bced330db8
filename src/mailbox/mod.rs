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

//! The file-backed mailbox store of an account.
//!
//! ## On-disk layout
//!
//! ```text
//! <account>/inbox/            the root folder
//!     .nextid                 durable "next UID" counter
//!     .nextid-tmp             staging file for counter updates
//!     1                       message with UID 1 and no flags
//!     2,S                     message with UID 2 and flags "S"
//!     Sent/                   a live subfolder, same structure
//!     .Trash/                 a soft-deleted ("ghost") subfolder
//! ```
//!
//! Deleting a folder removes its messages but keeps the directory, under a
//! leading dot, along with its counter. Creating a folder of the same name
//! later brings the directory back, so UIDs continue where they left off
//! instead of being reused.
//!
//! ## Locking
//!
//! Each folder has an in-process mutex, shared by every handle on the same
//! account through `FolderLocks`. It is held while allocating UIDs, listing
//! messages, and changing which subfolders exist. When two folder locks are
//! needed, the ancestor is always locked first.

mod counter;
mod message;

pub use self::counter::{DurableCounter, RenameCounter};
pub use self::message::{Message, MessageList, Seqnum, Uid};

use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{error, info, warn};

use self::counter::COUNTER_FILE;
use crate::support::error::Error;
use crate::support::file_ops::{ErrorTransforms, IgnoreKinds};
use crate::support::log_prefix::LogPrefix;
use crate::support::safe_name::is_safe_folder_name;

/// Name of the root folder's directory within the account directory.
pub const INBOX_DIR: &str = "inbox";

/// Bound on the number of occupied UIDs `create_message` skips over before
/// giving up.
const MAX_UID_PROBES: u32 = 10_000;

/// The per-folder locks of one account.
#[derive(Debug, Default)]
pub struct FolderLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl FolderLocks {
    fn get(&self, path: &Path) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .unwrap()
                .entry(path.to_owned())
                .or_default(),
        )
    }
}

/// Whether a folder is visible or soft-deleted.
///
/// `delete()` takes a folder from `Live` to `Ghost`; `make_sub_folder()` of
/// the same name takes it back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FolderState {
    Live,
    Ghost,
}

/// The mailbox store of a single account.
#[derive(Clone, Debug)]
pub struct MailboxStore {
    log_prefix: LogPrefix,
    root: PathBuf,
    locks: Arc<FolderLocks>,
}

impl MailboxStore {
    /// Open the store of the account whose directory is `account_dir`,
    /// creating the inbox if needed.
    ///
    /// Counters of all live folders are recovered from any interrupted
    /// update.
    pub fn open(
        log_prefix: LogPrefix,
        account_dir: &Path,
        locks: Arc<FolderLocks>,
    ) -> Result<Self, Error> {
        let root = account_dir.join(INBOX_DIR);
        fs::DirBuilder::new()
            .mode(0o700)
            .create(&root)
            .ignore_already_exists()?;

        let store = MailboxStore {
            log_prefix,
            root,
            locks,
        };
        store.recover_tree(&store.inbox())?;
        Ok(store)
    }

    pub fn inbox(&self) -> Folder {
        Folder {
            log_prefix: self.log_prefix.clone(),
            name: INBOX_DIR.to_owned(),
            path: self.root.clone(),
            is_root: true,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Walk from the inbox down through the named subfolders.
    ///
    /// Returns `None` if any element does not exist.
    pub fn folder_by_path(&self, path: &[&str]) -> Result<Option<Folder>, Error> {
        let mut folder = self.inbox();
        for &name in path {
            match folder.get_sub_folder(name)? {
                Some(child) => folder = child,
                None => return Ok(None),
            }
        }
        Ok(Some(folder))
    }

    fn recover_tree(&self, folder: &Folder) -> Result<(), Error> {
        folder.recover()?;
        for child in folder.list_sub_folders()? {
            self.recover_tree(&child)?;
        }
        Ok(())
    }
}

/// Handle on one folder in the mailbox tree.
#[derive(Clone, Debug)]
pub struct Folder {
    log_prefix: LogPrefix,
    name: String,
    path: PathBuf,
    is_root: bool,
    locks: Arc<FolderLocks>,
}

impl Folder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Determine the current state of this folder on disk.
    pub fn state(&self) -> Result<FolderState, Error> {
        if self.path.is_dir() {
            Ok(FolderState::Live)
        } else if self.ghost_path().is_dir() {
            Ok(FolderState::Ghost)
        } else {
            Err(Error::NxMailbox)
        }
    }

    /// Allocate the next UID and create an empty message file for it.
    pub fn create_message(&self) -> Result<Message, Error> {
        let lock = self.locks.get(&self.path);
        let _guard = lock.lock().unwrap();
        self.create_message_locked()
    }

    /// Create a message with the given content and flags.
    ///
    /// The folder stays locked until the content is written, so concurrent
    /// listings never see the message half-written.
    pub fn append(&self, data: &[u8], flags: &str) -> Result<Message, Error> {
        let lock = self.locks.get(&self.path);
        let _guard = lock.lock().unwrap();

        let mut message = self.create_message_locked()?;
        let filled = message.write(data).and_then(|()| {
            if flags.is_empty() {
                Ok(())
            } else {
                message.set_flags(flags)
            }
        });

        if let Err(e) = filled {
            // The UID stays consumed, but the message must not be delivered
            // half-written
            if let Err(e2) = fs::remove_file(message.path()) {
                error!(
                    "{} Failed to remove incomplete message {}: {}",
                    self.log_prefix,
                    message.path().display(),
                    e2
                );
            }
            return Err(e);
        }

        Ok(message)
    }

    fn create_message_locked(&self) -> Result<Message, Error> {
        let counter = RenameCounter::new(&self.path);
        let mut uid = counter.read();
        let mut probes = 0;

        let path = loop {
            let path = self.path.join(uid.to_string());
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(&path)
            {
                Ok(_) => break path,
                Err(e) if io::ErrorKind::AlreadyExists == e.kind() => {
                    probes += 1;
                    if probes >= MAX_UID_PROBES {
                        error!(
                            "{} {}: no free UID found after {} attempts",
                            self.log_prefix,
                            self.path.display(),
                            probes
                        );
                        return Err(Error::UidsExhausted);
                    }
                    uid = uid.checked_add(1).ok_or(Error::UidsExhausted)?;
                },
                Err(e) if io::ErrorKind::NotFound == e.kind() => {
                    return Err(Error::NxMailbox);
                },
                Err(e) => return Err(e.into()),
            }
        };

        let advanced = uid
            .checked_add(1)
            .ok_or(Error::UidsExhausted)
            .and_then(|next| counter.advance_if_not_behind(next));
        if let Err(e) = advanced {
            error!(
                "{} Failed to persist UID counter of {}: {}",
                self.log_prefix,
                self.path.display(),
                e
            );
            // Without the counter update the UID could be handed out again
            // after the file is removed, so the message must not exist
            if let Err(e2) = fs::remove_file(&path) {
                error!(
                    "{} Failed to remove unaccounted message {}: {}",
                    self.log_prefix,
                    path.display(),
                    e2
                );
            }
            return Err(e);
        }

        let uid = Uid::of(uid).ok_or(Error::UidsExhausted)?;
        Ok(Message::new(uid, path))
    }

    /// List the messages in this folder, sorted by UID.
    pub fn list_messages(&self) -> Result<MessageList, Error> {
        let lock = self.locks.get(&self.path);
        let _guard = lock.lock().unwrap();

        let mut messages = Vec::new();
        for entry in fs::read_dir(&self.path).on_not_found(Error::NxMailbox)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.starts_with('.') || entry.file_type()?.is_dir() {
                continue;
            }

            if let Some(message) = Message::from_file_name(&self.path, &name) {
                messages.push(message);
            }
        }

        Ok(MessageList::new(messages))
    }

    /// Look up the live subfolder called `name`.
    pub fn get_sub_folder(&self, name: &str) -> Result<Option<Folder>, Error> {
        if !is_safe_folder_name(name) {
            return Err(Error::UnsafeName);
        }

        let child = self.child(name);
        Ok(if child.path.is_dir() { Some(child) } else { None })
    }

    /// Create the subfolder `name`, restoring a soft-deleted one if there is
    /// one.
    pub fn make_sub_folder(&self, name: &str) -> Result<Folder, Error> {
        if !is_safe_folder_name(name) {
            return Err(Error::UnsafeName);
        }

        let lock = self.locks.get(&self.path);
        let _guard = lock.lock().unwrap();

        if !self.path.is_dir() {
            return Err(Error::NxMailbox);
        }

        let child = self.child(name);
        match child.state() {
            Ok(FolderState::Live) => Err(Error::MailboxExists),
            Ok(FolderState::Ghost) => {
                fs::rename(child.ghost_path(), &child.path)?;
                info!(
                    "{} Restored deleted folder {}",
                    self.log_prefix,
                    child.path.display()
                );
                child.recover()?;
                Ok(child)
            },
            Err(Error::NxMailbox) => {
                fs::DirBuilder::new()
                    .mode(0o700)
                    .create(&child.path)
                    .on_exists(Error::MailboxExists)?;
                info!(
                    "{} Created folder {}",
                    self.log_prefix,
                    child.path.display()
                );
                Ok(child)
            },
            Err(e) => Err(e),
        }
    }

    /// List the live subfolders of this folder, sorted by name.
    pub fn list_sub_folders(&self) -> Result<Vec<Folder>, Error> {
        let mut children = Vec::new();
        for entry in fs::read_dir(&self.path).on_not_found(Error::NxMailbox)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }

            if !is_safe_folder_name(&name) {
                warn!(
                    "{} Ignoring directory with unsafe name {:?} in {}",
                    self.log_prefix,
                    name,
                    self.path.display()
                );
                continue;
            }

            children.push(self.child(&name));
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    /// The folder attribute list advertised to clients.
    pub fn flags_string(&self) -> Result<&'static str, Error> {
        Ok(if self.list_sub_folders()?.is_empty() {
            "(\\HasNoChildren)"
        } else {
            "(\\HasChildren)"
        })
    }

    /// Soft-delete this folder.
    ///
    /// Every message is removed, then the directory is renamed to its ghost
    /// name, keeping the UID counter. This is not atomic: if a message
    /// cannot be removed, the error is returned and the folder stays live
    /// with whatever messages were not yet removed.
    ///
    /// The inbox cannot be deleted, and neither can a folder which still has
    /// live subfolders.
    pub fn delete(&self) -> Result<(), Error> {
        if self.is_root {
            return Err(Error::BadOperationOnInbox);
        }

        let parent_lock = self
            .path
            .parent()
            .map(|parent| self.locks.get(parent));
        let _parent_guard =
            parent_lock.as_ref().map(|lock| lock.lock().unwrap());
        let lock = self.locks.get(&self.path);
        let _guard = lock.lock().unwrap();

        if FolderState::Live != self.state()? {
            return Err(Error::NxMailbox);
        }

        if !self.list_sub_folders()?.is_empty() {
            return Err(Error::MailboxHasInferiors);
        }

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if COUNTER_FILE == entry.file_name() || entry.file_type()?.is_dir()
            {
                continue;
            }

            if let Err(e) = fs::remove_file(entry.path()) {
                warn!(
                    "{} Failed to remove {} while deleting folder: {}",
                    self.log_prefix,
                    entry.path().display(),
                    e
                );
                return Err(e.into());
            }
        }

        fs::rename(&self.path, self.ghost_path())?;
        info!("{} Deleted folder {}", self.log_prefix, self.path.display());
        Ok(())
    }

    fn child(&self, name: &str) -> Folder {
        Folder {
            log_prefix: self.log_prefix.clone(),
            name: name.to_owned(),
            path: self.path.join(name),
            is_root: false,
            locks: Arc::clone(&self.locks),
        }
    }

    fn ghost_path(&self) -> PathBuf {
        self.path.with_file_name(format!(".{}", self.name))
    }

    /// Reconcile the UID counter with the files actually present.
    fn recover(&self) -> Result<(), Error> {
        let lock = self.locks.get(&self.path);
        let _guard = lock.lock().unwrap();

        let mut floor = 1;
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if let Some(message) = entry
                .file_name()
                .to_str()
                .and_then(|name| Message::from_file_name(&self.path, name))
            {
                floor = floor.max(message.uid().get().saturating_add(1));
            }
        }

        RenameCounter::new(&self.path).recover(floor)
    }
}

#[cfg(test)]
mod test {
    use rayon::prelude::*;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, MailboxStore) {
        crate::init_test_log();

        let root = tempfile::tempdir().unwrap();
        let store = MailboxStore::open(
            LogPrefix::new("test".to_owned()),
            root.path(),
            Arc::new(FolderLocks::default()),
        )
        .unwrap();
        (root, store)
    }

    fn uids(folder: &Folder) -> Vec<u64> {
        folder
            .list_messages()
            .unwrap()
            .uids()
            .map(Uid::get)
            .collect()
    }

    #[test]
    fn open_creates_inbox() {
        let (root, store) = store();
        assert!(root.path().join("inbox").is_dir());
        assert_eq!("inbox", store.inbox().name());
        assert_eq!(FolderState::Live, store.inbox().state().unwrap());
        assert!(store.inbox().list_messages().unwrap().is_empty());
    }

    #[test]
    fn uids_are_sequential() {
        let (root, store) = store();
        let inbox = store.inbox();

        for expected in 1..=3 {
            let message = inbox.create_message().unwrap();
            assert_eq!(Uid::u(expected), message.uid());
            assert!(message.path().is_file());
        }

        assert_eq!(
            "4",
            fs::read_to_string(root.path().join("inbox/.nextid")).unwrap()
        );
        assert!(!root.path().join("inbox/.nextid-tmp").exists());
    }

    #[test]
    fn uids_skip_files_the_counter_missed() {
        let (root, store) = store();
        let inbox = store.inbox();
        fs::write(root.path().join("inbox/1"), b"").unwrap();
        fs::write(root.path().join("inbox/2"), b"").unwrap();

        assert_eq!(Uid::u(3), inbox.create_message().unwrap().uid());
        assert_eq!(Uid::u(4), inbox.create_message().unwrap().uid());
        assert_eq!(vec![1, 2, 3, 4], uids(&inbox));
    }

    #[test]
    fn uids_are_never_reused_after_removal() {
        let (_root, store) = store();
        let inbox = store.inbox();

        let first = inbox.create_message().unwrap();
        let second = inbox.create_message().unwrap();
        first.remove().unwrap();
        second.remove().unwrap();

        assert_eq!(Uid::u(3), inbox.create_message().unwrap().uid());
    }

    #[test]
    fn reopen_reconciles_counter() {
        let (root, store) = store();
        store.inbox().create_message().unwrap();
        fs::write(root.path().join("inbox/8"), b"").unwrap();
        fs::remove_file(root.path().join("inbox/.nextid")).unwrap();

        let store = MailboxStore::open(
            LogPrefix::new("test".to_owned()),
            root.path(),
            Arc::new(FolderLocks::default()),
        )
        .unwrap();
        assert_eq!(Uid::u(9), store.inbox().create_message().unwrap().uid());
    }

    #[test]
    fn concurrent_creation_yields_distinct_contiguous_uids() {
        let (_root, store) = store();
        let inbox = store.inbox();
        inbox.create_message().unwrap();

        let mut uids = (0..64)
            .into_par_iter()
            .map(|_| inbox.create_message().unwrap().uid().get())
            .collect::<Vec<_>>();
        uids.sort();

        assert_eq!((2..=65).collect::<Vec<u64>>(), uids);
    }

    #[test]
    fn concurrent_creation_through_separate_handles() {
        let (root, store) = store();
        let locks = Arc::new(FolderLocks::default());
        let a = MailboxStore::open(
            LogPrefix::new("a".to_owned()),
            root.path(),
            Arc::clone(&locks),
        )
        .unwrap();
        let b = MailboxStore::open(
            LogPrefix::new("b".to_owned()),
            root.path(),
            locks,
        )
        .unwrap();

        let mut uids = (0..40)
            .into_par_iter()
            .map(|i| {
                let store = if 0 == i % 2 { &a } else { &b };
                store.inbox().create_message().unwrap().uid().get()
            })
            .collect::<Vec<_>>();
        uids.sort();

        assert_eq!((1..=40).collect::<Vec<u64>>(), uids);
        assert_eq!(40, store.inbox().list_messages().unwrap().len());
    }

    #[test]
    fn listing_is_a_snapshot() {
        let (root, store) = store();
        let inbox = store.inbox();
        inbox.append(b"one", "").unwrap();
        inbox.append(b"two", "S").unwrap();
        inbox.append(b"three", "").unwrap();
        fs::write(root.path().join("inbox/junk"), b"").unwrap();
        fs::write(root.path().join("inbox/.hidden"), b"").unwrap();
        inbox.make_sub_folder("Sub").unwrap();

        let before = inbox.list_messages().unwrap();
        inbox.append(b"four", "").unwrap();
        let after = inbox.list_messages().unwrap();

        assert_eq!(
            vec![1, 2, 3],
            before.uids().map(Uid::get).collect::<Vec<_>>()
        );
        assert_eq!(vec![1, 2, 3, 4], uids(&inbox));

        let two = after.get(Uid::u(2)).unwrap();
        assert_eq!("S", two.flags());
        assert_eq!(b"two".to_vec(), two.read().unwrap());
        assert_eq!(Some(Seqnum::u(4)), after.seqnum_of(Uid::u(4)));
    }

    #[test]
    fn failed_counter_update_leaves_no_message() {
        let (root, store) = store();
        let inbox = store.inbox();

        // A non-empty directory can't be renamed over
        let counter = root.path().join("inbox").join(COUNTER_FILE);
        fs::remove_file(&counter).ignore_not_found().unwrap();
        fs::create_dir(&counter).unwrap();
        fs::write(counter.join("x"), b"").unwrap();

        assert_matches!(Err(Error::Io(..)), inbox.create_message());
        assert!(!root.path().join("inbox/1").exists());
        assert!(inbox.list_messages().unwrap().is_empty());
    }

    #[test]
    fn listing_never_sees_partial_messages() {
        let (_root, store) = store();
        let inbox = store.inbox();

        fn flags_for(i: u32) -> &'static str {
            if 0 == i % 3 {
                "S"
            } else {
                ""
            }
        }

        let listings = (0..200u32)
            .into_par_iter()
            .filter_map(|i| {
                if 0 == i % 4 {
                    let listing = inbox.list_messages().unwrap();
                    let seen = listing
                        .iter()
                        .map(|(_, message)| {
                            let data = message.read().unwrap();
                            let text = String::from_utf8(data).unwrap();
                            let n = text
                                .strip_prefix("message ")
                                .and_then(|n| n.parse::<u32>().ok())
                                .unwrap_or_else(|| {
                                    panic!("partial content {:?}", text)
                                });
                            assert_eq!(flags_for(n), message.flags());
                            message.uid().get()
                        })
                        .collect::<Vec<_>>();
                    Some(seen)
                } else {
                    let data = format!("message {}", i);
                    inbox.append(data.as_bytes(), flags_for(i)).unwrap();
                    None
                }
            })
            .collect::<Vec<_>>();

        let all = uids(&inbox);
        assert_eq!((1..=150).collect::<Vec<u64>>(), all);
        for seen in listings {
            assert_eq!(&all[..seen.len()], &seen[..]);
        }
    }

    #[test]
    fn sequence_numbers_follow_uid_order() {
        let (_root, store) = store();
        let inbox = store.inbox();
        for _ in 0..12 {
            inbox.create_message().unwrap();
        }
        let list = inbox.list_messages().unwrap();
        list.get(Uid::u(5)).unwrap().clone().remove().unwrap();

        let list = inbox.list_messages().unwrap();
        assert_eq!(11, list.len());
        let seqnums = list
            .iter()
            .map(|(s, m)| (s.0.get(), m.uid().get()))
            .collect::<Vec<_>>();
        assert_eq!((1, 1), seqnums[0]);
        assert_eq!((5, 6), seqnums[4]);
        assert_eq!((11, 12), seqnums[10]);
    }

    #[test]
    fn soft_delete_and_restore_continues_uids() {
        let (root, store) = store();
        let inbox = store.inbox();

        let x = inbox.make_sub_folder("X").unwrap();
        for _ in 0..3 {
            x.create_message().unwrap();
        }

        x.delete().unwrap();
        assert_eq!(FolderState::Ghost, x.state().unwrap());
        assert!(root.path().join("inbox/.X/.nextid").is_file());
        assert!(inbox.get_sub_folder("X").unwrap().is_none());
        assert!(inbox.list_sub_folders().unwrap().is_empty());

        let x = inbox.make_sub_folder("X").unwrap();
        assert_eq!(root.path().join("inbox/X"), x.path());
        assert_eq!(FolderState::Live, x.state().unwrap());
        assert!(x.list_messages().unwrap().is_empty());
        assert_eq!(Uid::u(4), x.create_message().unwrap().uid());
    }

    #[test]
    fn folder_name_validation() {
        let (_root, store) = store();
        let inbox = store.inbox();

        assert_matches!(Err(Error::UnsafeName), inbox.make_sub_folder("../etc"));
        assert_matches!(Err(Error::UnsafeName), inbox.make_sub_folder("a/b"));
        assert_matches!(Err(Error::UnsafeName), inbox.make_sub_folder(".X"));
        assert_matches!(Err(Error::UnsafeName), inbox.make_sub_folder(""));
        assert_matches!(Err(Error::UnsafeName), inbox.get_sub_folder(".."));

        let project = inbox.make_sub_folder("Project 1").unwrap();
        assert_eq!("Project 1", project.name());
        assert_matches!(
            Err(Error::MailboxExists),
            inbox.make_sub_folder("Project 1")
        );
    }

    #[test]
    fn sub_folder_listing() {
        let (root, store) = store();
        let inbox = store.inbox();
        assert_eq!("(\\HasNoChildren)", inbox.flags_string().unwrap());

        inbox.make_sub_folder("Sent").unwrap();
        inbox.make_sub_folder("Drafts").unwrap();
        inbox.make_sub_folder("Trash").unwrap().delete().unwrap();
        fs::create_dir(root.path().join("inbox/bad.name")).unwrap();
        inbox.create_message().unwrap();

        assert_eq!(
            vec!["Drafts", "Sent"],
            inbox
                .list_sub_folders()
                .unwrap()
                .iter()
                .map(Folder::name)
                .collect::<Vec<_>>()
        );
        assert_eq!("(\\HasChildren)", inbox.flags_string().unwrap());

        let nested = store.folder_by_path(&["Sent"]).unwrap().unwrap();
        nested.make_sub_folder("2020").unwrap();
        assert!(store.folder_by_path(&["Sent", "2020"]).unwrap().is_some());
        assert!(store.folder_by_path(&["Sent", "2021"]).unwrap().is_none());
    }

    #[test]
    fn delete_preconditions() {
        let (_root, store) = store();
        let inbox = store.inbox();
        assert_matches!(Err(Error::BadOperationOnInbox), inbox.delete());

        let parent = inbox.make_sub_folder("Parent").unwrap();
        let child = parent.make_sub_folder("Child").unwrap();
        parent.create_message().unwrap();

        assert_matches!(Err(Error::MailboxHasInferiors), parent.delete());
        assert_eq!(1, parent.list_messages().unwrap().len());

        child.delete().unwrap();
        assert_matches!(Err(Error::NxMailbox), child.delete());
        // Ghost children do not count as inferiors
        parent.delete().unwrap();
        assert_matches!(Err(Error::NxMailbox), parent.create_message());
        assert_matches!(Err(Error::NxMailbox), parent.list_messages());

        let parent = inbox.make_sub_folder("Parent").unwrap();
        assert!(parent.list_sub_folders().unwrap().is_empty());
        let child = parent.make_sub_folder("Child").unwrap();
        assert_eq!(FolderState::Live, child.state().unwrap());
    }
}
