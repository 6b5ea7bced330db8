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

//! The account property file.
//!
//! Each account keeps its metadata in a single plain-text file of `key=value`
//! lines. This file is the only source of truth about the account's identity,
//! so every modification rewrites it completely through a staging file which
//! is then renamed over the original. A reader thus always sees either the
//! state before or the state after an update, never a mix of the two.
//!
//! Blank lines and lines starting with `#` are ignored. Values may contain
//! `=`; keys may not.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::error;

use crate::support::error::Error;
use crate::support::file_ops::{self, IgnoreKinds};

const MAX_PROPS_SIZE: u64 = 1024 * 1024;
const HEADER: &str = "# Freemail account properties\n";

/// A point-in-time snapshot of the contents of a property file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v as &str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k as &str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), Error> {
        let value = value.into();
        if key.is_empty()
            || key.contains(|c: char| '=' == c || c.is_control())
            || key.starts_with('#')
            || value.contains(|c: char| '\n' == c || '\r' == c)
        {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Property {:?} cannot be represented", key),
            )));
        }

        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, '=');
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                entries.insert(key.to_owned(), value.to_owned());
            }
        }

        Properties { entries }
    }

    fn serialise(&self) -> String {
        let mut text = HEADER.to_owned();
        for (key, value) in &self.entries {
            let _ = writeln!(text, "{}={}", key, value);
        }
        text
    }
}

/// Handle on a property file on disk.
///
/// Read-modify-write cycles are serialised within the process by an internal
/// lock. Readers never take the lock since replacement of the file is atomic.
pub struct PropertyStore {
    path: PathBuf,
    tmp: PathBuf,
    write_lock: Mutex<()>,
}

impl PropertyStore {
    /// Create a handle for the file at `path`.
    ///
    /// Updates are staged in the directory containing `path`.
    pub fn new(path: PathBuf) -> Self {
        let tmp = path
            .parent()
            .map(Path::to_owned)
            .unwrap_or_else(|| PathBuf::from("."));
        PropertyStore {
            path,
            tmp,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the file with no properties if it does not exist yet.
    pub fn create(&self) -> Result<(), Error> {
        let _lock = self.write_lock.lock().unwrap();
        file_ops::spit(
            &self.tmp,
            &self.path,
            false,
            0o600,
            Properties::default().serialise().as_bytes(),
        )
        .ignore_already_exists()?;
        Ok(())
    }

    /// Read the current contents of the file.
    ///
    /// A missing file reads as empty. A file which is oversized or not
    /// UTF-8 is reported as corrupt and never treated as empty, since any
    /// update would then discard its contents.
    pub fn load(&self) -> Result<Properties, Error> {
        match file_ops::slurp(&self.path, MAX_PROPS_SIZE) {
            Ok(text) => Ok(Properties::parse(&text)),
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                Ok(Properties::default())
            },
            Err(e) if io::ErrorKind::InvalidData == e.kind() => {
                error!("{} is unreadable: {}", self.path.display(), e);
                Err(Error::CorruptAccount(
                    "property file is oversized or not valid UTF-8",
                ))
            },
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.load()?.get(key).map(str::to_owned))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), Error> {
        self.put_all(&[(key, value)])
    }

    /// Set all of `entries` in a single atomic update.
    pub fn put_all(&self, entries: &[(&str, &str)]) -> Result<(), Error> {
        self.update(|props| {
            for &(key, value) in entries {
                props.set(key, value)?;
            }
            Ok(true)
        })
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, Error> {
        let mut removed = false;
        self.update(|props| {
            removed = props.remove(key).is_some();
            Ok(removed)
        })?;
        Ok(removed)
    }

    /// Atomically apply `f` to the current properties.
    ///
    /// `f` returns whether it changed anything; the file is only rewritten if
    /// it did. If `f` fails, the file is left untouched.
    pub fn update(
        &self,
        f: impl FnOnce(&mut Properties) -> Result<bool, Error>,
    ) -> Result<(), Error> {
        let _lock = self.write_lock.lock().unwrap();
        let mut props = self.load()?;
        if f(&mut props)? {
            file_ops::spit(
                &self.tmp,
                &self.path,
                true,
                0o600,
                props.serialise().as_bytes(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    fn store() -> (tempfile::TempDir, PropertyStore) {
        let root = tempfile::tempdir().unwrap();
        let store = PropertyStore::new(root.path().join("accprops"));
        (root, store)
    }

    #[test]
    fn basic_operations() {
        let (_root, store) = store();
        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());

        store.create().unwrap();
        assert!(store.exists());
        assert_eq!(None, store.get("rtskey").unwrap());

        store.put("rtskey", "abcdef").unwrap();
        store.put("mailsite.pubkey", "SSK@a,b,c/mailsite").unwrap();
        assert_eq!(Some("abcdef".to_owned()), store.get("rtskey").unwrap());

        // Creating again must not clobber anything
        store.create().unwrap();
        assert_eq!(Some("abcdef".to_owned()), store.get("rtskey").unwrap());

        assert!(store.remove("rtskey").unwrap());
        assert!(!store.remove("rtskey").unwrap());
        assert_eq!(
            vec!["mailsite.pubkey"],
            store.load().unwrap().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn values_may_contain_equals() {
        let (_root, store) = store();
        store.put("md5passwd", "a=b=c").unwrap();
        assert_eq!(Some("a=b=c".to_owned()), store.get("md5passwd").unwrap());
    }

    #[test]
    fn parses_hand_edited_file() {
        let (_root, store) = store();
        fs::write(
            store.path(),
            "# comment\r\n\
             \n\
             rtskey=qwerty\r\n\
             garbage line\n\
             domain_alias=bob\n",
        )
        .unwrap();

        let props = store.load().unwrap();
        assert_eq!(Some("qwerty"), props.get("rtskey"));
        assert_eq!(Some("bob"), props.get("domain_alias"));
        assert_eq!(2, props.keys().count());
    }

    #[test]
    fn put_all_is_all_or_nothing() {
        let (_root, store) = store();
        store.put("a", "1").unwrap();

        assert_matches!(
            Err(Error::Io(..)),
            store.put_all(&[("b", "2"), ("c", "multi\nline")])
        );

        let props = store.load().unwrap();
        assert_eq!(Some("1"), props.get("a"));
        assert!(!props.contains("b"));
        assert!(!props.contains("c"));
    }

    #[test]
    fn rejects_unrepresentable_keys() {
        let (_root, store) = store();
        assert!(store.put("", "x").is_err());
        assert!(store.put("a=b", "x").is_err());
        assert!(store.put("#comment", "x").is_err());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn damaged_file_is_left_alone() {
        let (_root, store) = store();
        store.put("rtskey", "abcdef").unwrap();

        let mut damaged = fs::read(store.path()).unwrap();
        damaged.extend_from_slice(b"note=caf\xe9\n");
        fs::write(store.path(), &damaged).unwrap();

        assert_matches!(Err(Error::CorruptAccount(..)), store.load());
        assert_matches!(Err(Error::CorruptAccount(..)), store.get("rtskey"));
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            store.put("rtskey", "ghijkl")
        );
        assert_matches!(Err(Error::CorruptAccount(..)), store.remove("rtskey"));
        assert_eq!(damaged, fs::read(store.path()).unwrap());

        let mut oversized = b"rtskey=abcdef\n".to_vec();
        oversized.resize(MAX_PROPS_SIZE as usize + 1, b'#');
        fs::write(store.path(), &oversized).unwrap();
        assert_matches!(Err(Error::CorruptAccount(..)), store.load());
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            store.put("md5passwd", "x")
        );
        assert_eq!(oversized, fs::read(store.path()).unwrap());
    }

    #[test]
    fn update_without_change_does_not_write() {
        let (_root, store) = store();
        store.update(|_| Ok(false)).unwrap();
        assert!(!store.exists());
    }
}
