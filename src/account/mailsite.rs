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

//! The mailsite: the keyed record through which an account is reachable on
//! the network.
//!
//! The node hands out a key pair whose keys look like
//! `SSK@<routing>,<crypto>,<extra>/`. The account file stores each key with
//! the mailsite document name appended; the version is appended on top of
//! that when the record is actually requested or inserted.

use super::address::EmailAddress;
use super::props::Properties;
use crate::support::base32;

pub const MAILSITE_SUFFIX: &str = "mailsite";
pub const MAILSITE_VERSION: &str = "-1";

pub const PROP_PUBKEY: &str = "mailsite.pubkey";
pub const PROP_PRIVKEY: &str = "mailsite.privkey";

/// A key pair as returned by the node's key generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SskKeyPair {
    pub public_key: String,
    pub private_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mailsite {
    public_key: String,
    private_key: String,
}

impl Mailsite {
    /// Build the stored form of the mailsite keys from a fresh key pair.
    pub fn from_key_pair(pair: &SskKeyPair) -> Self {
        Mailsite {
            public_key: format!("{}{}", pair.public_key, MAILSITE_SUFFIX),
            private_key: format!("{}{}", pair.private_key, MAILSITE_SUFFIX),
        }
    }

    /// Load the mailsite keys from `props`.
    ///
    /// Returns `None` unless both keys are present.
    pub fn from_properties(props: &Properties) -> Option<Self> {
        Some(Mailsite {
            public_key: props.get(PROP_PUBKEY)?.to_owned(),
            private_key: props.get(PROP_PRIVKEY)?.to_owned(),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// The key under which peers request the mailsite record.
    pub fn request_key(&self) -> String {
        format!("{}{}", self.public_key, MAILSITE_VERSION)
    }

    /// The key under which the owner inserts the mailsite record.
    pub fn insert_key(&self) -> String {
        format!("{}{}", self.private_key, MAILSITE_VERSION)
    }

    /// The key body of the public key, or `None` if the stored key is
    /// malformed.
    pub fn key_body(&self) -> Option<&str> {
        key_body(&self.public_key)
    }

    /// The address derived from the public key.
    pub fn canonical_address(&self) -> Option<EmailAddress> {
        self.key_body()
            .map(|body| EmailAddress::with_label(&base32::encode(body.as_bytes())))
    }
}

/// Extract the part of a key URI between the key type and the document name,
/// e.g. `a,b,c` from `SSK@a,b,c/mailsite`.
pub fn key_body(uri: &str) -> Option<&str> {
    let at = uri.find('@')?;
    let key_type = &uri[..at];
    if !["SSK", "USK", "KSK", "CHK"]
        .iter()
        .any(|t| t.eq_ignore_ascii_case(key_type))
    {
        return None;
    }

    let rest = &uri[at + 1..];
    let body = rest.split('/').next().unwrap_or(rest);
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}
