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

use crate::support::base32;

/// The pseudo top-level domain under which all addresses live.
pub const FREEMAIL_TLD: &str = "freemail";

/// The local part used when rendering an account's own address.
///
/// Only the domain identifies a mailbox; any local part reaches the same
/// place.
pub const ANY_LOCAL_PART: &str = "anything";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    pub user: String,
    pub domain: String,
}

impl EmailAddress {
    pub fn new(user: impl Into<String>, domain: impl Into<String>) -> Self {
        EmailAddress {
            user: user.into(),
            domain: domain.into(),
        }
    }

    /// The address whose domain is `label.freemail`.
    pub fn with_label(label: &str) -> Self {
        EmailAddress::new(ANY_LOCAL_PART, format!("{}.{}", label, FREEMAIL_TLD))
    }

    /// Parse `user@domain`, splitting on the last `@`.
    pub fn parse(s: &str) -> Option<Self> {
        let at = s.rfind('@')?;
        let (user, domain) = (&s[..at], &s[at + 1..]);
        if user.is_empty() || domain.is_empty() {
            None
        } else {
            Some(EmailAddress::new(user, domain))
        }
    }

    pub fn is_freemail_address(&self) -> bool {
        self.label().is_some()
    }

    /// The part of the domain before `.freemail`, if this is a Freemail
    /// address.
    pub fn label(&self) -> Option<&str> {
        let dot = self.domain.rfind('.')?;
        let (label, tld) = (&self.domain[..dot], &self.domain[dot + 1..]);
        if !label.is_empty() && tld.eq_ignore_ascii_case(FREEMAIL_TLD) {
            Some(label)
        } else {
            None
        }
    }

    /// Recover the mailsite key body encoded in the domain label.
    ///
    /// Returns `None` for non-Freemail addresses and for alias addresses
    /// whose label is not a base-32 encoded key body.
    pub fn mailsite_key_body(&self) -> Option<String> {
        let bytes = base32::decode(self.label()?)?;
        let body = String::from_utf8(bytes).ok()?;
        if body.contains(',') && !body.contains(|c: char| c.is_control()) {
            Some(body)
        } else {
            None
        }
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.domain)
    }
}
