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

//! Validation of names which end up as file system elements.
//!
//! Account names, folder names, and aliases are all used directly as path
//! components, so they are restricted to character sets that cannot express
//! directory traversal, hidden files, or anything with special meaning to the
//! mail protocols built on top of the store.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ACCOUNT_NAME: Regex = Regex::new("^[A-Za-z0-9_]+$").unwrap();
    static ref FOLDER_NAME: Regex = Regex::new("^[A-Za-z0-9_ ]+$").unwrap();
    static ref ALIAS: Regex = Regex::new("^[A-Za-z0-9_-]+$").unwrap();
}

/// Determine whether `name` may be used as an account name.
///
/// Only ASCII word characters are permitted.
pub fn is_safe_account_name(name: &str) -> bool {
    ACCOUNT_NAME.is_match(name)
}

/// Determine whether `name` may be used as the name of a single folder
/// (i.e., one level of the folder hierarchy).
///
/// ASCII word characters and spaces are permitted. Leading dots are thereby
/// impossible, which the soft-delete scheme relies on.
pub fn is_safe_folder_name(name: &str) -> bool {
    FOLDER_NAME.is_match(name)
}

/// Determine whether `alias` may be registered as a short address.
///
/// Aliases end up both in the property file and as a domain label, so they
/// are restricted to word characters and hyphens.
pub fn is_safe_alias(alias: &str) -> bool {
    ALIAS.is_match(alias)
}
