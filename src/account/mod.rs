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

//! Accounts and the identities they carry.
//!
//! An account is a directory under the accounts root holding a property
//! file (`accprops`) and the mailbox tree (`inbox/`). The property file
//! records the mailsite keys used to publish the account on the network,
//! the long-lived RSA key pair, the RTS key, an optional short alias, and
//! the password hash.

pub mod address;
pub mod identity;
pub mod keys;
pub mod mailsite;
pub mod props;
