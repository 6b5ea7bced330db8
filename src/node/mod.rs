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

//! The interface to the peer-to-peer node.
//!
//! Publishing and fetching keyed content is the node's business. The account
//! layer only needs two things from it: a fresh key pair for each new
//! mailsite, and registration of short aliases pointing at a mailsite.

mod loopback;

pub use self::loopback::LoopbackNode;

use crate::account::mailsite::{Mailsite, SskKeyPair};
use crate::support::error::Error;

pub trait KeyPairGenerator: Send + Sync {
    /// Ask the node for a new key pair.
    ///
    /// Fails with `Error::NetworkUnavailable` if the node cannot be reached.
    fn generate_key_pair(&self) -> Result<SskKeyPair, Error>;
}

pub trait AliasRegistrar: Send + Sync {
    /// Publish `alias` as a pointer to `mailsite`.
    ///
    /// Returns `Ok(false)` if the network refused the alias (typically
    /// because somebody else already holds it).
    fn register_alias(
        &self,
        mailsite: &Mailsite,
        alias: &str,
    ) -> Result<bool, Error>;
}
