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

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::Mutex;

use log::info;
use rand::{rngs::OsRng, Rng};

use super::{AliasRegistrar, KeyPairGenerator};
use crate::account::mailsite::{Mailsite, SskKeyPair};
use crate::support::error::Error;

/// Extra field shared by every SSK public key.
const SSK_PUBLIC_EXTRA: &str = "AQACAAE";
/// Extra field shared by every SSK insert key.
const SSK_PRIVATE_EXTRA: &str = "AQECAAE";

/// An in-process stand-in for the network node.
///
/// Key pairs have the shape of real SSK keys but are random, and aliases are
/// only remembered for the lifetime of the object. Nothing is ever published.
/// This is what offline installations and the tests run against.
pub struct LoopbackNode {
    online: AtomicBool,
    aliases: Mutex<HashMap<String, String>>,
}

impl Default for LoopbackNode {
    fn default() -> Self {
        LoopbackNode {
            online: AtomicBool::new(true),
            aliases: Mutex::new(HashMap::new()),
        }
    }
}

impl LoopbackNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the node becoming (un)reachable.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, SeqCst);
    }

    /// Return the request key of the mailsite registered under `alias`.
    pub fn resolve_alias(&self, alias: &str) -> Option<String> {
        self.aliases
            .lock()
            .unwrap()
            .get(&alias.to_ascii_lowercase())
            .cloned()
    }

    fn ensure_online(&self) -> Result<(), Error> {
        if self.online.load(SeqCst) {
            Ok(())
        } else {
            Err(Error::NetworkUnavailable)
        }
    }
}

impl KeyPairGenerator for LoopbackNode {
    fn generate_key_pair(&self) -> Result<SskKeyPair, Error> {
        self.ensure_online()?;

        let routing: [u8; 32] = OsRng.gen();
        let insert: [u8; 32] = OsRng.gen();
        let crypto: [u8; 32] = OsRng.gen();
        let crypto = b64(&crypto);

        Ok(SskKeyPair {
            public_key: format!(
                "SSK@{},{},{}/",
                b64(&routing),
                crypto,
                SSK_PUBLIC_EXTRA
            ),
            private_key: format!(
                "SSK@{},{},{}/",
                b64(&insert),
                crypto,
                SSK_PRIVATE_EXTRA
            ),
        })
    }
}

impl AliasRegistrar for LoopbackNode {
    fn register_alias(
        &self,
        mailsite: &Mailsite,
        alias: &str,
    ) -> Result<bool, Error> {
        self.ensure_online()?;

        let mut aliases = self.aliases.lock().unwrap();
        let target = mailsite.request_key();
        let existing = aliases
            .entry(alias.to_ascii_lowercase())
            .or_insert_with(|| target.clone());
        if *existing == target {
            info!("Registered alias '{}' for {}", alias, target);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn b64(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}
