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

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::support::error::Error;
use crate::support::file_ops;

const MAX_CONFIG_SIZE: u64 = 64 * 1024;

/// The system-wide configuration for Freemail.
///
/// This is stored in a file named `freemail.toml` under the Freemail system
/// root. Every section is optional.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    /// Parameters for the long-lived asymmetric key pair generated for each
    /// account.
    #[serde(default)]
    pub keygen: KeyGenConfig,

    #[serde(default)]
    pub node: NodeConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// The directory holding one subdirectory per account.
    ///
    /// Relative paths are resolved against the system root.
    pub accounts: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            accounts: "data".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyGenConfig {
    /// Size of the RSA modulus.
    ///
    /// Peers expect 4096-bit keys; changing this breaks compatibility with
    /// existing installations.
    pub rsa_bits: u32,
    /// The RSA public exponent. Like `rsa_bits`, this is part of the wire
    /// format shared with peers.
    pub public_exponent: u32,
    /// How long the dedicated key generation worker may run before the
    /// account is left without an asymmetric key pair.
    pub deadline_secs: u64,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        KeyGenConfig {
            rsa_bits: 4096,
            public_exponent: 17,
            deadline_secs: 900,
        }
    }
}

impl KeyGenConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeMode {
    /// Keys and aliases are handled in-process and never published.
    Loopback,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    pub mode: NodeMode,
    /// Whether short address registration is allowed at all.
    pub alias_registration: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            mode: NodeMode::Loopback,
            alias_registration: true,
        }
    }
}

impl SystemConfig {
    /// Load `freemail.toml` from `root`.
    ///
    /// A missing file yields the default configuration.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join("freemail.toml");
        let text = match file_ops::slurp(&path, MAX_CONFIG_SIZE) {
            Ok(text) => text,
            Err(e) if std::io::ErrorKind::NotFound == e.kind() => {
                return Ok(SystemConfig::default())
            },
            Err(e) => return Err(e.into()),
        };

        Ok(toml::from_str(&text)?)
    }

    /// Return the accounts directory, resolved against `root`.
    pub fn accounts_root(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.accounts)
    }
}
