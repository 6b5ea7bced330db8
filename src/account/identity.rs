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
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{info, warn};
use openssl::hash::{hash, MessageDigest};
use openssl::memcmp;
use openssl::pkey::{Private, Public};
use openssl::rsa::Rsa;
use rand::{rngs::OsRng, Rng, RngCore};

use super::address::EmailAddress;
use super::keys::{self, AsymmetricKeyPair};
use super::mailsite::{Mailsite, PROP_PRIVKEY, PROP_PUBKEY};
use super::props::{Properties, PropertyStore};
use crate::mailbox::{FolderLocks, MailboxStore};
use crate::node::{AliasRegistrar, KeyPairGenerator};
use crate::support::error::Error;
use crate::support::file_ops::ErrorTransforms;
use crate::support::log_prefix::LogPrefix;
use crate::support::safe_name::{is_safe_account_name, is_safe_alias};
use crate::support::system_config::KeyGenConfig;
use crate::support::threading;

/// Name of the property file within each account directory.
pub const PROPS_FILE: &str = "accprops";

pub const PROP_RTSKEY: &str = "rtskey";
pub const PROP_DOMAIN_ALIAS: &str = "domain_alias";
pub const PROP_PASSWORD_HASH: &str = "md5passwd";

const RTS_KEY_LEN: usize = 32;

/// How far provisioning of an account has progressed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProvisionState {
    /// All keys are present; the account is usable.
    Complete,
    /// The asymmetric key pair is present, but the mailsite keys are not.
    NeedsMailsite,
    /// The mailsite keys are present, but the asymmetric key pair is not.
    NeedsAsymmetricKey,
    /// Nothing has been provisioned yet.
    Fresh,
}

impl ProvisionState {
    pub fn needs_mailsite(self) -> bool {
        match self {
            ProvisionState::NeedsMailsite | ProvisionState::Fresh => true,
            _ => false,
        }
    }

    pub fn needs_asymmetric_key(self) -> bool {
        match self {
            ProvisionState::NeedsAsymmetricKey | ProvisionState::Fresh => true,
            _ => false,
        }
    }

    /// Determine the state recorded in `props`.
    ///
    /// A key set which is only partially present is reported as
    /// `CorruptAccount`; provisioning never writes one.
    pub fn of(props: &Properties) -> Result<Self, Error> {
        let mailsite_keys = [PROP_PUBKEY, PROP_PRIVKEY, PROP_RTSKEY]
            .iter()
            .filter(|&&k| props.contains(k))
            .count();
        let has_mailsite = match mailsite_keys {
            0 => false,
            3 => true,
            _ => return Err(Error::CorruptAccount("incomplete mailsite keys")),
        };
        let has_asym = AsymmetricKeyPair::from_properties(props)?.is_some();

        Ok(match (has_mailsite, has_asym) {
            (true, true) => ProvisionState::Complete,
            (false, true) => ProvisionState::NeedsMailsite,
            (true, false) => ProvisionState::NeedsAsymmetricKey,
            (false, false) => ProvisionState::Fresh,
        })
    }
}

struct AccountHandle {
    dir: PathBuf,
    props: PropertyStore,
    locks: Arc<FolderLocks>,
    provisioning: Mutex<()>,
}

/// Creates and provisions accounts and answers questions about their
/// identity.
///
/// One `IdentityManager` serves every account under a single accounts root
/// and is shared between sessions. Per-account state (the property file
/// handle and the folder locks) is created on first use and kept for the
/// life of the manager, so that all sessions on an account coordinate
/// through the same locks.
pub struct IdentityManager {
    log_prefix: LogPrefix,
    root: PathBuf,
    keygen: KeyGenConfig,
    key_pairs: Arc<dyn KeyPairGenerator>,
    aliases: Arc<dyn AliasRegistrar>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    accounts: Mutex<HashMap<String, Arc<AccountHandle>>>,
}

impl IdentityManager {
    pub fn new(
        log_prefix: LogPrefix,
        root: PathBuf,
        keygen: KeyGenConfig,
        key_pairs: Arc<dyn KeyPairGenerator>,
        aliases: Arc<dyn AliasRegistrar>,
    ) -> Self {
        IdentityManager {
            log_prefix,
            root,
            keygen,
            key_pairs,
            aliases,
            rng: Mutex::new(Box::new(OsRng)),
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the random source used for RTS keys.
    pub fn with_rng(self, rng: impl RngCore + Send + 'static) -> Self {
        IdentityManager {
            rng: Mutex::new(Box::new(rng)),
            ..self
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn account_dir(&self, username: &str) -> PathBuf {
        self.root.join(username)
    }

    pub fn account_exists(&self, username: &str) -> bool {
        is_safe_account_name(username) && self.account_dir(username).is_dir()
    }

    fn account(&self, username: &str) -> Result<Arc<AccountHandle>, Error> {
        if !is_safe_account_name(username) {
            return Err(Error::UnsafeName);
        }

        let dir = self.account_dir(username);
        if !dir.is_dir() {
            return Err(Error::NxAccount);
        }

        let mut accounts = self.accounts.lock().unwrap();
        Ok(Arc::clone(
            accounts.entry(username.to_owned()).or_insert_with(|| {
                Arc::new(AccountHandle {
                    props: PropertyStore::new(dir.join(PROPS_FILE)),
                    dir,
                    locks: Arc::new(FolderLocks::default()),
                    provisioning: Mutex::new(()),
                })
            }),
        ))
    }

    /// Create a new account and provision it.
    ///
    /// The account exists once this returns successfully, even if the node
    /// was unreachable or key generation ran out of time. In those cases the
    /// returned state says what is missing, and `provision()` can be called
    /// later to finish the job.
    pub fn create_account(
        &self,
        username: &str,
    ) -> Result<ProvisionState, Error> {
        if !is_safe_account_name(username) {
            return Err(Error::UnsafeName);
        }

        fs::create_dir_all(&self.root)?;
        let dir = self.account_dir(username);
        fs::DirBuilder::new()
            .mode(0o700)
            .create(&dir)
            .on_exists(Error::AccountExists)?;

        let account = self.account(username)?;
        account.props.create()?;
        MailboxStore::open(
            self.log_prefix.deep_clone(),
            &account.dir,
            Arc::clone(&account.locks),
        )?;
        info!("{} Created account '{}'", self.log_prefix, username);

        match self.provision(username) {
            Ok(()) => (),
            Err(e @ Error::NetworkUnavailable)
            | Err(e @ Error::KeyGenerationIncomplete) => warn!(
                "{} Account '{}' is only partially provisioned: {}",
                self.log_prefix, username, e
            ),
            Err(e) => return Err(e),
        }

        self.provision_state(username)
    }

    pub fn provision_state(
        &self,
        username: &str,
    ) -> Result<ProvisionState, Error> {
        ProvisionState::of(&self.account(username)?.props.load()?)
    }

    /// Generate whatever keys the account is still missing.
    ///
    /// Each step writes its complete key set in a single update of the
    /// property file, or nothing at all. A step that cannot complete does
    /// not prevent the other from running. If the node is unreachable,
    /// fails with `NetworkUnavailable`; if key generation does not finish
    /// within the configured deadline, fails with
    /// `KeyGenerationIncomplete`.
    pub fn provision(&self, username: &str) -> Result<(), Error> {
        let account = self.account(username)?;
        let _provisioning = account.provisioning.lock().unwrap();
        let state = ProvisionState::of(&account.props.load()?)?;

        let mut network_unavailable = false;
        if state.needs_mailsite() {
            match self.provision_mailsite(&account) {
                Ok(()) => info!(
                    "{} Generated mailsite keys for '{}'",
                    self.log_prefix, username
                ),
                Err(Error::NetworkUnavailable) => {
                    warn!(
                        "{} Node unreachable, can't create mailsite keys \
                         for '{}'",
                        self.log_prefix, username
                    );
                    network_unavailable = true;
                },
                Err(e) => return Err(e),
            }
        }

        let mut keygen_incomplete = false;
        if state.needs_asymmetric_key() {
            match self.provision_asymmetric_key(&account) {
                Ok(()) => info!(
                    "{} Generated asymmetric key pair for '{}'",
                    self.log_prefix, username
                ),
                Err(Error::KeyGenerationIncomplete) => {
                    keygen_incomplete = true;
                },
                Err(e) => return Err(e),
            }
        }

        if network_unavailable {
            Err(Error::NetworkUnavailable)
        } else if keygen_incomplete {
            Err(Error::KeyGenerationIncomplete)
        } else {
            Ok(())
        }
    }

    fn provision_mailsite(&self, account: &AccountHandle) -> Result<(), Error> {
        let mailsite =
            Mailsite::from_key_pair(&self.key_pairs.generate_key_pair()?);
        let rts_key = self.generate_rts_key();

        account.props.update(|props| {
            if props.contains(PROP_PUBKEY) {
                return Ok(false);
            }

            props.set(PROP_PUBKEY, mailsite.public_key())?;
            props.set(PROP_PRIVKEY, mailsite.private_key())?;
            props.set(PROP_RTSKEY, rts_key)?;
            Ok(true)
        })
    }

    fn provision_asymmetric_key(
        &self,
        account: &AccountHandle,
    ) -> Result<(), Error> {
        let keygen = self.keygen.clone();
        info!(
            "{} Generating {}-bit asymmetric key pair, this may take a while",
            self.log_prefix, keygen.rsa_bits
        );

        let pair = threading::run_with_deadline(
            "keygen",
            self.keygen.deadline(),
            move || AsymmetricKeyPair::generate(&keygen),
        )
        .ok_or(Error::KeyGenerationIncomplete)??;

        account.props.update(|props| {
            if AsymmetricKeyPair::from_properties(props)?.is_some() {
                return Ok(false);
            }

            for (key, value) in pair.to_properties().iter() {
                props.set(key, value.clone())?;
            }
            Ok(true)
        })
    }

    fn generate_rts_key(&self) -> String {
        let mut rng = self.rng.lock().unwrap();
        (0..RTS_KEY_LEN)
            .map(|_| rng.gen_range(b'a', b'z' + 1) as char)
            .collect()
    }

    /// Set the password of an existing account.
    pub fn change_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), Error> {
        let account = self.account(username)?;
        account
            .props
            .put(PROP_PASSWORD_HASH, &password_digest(password)?)?;
        info!("{} Changed password of '{}'", self.log_prefix, username);
        Ok(())
    }

    /// Check `password` against the stored hash of `username`.
    ///
    /// Any problem with the account (bad name, no such account, no password
    /// set, unreadable property file) reads as a failed login. The digest is
    /// computed and compared in every case so that all failures take about
    /// the same time.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let digest = match password_digest(password) {
            Ok(digest) => digest,
            Err(e) => {
                warn!("{} Failed to hash password: {}", self.log_prefix, e);
                return false;
            },
        };

        let (known, stored) = match self.stored_password_hash(username) {
            Some(stored) => (true, stored.to_ascii_lowercase()),
            None => (false, "0".repeat(digest.len())),
        };

        let matches = stored.len() == digest.len()
            && memcmp::eq(stored.as_bytes(), digest.as_bytes());
        known && matches
    }

    fn stored_password_hash(&self, username: &str) -> Option<String> {
        let account = self.account(username).ok()?;
        match account.props.get(PROP_PASSWORD_HASH) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(
                    "{} Failed to read properties of '{}': {}",
                    self.log_prefix, username, e
                );
                None
            },
        }
    }

    pub fn mailsite(&self, username: &str) -> Result<Option<Mailsite>, Error> {
        Ok(Mailsite::from_properties(
            &self.account(username)?.props.load()?,
        ))
    }

    pub fn rts_key(&self, username: &str) -> Result<Option<String>, Error> {
        self.account(username)?.props.get(PROP_RTSKEY)
    }

    /// The address derived from the account's mailsite public key.
    ///
    /// Returns `None`, with a warning, if the key is missing or malformed.
    pub fn canonical_address(
        &self,
        username: &str,
    ) -> Result<Option<EmailAddress>, Error> {
        let address = self
            .mailsite(username)?
            .and_then(|mailsite| mailsite.canonical_address());
        if address.is_none() {
            warn!(
                "{} Can't derive address of '{}': mailsite key missing or \
                 malformed",
                self.log_prefix, username
            );
        }
        Ok(address)
    }

    /// The short address of the account, if an alias has been registered.
    pub fn alias_address(
        &self,
        username: &str,
    ) -> Result<Option<EmailAddress>, Error> {
        Ok(self
            .account(username)?
            .props
            .get(PROP_DOMAIN_ALIAS)?
            .map(|alias| EmailAddress::with_label(&alias)))
    }

    /// The address the account is known by: the alias address if there is
    /// one, otherwise the canonical address.
    pub fn derive_address(
        &self,
        username: &str,
    ) -> Result<Option<EmailAddress>, Error> {
        match self.alias_address(username)? {
            Some(address) => Ok(Some(address)),
            None => self.canonical_address(username),
        }
    }

    /// Register `alias` as a short address for the account.
    ///
    /// The alias is only recorded locally once the network has accepted it.
    pub fn add_short_address(
        &self,
        username: &str,
        alias: &str,
    ) -> Result<(), Error> {
        if !is_safe_alias(alias) {
            return Err(Error::UnsafeName);
        }

        let account = self.account(username)?;
        let mailsite = Mailsite::from_properties(&account.props.load()?)
            .ok_or(Error::CorruptAccount("mailsite keys missing"))?;

        if !self.aliases.register_alias(&mailsite, alias)? {
            warn!(
                "{} Alias '{}' for '{}' rejected by the network",
                self.log_prefix, alias, username
            );
            return Err(Error::AliasRejected);
        }

        account
            .props
            .put(PROP_DOMAIN_ALIAS, &alias.to_ascii_lowercase())?;
        info!(
            "{} Registered alias '{}' for '{}'",
            self.log_prefix, alias, username
        );
        Ok(())
    }

    /// Reconstruct the account's private RSA key.
    ///
    /// Returns `None` if the key components are missing or unusable.
    pub fn get_private_key(
        &self,
        username: &str,
    ) -> Result<Option<Rsa<Private>>, Error> {
        Ok(keys::private_key_from_properties(
            &self.account(username)?.props.load()?,
            self.keygen.public_exponent,
        ))
    }

    /// Reconstruct the account's public RSA key.
    ///
    /// Returns `None` if the key components are missing or unusable.
    pub fn get_public_key(
        &self,
        username: &str,
    ) -> Result<Option<Rsa<Public>>, Error> {
        let props = self.account(username)?.props.load()?;
        let key = AsymmetricKeyPair::from_properties(&props)
            .and_then(|pair| pair.map(|p| p.public_key()).transpose());
        match key {
            Ok(key) => Ok(key),
            Err(e) => {
                warn!(
                    "{} Can't get public key of '{}': {}",
                    self.log_prefix, username, e
                );
                Ok(None)
            },
        }
    }

    /// Open the mailbox store of the account.
    pub fn open_mailbox(
        &self,
        username: &str,
        log_prefix: LogPrefix,
    ) -> Result<MailboxStore, Error> {
        let account = self.account(username)?;
        MailboxStore::open(log_prefix, &account.dir, Arc::clone(&account.locks))
    }
}

/// Hash a password for storage, as lowercase hex.
fn password_digest(password: &str) -> Result<String, Error> {
    Ok(hex::encode(&*hash(MessageDigest::md5(), password.as_bytes())?))
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;

    use super::*;
    use crate::node::LoopbackNode;

    struct Setup {
        root: TempDir,
        node: Arc<LoopbackNode>,
        identity: IdentityManager,
    }

    fn keygen(deadline_secs: u64) -> KeyGenConfig {
        KeyGenConfig {
            rsa_bits: 1024,
            deadline_secs,
            ..KeyGenConfig::default()
        }
    }

    fn manager(
        root: &Path,
        node: &Arc<LoopbackNode>,
        keygen: KeyGenConfig,
    ) -> IdentityManager {
        IdentityManager::new(
            LogPrefix::new("test".to_owned()),
            root.join("accounts"),
            keygen,
            Arc::clone(node) as Arc<dyn KeyPairGenerator>,
            Arc::clone(node) as Arc<dyn AliasRegistrar>,
        )
    }

    fn set_up() -> Setup {
        crate::init_test_log();

        let root = tempfile::tempdir().unwrap();
        let node = Arc::new(LoopbackNode::new());
        let identity = manager(root.path(), &node, keygen(300));
        Setup {
            root,
            node,
            identity,
        }
    }

    #[test]
    fn create_account() {
        let setup = set_up();
        let identity = &setup.identity;

        assert_eq!(
            ProvisionState::Complete,
            identity.create_account("alice").unwrap()
        );
        let dir = setup.root.path().join("accounts/alice");
        assert!(dir.join("accprops").is_file());
        assert!(dir.join("inbox").is_dir());
        assert!(identity.account_exists("alice"));

        assert_matches!(
            Err(Error::AccountExists),
            identity.create_account("alice")
        );
        assert_matches!(
            Err(Error::UnsafeName),
            identity.create_account("../alice")
        );
        assert_matches!(Err(Error::UnsafeName), identity.create_account(""));
        assert_matches!(
            Err(Error::UnsafeName),
            identity.create_account("a b")
        );
        assert_matches!(
            Err(Error::NxAccount),
            identity.provision_state("bob")
        );
    }

    #[test]
    fn provisioned_keys() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();

        let mailsite = identity.mailsite("alice").unwrap().unwrap();
        assert!(mailsite.public_key().starts_with("SSK@"));
        assert!(mailsite.public_key().ends_with("/mailsite"));
        assert!(mailsite.private_key().ends_with("/mailsite"));

        let rts_key = identity.rts_key("alice").unwrap().unwrap();
        assert_eq!(32, rts_key.len());
        assert!(rts_key.chars().all(|c| c.is_ascii_lowercase()));

        let private = identity.get_private_key("alice").unwrap().unwrap();
        let public = identity.get_public_key("alice").unwrap().unwrap();
        assert_eq!(1024, private.size() * 8);
        assert_eq!(public.n().to_vec(), private.n().to_vec());
        assert_eq!(vec![17u8], public.e().to_vec());

        // Provisioning again is a no-op
        identity.provision("alice").unwrap();
        assert_eq!(Some(mailsite), identity.mailsite("alice").unwrap());
    }

    #[test]
    fn offline_node_leaves_account_resumable() {
        let setup = set_up();
        let identity = &setup.identity;

        setup.node.set_online(false);
        assert_eq!(
            ProvisionState::NeedsMailsite,
            identity.create_account("alice").unwrap()
        );
        assert!(identity.mailsite("alice").unwrap().is_none());
        assert!(identity.rts_key("alice").unwrap().is_none());
        assert!(identity.canonical_address("alice").unwrap().is_none());
        assert!(identity.get_private_key("alice").unwrap().is_some());

        assert_matches!(
            Err(Error::NetworkUnavailable),
            identity.provision("alice")
        );

        setup.node.set_online(true);
        identity.provision("alice").unwrap();
        assert_eq!(
            ProvisionState::Complete,
            identity.provision_state("alice").unwrap()
        );
        assert!(identity.canonical_address("alice").unwrap().is_some());
    }

    #[test]
    fn missed_keygen_deadline_writes_nothing() {
        let setup = set_up();
        let hasty = manager(setup.root.path(), &setup.node, keygen(0));

        assert_eq!(
            ProvisionState::NeedsAsymmetricKey,
            hasty.create_account("alice").unwrap()
        );
        assert_matches!(
            Err(Error::KeyGenerationIncomplete),
            hasty.provision("alice")
        );
        assert!(hasty.get_private_key("alice").unwrap().is_none());
        assert!(hasty.get_public_key("alice").unwrap().is_none());
        let props = fs::read_to_string(
            setup.root.path().join("accounts/alice/accprops"),
        )
        .unwrap();
        assert!(!props.contains("asymkey"));

        setup.identity.provision("alice").unwrap();
        assert_eq!(
            ProvisionState::Complete,
            setup.identity.provision_state("alice").unwrap()
        );
    }

    #[test]
    fn authentication() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();

        // No password set yet
        assert!(!identity.authenticate("alice", ""));
        assert!(!identity.authenticate("alice", "correcthorse"));

        identity.change_password("alice", "correcthorse").unwrap();
        assert!(identity.authenticate("alice", "correcthorse"));
        assert!(!identity.authenticate("alice", "wrong"));
        assert!(!identity.authenticate("alice", "Correcthorse"));
        assert!(!identity.authenticate("nonexistent", "x"));
        assert!(!identity.authenticate("../alice", "correcthorse"));

        assert_matches!(
            Err(Error::NxAccount),
            identity.change_password("nonexistent", "x")
        );

        identity.change_password("alice", "battery staple").unwrap();
        assert!(!identity.authenticate("alice", "correcthorse"));
        assert!(identity.authenticate("alice", "battery staple"));
    }

    #[test]
    fn stored_hash_format() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();
        identity.change_password("alice", "password").unwrap();

        let props = identity.account("alice").unwrap().props.load().unwrap();
        assert_eq!(
            Some("5f4dcc3b5aa765d61d8327deb882cf99"),
            props.get(PROP_PASSWORD_HASH)
        );

        // Hashes written in upper case still match
        identity
            .account("alice")
            .unwrap()
            .props
            .put(PROP_PASSWORD_HASH, "5F4DCC3B5AA765D61D8327DEB882CF99")
            .unwrap();
        assert!(identity.authenticate("alice", "password"));

        identity
            .account("alice")
            .unwrap()
            .props
            .put(PROP_PASSWORD_HASH, "5f4dcc3b")
            .unwrap();
        assert!(!identity.authenticate("alice", "password"));
    }

    #[test]
    fn address_derivation() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();

        let mailsite = identity.mailsite("alice").unwrap().unwrap();
        let canonical = identity.canonical_address("alice").unwrap().unwrap();
        assert_eq!(
            canonical,
            identity.canonical_address("alice").unwrap().unwrap()
        );
        assert_eq!(
            canonical,
            identity.derive_address("alice").unwrap().unwrap()
        );
        assert_eq!("anything", canonical.user);
        assert!(canonical.domain.ends_with(".freemail"));
        assert_eq!(
            mailsite.key_body().map(str::to_owned),
            canonical.mailsite_key_body()
        );
        assert!(identity.alias_address("alice").unwrap().is_none());

        identity.add_short_address("alice", "Alice").unwrap();
        assert_eq!(
            "anything@alice.freemail",
            identity.derive_address("alice").unwrap().unwrap().to_string()
        );
        assert_eq!(
            canonical,
            identity.canonical_address("alice").unwrap().unwrap()
        );
        assert_eq!(Some(mailsite), identity.mailsite("alice").unwrap());
        assert_eq!(
            Some(identity.mailsite("alice").unwrap().unwrap().request_key()),
            setup.node.resolve_alias("alice")
        );
    }

    #[test]
    fn rejected_alias_is_not_recorded() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();
        identity.create_account("bob").unwrap();
        identity.add_short_address("alice", "alice").unwrap();

        assert_matches!(
            Err(Error::AliasRejected),
            identity.add_short_address("bob", "alice")
        );
        assert!(identity.alias_address("bob").unwrap().is_none());
        assert_eq!(
            identity.canonical_address("bob").unwrap(),
            identity.derive_address("bob").unwrap()
        );

        assert_matches!(
            Err(Error::UnsafeName),
            identity.add_short_address("bob", "bob.evil")
        );
        assert_matches!(
            Err(Error::NxAccount),
            identity.add_short_address("carol", "carol")
        );

        setup.node.set_online(false);
        assert_matches!(
            Err(Error::NetworkUnavailable),
            identity.add_short_address("bob", "bobby")
        );
        assert!(identity.alias_address("bob").unwrap().is_none());
    }

    #[test]
    fn corrupt_key_material() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();

        let account = identity.account("alice").unwrap();
        let props = &account.props;
        props.remove(keys::PROP_MODULUS).unwrap();
        assert!(identity.get_private_key("alice").unwrap().is_none());
        assert!(identity.get_public_key("alice").unwrap().is_none());
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.provision_state("alice")
        );
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.provision("alice")
        );

        props.remove(PROP_PRIVKEY).unwrap();
        assert!(identity.mailsite("alice").unwrap().is_none());
        assert!(identity.derive_address("alice").unwrap().is_none());
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.add_short_address("alice", "alice")
        );
    }

    #[test]
    fn damaged_property_file_is_never_rewritten() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();
        identity.change_password("alice", "pw").unwrap();

        let path = setup.root.path().join("accounts/alice/accprops");
        let mut damaged = fs::read(&path).unwrap();
        damaged.extend_from_slice(b"note=caf\xe9\n");
        fs::write(&path, &damaged).unwrap();

        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.provision_state("alice")
        );
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.provision("alice")
        );
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.change_password("alice", "other")
        );
        assert_matches!(
            Err(Error::CorruptAccount(..)),
            identity.mailsite("alice")
        );
        assert!(!identity.authenticate("alice", "pw"));
        assert_eq!(damaged, fs::read(&path).unwrap());

        // Repairing the file by hand restores the original identity
        damaged.truncate(damaged.len() - b"note=caf\xe9\n".len());
        fs::write(&path, &damaged).unwrap();
        assert!(identity.authenticate("alice", "pw"));
        assert_eq!(
            ProvisionState::Complete,
            identity.provision_state("alice").unwrap()
        );
    }

    #[test]
    fn rts_key_uses_injected_rng() {
        let root = tempfile::tempdir().unwrap();
        let node = Arc::new(LoopbackNode::new());
        let a = manager(root.path(), &node, keygen(300))
            .with_rng(StdRng::seed_from_u64(42));
        let b = manager(root.path(), &node, keygen(300))
            .with_rng(StdRng::seed_from_u64(42));

        a.create_account("alice").unwrap();
        b.create_account("bob").unwrap();

        let alice = a.rts_key("alice").unwrap().unwrap();
        assert_eq!(alice, b.rts_key("bob").unwrap().unwrap());
        assert_eq!(32, alice.len());
        assert!(alice.bytes().all(|c| (b'a'..=b'z').contains(&c)));
    }

    #[test]
    fn mailbox_is_shared_between_sessions() {
        let setup = set_up();
        let identity = &setup.identity;
        identity.create_account("alice").unwrap();

        let one = identity
            .open_mailbox("alice", LogPrefix::new("one".to_owned()))
            .unwrap();
        let two = identity
            .open_mailbox("alice", LogPrefix::new("two".to_owned()))
            .unwrap();
        one.inbox().append(b"hello", "").unwrap();
        assert_eq!(1, two.inbox().list_messages().unwrap().len());
        assert_matches!(
            Err(Error::NxAccount),
            identity.open_mailbox("bob", LogPrefix::new("x".to_owned()))
        );
    }
}
