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

//! The long-lived RSA key pair used for message-level cryptography.
//!
//! Peers only ever see the modulus and exponents, which are stored in the
//! account file as radix-32 numerals. The CRT parameters are not kept; the
//! private key is reconstructed from the modulus and the two exponents.

use log::warn;
use openssl::{
    bn::BigNum,
    pkey::{Private, Public},
    rsa::{Rsa, RsaPrivateKeyBuilder},
};

use super::props::Properties;
use crate::support::base32;
use crate::support::error::Error;
use crate::support::system_config::KeyGenConfig;

pub const PROP_MODULUS: &str = "asymkey.modulus";
pub const PROP_PUBEXPONENT: &str = "asymkey.pubexponent";
pub const PROP_PRIVEXPONENT: &str = "asymkey.privexponent";

/// Primality certainty the key format was designed around.
///
/// OpenSSL picks its own number of Miller-Rabin rounds for the requested
/// modulus size, which is never weaker than this.
pub const ASYM_KEY_CERTAINTY: u32 = 80;

/// The public and private components of an RSA key pair, as big-endian
/// magnitudes.
#[derive(Clone)]
pub struct AsymmetricKeyPair {
    modulus: Vec<u8>,
    public_exponent: Vec<u8>,
    private_exponent: Vec<u8>,
}

impl AsymmetricKeyPair {
    /// Generate a new key pair.
    ///
    /// This is CPU-bound and can take minutes for 4096-bit keys.
    pub fn generate(config: &KeyGenConfig) -> Result<Self, Error> {
        let e = BigNum::from_u32(config.public_exponent)?;
        let rsa = Rsa::generate_with_e(config.rsa_bits, &e)?;
        Ok(AsymmetricKeyPair {
            modulus: rsa.n().to_vec(),
            public_exponent: rsa.e().to_vec(),
            private_exponent: rsa.d().to_vec(),
        })
    }

    /// Load the key pair from `props`.
    ///
    /// Returns `Ok(None)` if no part of the key pair is present, and
    /// `CorruptAccount` if it is only partially present or unparsable.
    pub fn from_properties(props: &Properties) -> Result<Option<Self>, Error> {
        let parts = [PROP_MODULUS, PROP_PUBEXPONENT, PROP_PRIVEXPONENT]
            .iter()
            .map(|&k| props.get(k))
            .collect::<Vec<_>>();

        match (parts[0], parts[1], parts[2]) {
            (None, None, None) => Ok(None),
            (Some(n), Some(e), Some(d)) => {
                match (
                    base32::from_radix32(n),
                    base32::from_radix32(e),
                    base32::from_radix32(d),
                ) {
                    (Some(modulus), Some(public_exponent), Some(private_exponent)) => {
                        Ok(Some(AsymmetricKeyPair {
                            modulus,
                            public_exponent,
                            private_exponent,
                        }))
                    },
                    _ => Err(Error::CorruptAccount(
                        "asymmetric key components unparsable",
                    )),
                }
            },
            _ => Err(Error::CorruptAccount("incomplete asymmetric key pair")),
        }
    }

    /// The property entries representing this key pair.
    pub fn to_properties(&self) -> [(&'static str, String); 3] {
        [
            (PROP_MODULUS, base32::to_radix32(&self.modulus)),
            (PROP_PUBEXPONENT, base32::to_radix32(&self.public_exponent)),
            (PROP_PRIVEXPONENT, base32::to_radix32(&self.private_exponent)),
        ]
    }

    /// Size of the modulus, in bits.
    pub fn bits(&self) -> usize {
        let leading_zeros = self
            .modulus
            .first()
            .map(|b| b.leading_zeros() as usize)
            .unwrap_or(0);
        self.modulus.len() * 8 - leading_zeros
    }

    pub fn public_key(&self) -> Result<Rsa<Public>, Error> {
        Ok(Rsa::from_public_components(
            BigNum::from_slice(&self.modulus)?,
            BigNum::from_slice(&self.public_exponent)?,
        )?)
    }

    pub fn private_key(&self) -> Result<Rsa<Private>, Error> {
        Ok(RsaPrivateKeyBuilder::new(
            BigNum::from_slice(&self.modulus)?,
            BigNum::from_slice(&self.public_exponent)?,
            BigNum::from_slice(&self.private_exponent)?,
        )?
        .build())
    }
}

/// Reconstruct the private key stored in `props`.
///
/// Only the modulus and private exponent are strictly required; if the
/// public exponent is missing, `public_exponent` is assumed. A missing or
/// unparsable component is logged and yields `None`.
pub fn private_key_from_properties(
    props: &Properties,
    public_exponent: u32,
) -> Option<Rsa<Private>> {
    let (n, d) = match (props.get(PROP_MODULUS), props.get(PROP_PRIVEXPONENT)) {
        (Some(n), Some(d)) => (n, d),
        _ => {
            warn!("Couldn't get private key - account file corrupt?");
            return None;
        },
    };

    let e = props
        .get(PROP_PUBEXPONENT)
        .map(str::to_owned)
        .unwrap_or_else(|| {
            base32::to_radix32(&public_exponent.to_be_bytes())
        });

    let pair = match (
        base32::from_radix32(n),
        base32::from_radix32(&e),
        base32::from_radix32(d),
    ) {
        (Some(modulus), Some(public_exponent), Some(private_exponent)) => {
            AsymmetricKeyPair {
                modulus,
                public_exponent,
                private_exponent,
            }
        },
        _ => {
            warn!("Private key components unparsable - account file corrupt?");
            return None;
        },
    };

    match pair.private_key() {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("Private key rejected by OpenSSL: {}", e);
            None
        },
    }
}

#[cfg(test)]
mod test {
    use openssl::rsa::Padding;

    use super::*;

    fn test_config() -> KeyGenConfig {
        KeyGenConfig {
            rsa_bits: 1024,
            ..KeyGenConfig::default()
        }
    }

    fn props_of(pair: &AsymmetricKeyPair) -> Properties {
        let mut props = Properties::default();
        for (k, v) in pair.to_properties().iter() {
            props.set(k, v.clone()).unwrap();
        }
        props
    }

    #[test]
    fn generated_keys_survive_storage() {
        let pair = AsymmetricKeyPair::generate(&test_config()).unwrap();
        assert_eq!(1024, pair.bits());

        let props = props_of(&pair);
        assert_eq!(Some("h"), props.get(PROP_PUBEXPONENT));

        let loaded = AsymmetricKeyPair::from_properties(&props)
            .unwrap()
            .unwrap();
        let public = loaded.public_key().unwrap();
        let private = private_key_from_properties(&props, 17).unwrap();

        let plaintext = b"rendezvous at the mailsite";
        let mut ciphertext = vec![0u8; public.size() as usize];
        let clen = public
            .public_encrypt(plaintext, &mut ciphertext, Padding::PKCS1_OAEP)
            .unwrap();
        let mut decrypted = vec![0u8; private.size() as usize];
        let dlen = private
            .private_decrypt(
                &ciphertext[..clen],
                &mut decrypted,
                Padding::PKCS1_OAEP,
            )
            .unwrap();
        assert_eq!(&plaintext[..], &decrypted[..dlen]);
    }

    #[test]
    fn partial_key_pair_is_corrupt() {
        let pair = AsymmetricKeyPair::generate(&test_config()).unwrap();
        let mut props = props_of(&pair);
        props.remove(PROP_PRIVEXPONENT);

        assert_matches!(
            Err(Error::CorruptAccount(_)),
            AsymmetricKeyPair::from_properties(&props).map(|_| ())
        );
        assert!(private_key_from_properties(&props, 17).is_none());

        assert!(AsymmetricKeyPair::from_properties(&Properties::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_public_exponent_assumes_default() {
        let pair = AsymmetricKeyPair::generate(&test_config()).unwrap();
        let mut props = props_of(&pair);
        props.remove(PROP_PUBEXPONENT);
        assert!(private_key_from_properties(&props, 17).is_some());
    }

    #[test]
    fn garbage_components_are_corrupt() {
        let mut props = Properties::default();
        props.set(PROP_MODULUS, "not a number").unwrap();
        props.set(PROP_PUBEXPONENT, "h").unwrap();
        props.set(PROP_PRIVEXPONENT, "zzz").unwrap();
        assert_matches!(
            Err(Error::CorruptAccount(_)),
            AsymmetricKeyPair::from_properties(&props).map(|_| ())
        );
        assert!(private_key_from_properties(&props, 17).is_none());
    }
}
