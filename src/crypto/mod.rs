//! # Stream Ciphers
//!
//! Header obfuscation used by the legacy protocol generations.
//!
//! Every connection owns exactly one cipher, initialised once from the
//! session key negotiated during authentication. A cipher carries two
//! independent states, one per direction: receive state is advanced by
//! [`StreamCipher::decrypt`], send state by [`StreamCipher::encrypt`].
//!
//! ## Variants
//! - **RawKeyFeedback** (variant A): the session key is the keytable; the
//!   first 4 received and 6 sent bytes of each message are transformed
//!   through a rolling index and a feedback byte.
//! - **HmacFeedback** (variant B): as variant A, with the keytable derived
//!   by HMAC-SHA1 of the session key.
//! - **Arc4Drop1024** (variant C): two ARC4 keystreams keyed by HMAC-SHA1
//!   of the session key, each with its first 1024 bytes discarded.
//! - **Plain**: no transform (generations with no stream cipher at this layer).
//!
//! Ciphers tolerate short buffers: a buffer shorter than a variant's
//! prefix passes through unchanged. Re-initialising a cipher is rejected.
//!
//! The frame codecs need each direction's state in a different place, so an
//! initialised cipher can be split with [`StreamCipher::into_halves`].

pub mod arc4;
pub mod feedback;

use crate::error::{BridgeError, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use arc4::Arc4Cipher;
pub use feedback::FeedbackCipher;

type HmacSha1 = Hmac<Sha1>;

/// Length of an HMAC-SHA1 digest, and so of every derived keytable.
pub const DERIVED_KEY_LEN: usize = 20;

/// Accepted session key lengths in bytes.
pub const SESSION_KEY_LEN_RANGE: std::ops::RangeInclusive<usize> = 16..=40;

/// Selects one of the cipher variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    RawKeyFeedback,
    HmacFeedback,
    Arc4Drop1024,
    Plain,
}

/// Whether a cipher has been keyed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherStatus {
    Uninitialized,
    Ready,
}

/// Shared secret negotiated during authentication. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey(Vec<u8>);

impl SessionKey {
    /// Wrap raw key bytes, enforcing the accepted length range.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !SESSION_KEY_LEN_RANGE.contains(&bytes.len()) {
            return Err(BridgeError::InvalidSessionKey(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey({} bytes)", self.0.len())
    }
}

/// One direction's cipher state, detached from its counterpart.
pub trait CipherDirection: Send {
    /// Transform `data` in place, advancing this direction's state.
    fn apply(&mut self, data: &mut [u8]);
}

/// Symmetric header cipher for one connection.
pub trait StreamCipher: Send {
    /// Which variant this is.
    fn kind(&self) -> CipherKind;

    /// Key the cipher. Fails with [`BridgeError::CipherAlreadyInitialized`]
    /// on any call after the first successful one.
    fn initialize(&mut self, key: &SessionKey) -> Result<()>;

    /// Decrypt received bytes in place. Pass a sub-slice to cipher a sub-range.
    fn decrypt(&mut self, data: &mut [u8]);

    /// Encrypt bytes about to be sent, in place.
    fn encrypt(&mut self, data: &mut [u8]);

    fn status(&self) -> CipherStatus;

    /// Split into (receive, send) halves that keep advancing independently.
    fn into_halves(self: Box<Self>) -> (Box<dyn CipherDirection>, Box<dyn CipherDirection>);
}

/// Construct an uninitialised cipher of the given variant.
pub fn new_cipher(kind: CipherKind) -> Box<dyn StreamCipher> {
    match kind {
        CipherKind::RawKeyFeedback => Box::new(FeedbackCipher::raw_key()),
        CipherKind::HmacFeedback => Box::new(FeedbackCipher::hmac_key()),
        CipherKind::Arc4Drop1024 => Box::new(Arc4Cipher::new()),
        CipherKind::Plain => Box::new(PlainCipher::default()),
    }
}

/// Construct and key a cipher in one step.
pub fn keyed_cipher(kind: CipherKind, key: &SessionKey) -> Result<Box<dyn StreamCipher>> {
    let mut cipher = new_cipher(kind);
    cipher.initialize(key)?;
    Ok(cipher)
}

/// HMAC-SHA1 of `message` keyed by `seed`.
pub(crate) fn hmac_sha1(seed: &[u8], message: &[u8]) -> Result<[u8; DERIVED_KEY_LEN]> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(seed)
        .map_err(|_| BridgeError::InvalidSessionKey(seed.len()))?;
    mac.update(message);

    let mut digest = [0u8; DERIVED_KEY_LEN];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    Ok(digest)
}

/// Passthrough cipher.
#[derive(Debug, Default)]
pub struct PlainCipher {
    initialized: bool,
}

struct Passthrough;

impl CipherDirection for Passthrough {
    fn apply(&mut self, _data: &mut [u8]) {}
}

impl StreamCipher for PlainCipher {
    fn kind(&self) -> CipherKind {
        CipherKind::Plain
    }

    fn initialize(&mut self, _key: &SessionKey) -> Result<()> {
        if self.initialized {
            return Err(BridgeError::CipherAlreadyInitialized);
        }
        self.initialized = true;
        Ok(())
    }

    fn decrypt(&mut self, _data: &mut [u8]) {}

    fn encrypt(&mut self, _data: &mut [u8]) {}

    fn status(&self) -> CipherStatus {
        if self.initialized {
            CipherStatus::Ready
        } else {
            CipherStatus::Uninitialized
        }
    }

    fn into_halves(self: Box<Self>) -> (Box<dyn CipherDirection>, Box<dyn CipherDirection>) {
        (Box::new(Passthrough), Box::new(Passthrough))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_length_bounds() {
        assert!(SessionKey::new(vec![0u8; 15]).is_err());
        assert!(SessionKey::new(vec![0u8; 16]).is_ok());
        assert!(SessionKey::new(vec![0u8; 40]).is_ok());
        assert!(matches!(
            SessionKey::new(vec![0u8; 41]),
            Err(BridgeError::InvalidSessionKey(41))
        ));
    }

    #[test]
    fn test_session_key_debug_hides_bytes() {
        let key = SessionKey::new(vec![0xAB; 16]).unwrap();
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "SessionKey(16 bytes)");
    }

    #[test]
    fn test_hmac_sha1_rfc2202_case_2() {
        let digest = hmac_sha1(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            digest,
            [
                0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1,
                0x84, 0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79
            ]
        );
    }

    #[test]
    fn test_factory_produces_requested_variant() {
        for kind in [
            CipherKind::RawKeyFeedback,
            CipherKind::HmacFeedback,
            CipherKind::Arc4Drop1024,
            CipherKind::Plain,
        ] {
            let cipher = new_cipher(kind);
            assert_eq!(cipher.kind(), kind);
            assert_eq!(cipher.status(), CipherStatus::Uninitialized);
        }
    }

    #[test]
    fn test_plain_cipher_rejects_second_initialize() {
        let key = SessionKey::new(vec![1u8; 16]).unwrap();
        let mut cipher = PlainCipher::default();
        cipher.initialize(&key).unwrap();
        assert!(matches!(
            cipher.initialize(&key),
            Err(BridgeError::CipherAlreadyInitialized)
        ));
    }
}
