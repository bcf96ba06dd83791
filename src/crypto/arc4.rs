//! Dual ARC4 keystream cipher (variant C).
//!
//! Each direction owns an independent ARC4 generator keyed with
//! HMAC-SHA1(direction constant, session key). The first
//! [`DROP_LEN`] keystream bytes of each generator are discarded before any
//! data is processed. Unlike the feedback variants, the keystream covers the
//! whole buffer handed in.

use super::{hmac_sha1, CipherDirection, CipherKind, CipherStatus, SessionKey, StreamCipher};
use crate::error::{BridgeError, Result};
use rc4::consts::U20;
use rc4::{KeyInit, Rc4, StreamCipher as Keystream};
use tracing::debug;
use zeroize::Zeroize;

/// Keystream bytes discarded after keying.
pub const DROP_LEN: usize = 1024;

/// HMAC key for the generator that encrypts outbound bytes.
const ENCRYPTION_SEED: [u8; 16] = [
    0xC2, 0xB3, 0x72, 0x3C, 0xC6, 0xAE, 0xD9, 0xB5, 0x34, 0x3C, 0x53, 0xEE, 0x2F, 0x43, 0x67, 0xCE,
];

/// HMAC key for the generator that decrypts inbound bytes.
const DECRYPTION_SEED: [u8; 16] = [
    0xCC, 0x98, 0xAE, 0x04, 0xE8, 0x97, 0xEA, 0xCA, 0x12, 0xDD, 0xC0, 0x93, 0x42, 0x91, 0x53, 0x57,
];

type Generator = Rc4<U20>;

fn warmed_generator(seed: &[u8], key: &SessionKey) -> Result<Generator> {
    let mut derived = hmac_sha1(seed, key.as_bytes())?;
    let generator = <Generator as KeyInit>::new_from_slice(&derived)
        .map_err(|_| BridgeError::InvalidSessionKey(derived.len()));
    derived.zeroize();

    let mut generator = generator?;
    let mut discard = [0u8; DROP_LEN];
    generator.apply_keystream(&mut discard);
    Ok(generator)
}

/// Variant C cipher: one ARC4 generator per direction.
#[derive(Default)]
pub struct Arc4Cipher {
    decrypt: Option<Generator>,
    encrypt: Option<Generator>,
}

impl Arc4Cipher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamCipher for Arc4Cipher {
    fn kind(&self) -> CipherKind {
        CipherKind::Arc4Drop1024
    }

    fn initialize(&mut self, key: &SessionKey) -> Result<()> {
        if self.decrypt.is_some() || self.encrypt.is_some() {
            return Err(BridgeError::CipherAlreadyInitialized);
        }

        self.encrypt = Some(warmed_generator(&ENCRYPTION_SEED, key)?);
        self.decrypt = Some(warmed_generator(&DECRYPTION_SEED, key)?);

        debug!(drop_len = DROP_LEN, "ARC4 cipher initialized");
        Ok(())
    }

    fn decrypt(&mut self, data: &mut [u8]) {
        if let Some(generator) = self.decrypt.as_mut() {
            generator.apply_keystream(data);
        }
    }

    fn encrypt(&mut self, data: &mut [u8]) {
        if let Some(generator) = self.encrypt.as_mut() {
            generator.apply_keystream(data);
        }
    }

    fn status(&self) -> CipherStatus {
        if self.decrypt.is_some() {
            CipherStatus::Ready
        } else {
            CipherStatus::Uninitialized
        }
    }

    fn into_halves(self: Box<Self>) -> (Box<dyn CipherDirection>, Box<dyn CipherDirection>) {
        let Arc4Cipher { decrypt, encrypt } = *self;
        (
            Box::new(Arc4Half(decrypt)),
            Box::new(Arc4Half(encrypt)),
        )
    }
}

struct Arc4Half(Option<Generator>);

impl CipherDirection for Arc4Half {
    fn apply(&mut self, data: &mut [u8]) {
        if let Some(generator) = self.0.as_mut() {
            generator.apply_keystream(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SessionKey {
        SessionKey::new((0u8..20).collect::<Vec<_>>()).unwrap()
    }

    // The peer's encrypt generator is keyed like our decrypt generator, so a
    // round trip pairs our encrypt with a generator built from the same seed.
    fn peer_decryptor() -> Generator {
        warmed_generator(&ENCRYPTION_SEED, &key()).unwrap()
    }

    #[test]
    fn test_uninitialized_is_noop() {
        let mut cipher = Arc4Cipher::new();
        let mut data = [0x42u8; 32];
        cipher.encrypt(&mut data);
        cipher.decrypt(&mut data);
        assert_eq!(data, [0x42u8; 32]);
        assert_eq!(cipher.status(), CipherStatus::Uninitialized);
    }

    #[test]
    fn test_round_trip_for_assorted_lengths() {
        for len in [0usize, 1, 2048] {
            let mut cipher = Arc4Cipher::new();
            cipher.initialize(&key()).unwrap();
            let mut peer = peer_decryptor();

            let plain: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut data = plain.clone();
            cipher.encrypt(&mut data);
            if len > 0 {
                assert_ne!(data, plain, "length {len} was not enciphered");
            }
            peer.apply_keystream(&mut data);
            assert_eq!(data, plain, "length {len} did not round trip");
        }
    }

    #[test]
    fn test_keystream_is_warmed_up() {
        let mut cipher = Arc4Cipher::new();
        cipher.initialize(&key()).unwrap();

        let mut warmed = [0u8; 16];
        cipher.encrypt(&mut warmed);

        let mut cold = <Generator as KeyInit>::new_from_slice(
            &hmac_sha1(&ENCRYPTION_SEED, key().as_bytes()).unwrap(),
        )
        .unwrap();
        let mut unwarmed = [0u8; 16];
        cold.apply_keystream(&mut unwarmed);

        assert_ne!(warmed, unwarmed);

        // Encrypting zeros exposes the keystream; it must not be the derived key.
        let derived = hmac_sha1(&ENCRYPTION_SEED, key().as_bytes()).unwrap();
        assert_ne!(&warmed[..], &derived[..16]);
    }

    #[test]
    fn test_directions_use_distinct_keys() {
        let mut cipher = Arc4Cipher::new();
        cipher.initialize(&key()).unwrap();

        let mut sent = [0u8; 16];
        let mut received = [0u8; 16];
        cipher.encrypt(&mut sent);
        cipher.decrypt(&mut received);
        assert_ne!(sent, received);
    }

    #[test]
    fn test_reinitialize_rejected() {
        let mut cipher = Arc4Cipher::new();
        cipher.initialize(&key()).unwrap();
        assert!(matches!(
            cipher.initialize(&key()),
            Err(BridgeError::CipherAlreadyInitialized)
        ));
    }

    #[test]
    fn test_sub_range_ciphering_matches_whole_buffer() {
        let mut whole = Arc4Cipher::new();
        whole.initialize(&key()).unwrap();
        let mut split = Arc4Cipher::new();
        split.initialize(&key()).unwrap();

        let mut a = [7u8; 64];
        whole.decrypt(&mut a);

        let mut b = [7u8; 64];
        split.decrypt(&mut b[..10]);
        split.decrypt(&mut b[10..]);
        assert_eq!(a, b);
    }
}
