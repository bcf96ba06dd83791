//! Feedback header ciphers (variants A and B).
//!
//! Only a fixed prefix of each message is transformed: the first
//! [`CRYPTED_RECV_LEN`] bytes of every received message and the first
//! [`CRYPTED_SEND_LEN`] bytes of every sent one. The asymmetry mirrors the
//! header sizes of the two directions and must not be evened out.
//!
//! ```text
//! decrypt: plain[t]  = (cipher[t] - feedback) ^ key[index]; feedback = cipher[t]
//! encrypt: cipher[t] = (plain[t] ^ key[index]) + feedback;  feedback = cipher[t]
//! ```

use super::{hmac_sha1, CipherDirection, CipherKind, CipherStatus, SessionKey, StreamCipher};
use crate::error::{BridgeError, Result};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Bytes enciphered at the start of every outbound message.
pub const CRYPTED_SEND_LEN: usize = 6;

/// Bytes deciphered at the start of every inbound message.
pub const CRYPTED_RECV_LEN: usize = 4;

/// HMAC key used to derive the variant B keytable.
const DERIVATION_SEED: [u8; 16] = [
    0x38, 0xA7, 0x83, 0x15, 0xF8, 0x92, 0x25, 0x30, 0x71, 0x98, 0x67, 0xB1, 0x8C, 0x04, 0xE2, 0xAA,
];

type Keytable = Arc<Zeroizing<Vec<u8>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySchedule {
    Raw,
    Hmac,
}

#[derive(Debug, Default, Clone, Copy)]
struct FeedbackState {
    index: usize,
    feedback: u8,
}

impl FeedbackState {
    fn decrypt(&mut self, table: &[u8], data: &mut [u8]) {
        if data.len() < CRYPTED_RECV_LEN {
            return;
        }

        for byte in &mut data[..CRYPTED_RECV_LEN] {
            let index = self.index % table.len();
            let cipher = *byte;
            *byte = cipher.wrapping_sub(self.feedback) ^ table[index];
            self.index = index + 1;
            self.feedback = cipher;
        }
    }

    fn encrypt(&mut self, table: &[u8], data: &mut [u8]) {
        if data.len() < CRYPTED_SEND_LEN {
            return;
        }

        for byte in &mut data[..CRYPTED_SEND_LEN] {
            let index = self.index % table.len();
            let cipher = (*byte ^ table[index]).wrapping_add(self.feedback);
            *byte = cipher;
            self.index = index + 1;
            self.feedback = cipher;
        }
    }
}

/// Rolling index/feedback cipher over a fixed keytable.
pub struct FeedbackCipher {
    schedule: KeySchedule,
    table: Option<Keytable>,
    recv: FeedbackState,
    send: FeedbackState,
}

impl FeedbackCipher {
    /// Variant A: the session key bytes are the keytable.
    pub fn raw_key() -> Self {
        Self::with_schedule(KeySchedule::Raw)
    }

    /// Variant B: the keytable is HMAC-SHA1(seed, session key).
    pub fn hmac_key() -> Self {
        Self::with_schedule(KeySchedule::Hmac)
    }

    fn with_schedule(schedule: KeySchedule) -> Self {
        Self {
            schedule,
            table: None,
            recv: FeedbackState::default(),
            send: FeedbackState::default(),
        }
    }

    /// Length of the active keytable, if keyed.
    pub fn keytable_len(&self) -> Option<usize> {
        self.table.as_ref().map(|table| table.len())
    }
}

impl StreamCipher for FeedbackCipher {
    fn kind(&self) -> CipherKind {
        match self.schedule {
            KeySchedule::Raw => CipherKind::RawKeyFeedback,
            KeySchedule::Hmac => CipherKind::HmacFeedback,
        }
    }

    fn initialize(&mut self, key: &SessionKey) -> Result<()> {
        if self.table.is_some() {
            return Err(BridgeError::CipherAlreadyInitialized);
        }
        if key.is_empty() {
            return Err(BridgeError::InvalidSessionKey(0));
        }

        let table = match self.schedule {
            KeySchedule::Raw => key.as_bytes().to_vec(),
            KeySchedule::Hmac => hmac_sha1(&DERIVATION_SEED, key.as_bytes())?.to_vec(),
        };

        debug!(kind = ?self.kind(), keytable_len = table.len(), "Feedback cipher initialized");

        self.table = Some(Arc::new(Zeroizing::new(table)));
        self.recv = FeedbackState::default();
        self.send = FeedbackState::default();
        Ok(())
    }

    fn decrypt(&mut self, data: &mut [u8]) {
        if let Some(table) = &self.table {
            self.recv.decrypt(table, data);
        }
    }

    fn encrypt(&mut self, data: &mut [u8]) {
        if let Some(table) = &self.table {
            self.send.encrypt(table, data);
        }
    }

    fn status(&self) -> CipherStatus {
        if self.table.is_some() {
            CipherStatus::Ready
        } else {
            CipherStatus::Uninitialized
        }
    }

    fn into_halves(self: Box<Self>) -> (Box<dyn CipherDirection>, Box<dyn CipherDirection>) {
        let recv = FeedbackHalf {
            table: self.table.clone(),
            state: self.recv,
            direction: HalfDirection::Decrypt,
        };
        let send = FeedbackHalf {
            table: self.table,
            state: self.send,
            direction: HalfDirection::Encrypt,
        };
        (Box::new(recv), Box::new(send))
    }
}

#[derive(Clone, Copy)]
enum HalfDirection {
    Decrypt,
    Encrypt,
}

struct FeedbackHalf {
    table: Option<Keytable>,
    state: FeedbackState,
    direction: HalfDirection,
}

impl CipherDirection for FeedbackHalf {
    fn apply(&mut self, data: &mut [u8]) {
        let Some(table) = &self.table else {
            return;
        };
        match self.direction {
            HalfDirection::Decrypt => self.state.decrypt(table, data),
            HalfDirection::Encrypt => self.state.encrypt(table, data),
        }
    }
}
