//! # Protocol Generations
//!
//! Every historical wire protocol the bridge speaks is a [`Generation`].
//! A generation fixes the frame layout, the opcode numbering, the stream
//! cipher variant and the numeric codes of every cross-generation
//! enumeration.
//!
//! ## Legacy generations (server side)
//! - **Vanilla**: raw-key feedback cipher (variant A)
//! - **Tbc**: HMAC-derived feedback cipher (variant B)
//! - **Wotlk**: dual ARC4 keystream cipher (variant C)
//!
//! ## Modern generations (client side)
//! - **ClassicEra**, **ClassicBcc**, **ClassicWotlk**: wide identifiers,
//!   bit-packed layouts, no stream cipher at this layer

use crate::core::frame::{ByteOrder, FrameLayout};
use crate::crypto::CipherKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Traffic direction relative to the legacy server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bytes travelling from the server towards the client.
    ServerToClient,
    /// Bytes travelling from the client towards the server.
    ClientToServer,
}

/// A historical version of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    Vanilla,
    Tbc,
    Wotlk,
    ClassicEra,
    ClassicBcc,
    ClassicWotlk,
}

impl Generation {
    /// All supported generations, legacy first.
    pub const ALL: [Generation; 6] = [
        Generation::Vanilla,
        Generation::Tbc,
        Generation::Wotlk,
        Generation::ClassicEra,
        Generation::ClassicBcc,
        Generation::ClassicWotlk,
    ];

    /// Whether this generation uses narrow (64-bit) identifiers.
    pub fn is_legacy(self) -> bool {
        matches!(
            self,
            Generation::Vanilla | Generation::Tbc | Generation::Wotlk
        )
    }

    /// Stream cipher variant protecting this generation's frame headers.
    pub fn cipher_kind(self) -> CipherKind {
        match self {
            Generation::Vanilla => CipherKind::RawKeyFeedback,
            Generation::Tbc => CipherKind::HmacFeedback,
            Generation::Wotlk => CipherKind::Arc4Drop1024,
            Generation::ClassicEra | Generation::ClassicBcc | Generation::ClassicWotlk => {
                CipherKind::Plain
            }
        }
    }

    /// Built-in frame layout for traffic in `direction`.
    ///
    /// Legacy servers send a 2-byte length and 2-byte opcode (the 4 bytes
    /// covered by the receive cipher) and expect a 2-byte length and
    /// 4-byte opcode from clients (the 6 bytes covered by the send cipher).
    pub fn frame_layout(self, direction: Direction) -> FrameLayout {
        if self.is_legacy() {
            let opcode_width = match direction {
                Direction::ServerToClient => 2,
                Direction::ClientToServer => 4,
            };
            FrameLayout {
                length_width: 2,
                opcode_width,
                length_order: ByteOrder::Big,
                length_covers_opcode: false,
            }
        } else {
            FrameLayout {
                length_width: 4,
                opcode_width: 2,
                length_order: ByteOrder::Little,
                length_covers_opcode: false,
            }
        }
    }

    /// Short lowercase name used in logs and configuration.
    pub fn name(self) -> &'static str {
        match self {
            Generation::Vanilla => "vanilla",
            Generation::Tbc => "tbc",
            Generation::Wotlk => "wotlk",
            Generation::ClassicEra => "classic_era",
            Generation::ClassicBcc => "classic_bcc",
            Generation::ClassicWotlk => "classic_wotlk",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Generation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Generation::ALL
            .into_iter()
            .find(|generation| generation.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown protocol generation: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_header_widths_match_cipher_prefixes() {
        for generation in [Generation::Vanilla, Generation::Tbc, Generation::Wotlk] {
            let inbound = generation.frame_layout(Direction::ServerToClient);
            let outbound = generation.frame_layout(Direction::ClientToServer);
            assert_eq!(inbound.header_len(), 4);
            assert_eq!(outbound.header_len(), 6);
        }
    }

    #[test]
    fn test_generation_names_parse_back() {
        for generation in Generation::ALL {
            assert_eq!(generation.name().parse::<Generation>(), Ok(generation));
        }
        assert!("cataclysm".parse::<Generation>().is_err());
    }

    #[test]
    fn test_only_legacy_generations_have_stream_ciphers() {
        assert_eq!(Generation::Vanilla.cipher_kind(), CipherKind::RawKeyFeedback);
        assert_eq!(Generation::Tbc.cipher_kind(), CipherKind::HmacFeedback);
        assert_eq!(Generation::Wotlk.cipher_kind(), CipherKind::Arc4Drop1024);
        assert_eq!(Generation::ClassicWotlk.cipher_kind(), CipherKind::Plain);
    }
}
