//! # Error Types
//!
//! Error handling for the translation core.
//!
//! Every failure the bridge can report is a [`BridgeError`]. Variants fall
//! into three classes that decide what happens to the connection:
//!
//! ## Error Classes
//! - **Recoverable**: a value was rejected at construction time (packed time
//!   field out of range, identifier not representable). The caller supplies
//!   a different value or a fallback.
//! - **Message dropped**: one message could not be translated (unmapped
//!   enumeration code, unknown layout). The message is logged and discarded,
//!   the connection survives.
//! - **Fatal**: the byte stream can no longer be trusted to contain message
//!   boundaries. The connection is closed; other connections are unaffected.
//!
//! ## Example Usage
//! ```rust
//! use protocol_bridge::error::{BridgeError, ErrorClass};
//!
//! let err = BridgeError::FramingCorruption { opcode: 0x0AA, declared: 8, requested: 12 };
//! assert!(err.is_fatal());
//! assert_eq!(err.class(), ErrorClass::Fatal);
//! ```

use crate::protocol::generation::Generation;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Configuration errors
    pub const ERR_CONFIG_READ: &str = "Failed to read config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
    pub const ERR_CONFIG_SERIALIZE: &str = "Failed to serialize config";
    pub const ERR_CONFIG_WRITE: &str = "Failed to write config file";

    /// Identifier errors
    pub const ERR_KIND_NOT_IN_GENERATION: &str = "identifier kind has no legacy counterpart";
    pub const ERR_COUNTER_TOO_WIDE: &str = "identifier counter exceeds legacy width";
    pub const ERR_ENTRY_TOO_WIDE: &str = "identifier entry exceeds legacy width";

    /// Translation errors
    pub const ERR_NO_LAYOUT: &str = "no layout in destination generation";
    pub const ERR_PET_TALENTS: &str = "pet talents are not translated";
    pub const ERR_UNSUPPORTED_BLOCK: &str = "update block carries object fields";

    /// Connection errors
    pub const ERR_CIPHER_NOT_READY: &str = "server cipher has not been keyed";
    pub const ERR_CIPHER_MISMATCH: &str = "server cipher variant does not match legacy generation";
}

/// Coarse classification of a [`BridgeError`] deciding the connection's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected value; the caller recovers locally.
    Recoverable,
    /// The current message is discarded; the connection continues.
    MessageDropped,
    /// The connection must be closed.
    Fatal,
}

// BridgeError is the primary error type for all translation operations
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("value {value} out of range for {field}")]
    Range { field: &'static str, value: i64 },

    #[error("unknown {table} code {code:#x} for {generation}")]
    UnknownCode {
        table: &'static str,
        generation: Generation,
        code: u32,
    },

    #[error("{table} value {canonical} has no native code in {generation}")]
    NoNativeCode {
        table: &'static str,
        generation: Generation,
        canonical: &'static str,
    },

    #[error("identifier not representable in narrow form: {reason}")]
    DataLoss { reason: &'static str },

    #[error("framing corrupted in opcode {opcode:#x}: body is {declared} bytes, handler requested {requested}")]
    FramingCorruption {
        opcode: u32,
        declared: usize,
        requested: usize,
    },

    #[error("frame body too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("{0}: {1}")]
    NoLayout(&'static str, &'static str),

    #[error("stream cipher already initialized")]
    CipherAlreadyInitialized,

    #[error("invalid session key length: {0} bytes")]
    InvalidSessionKey(usize),

    #[error("unsupported generation for this operation: {0}")]
    UnsupportedGeneration(Generation),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Classify this error by its effect on the connection.
    pub fn class(&self) -> ErrorClass {
        match self {
            BridgeError::FramingCorruption { .. }
            | BridgeError::OversizedFrame(_)
            | BridgeError::Io(_) => ErrorClass::Fatal,
            BridgeError::UnknownCode { .. }
            | BridgeError::NoNativeCode { .. }
            | BridgeError::NoLayout(..)
            | BridgeError::UnsupportedGeneration(_) => ErrorClass::MessageDropped,
            BridgeError::Range { .. }
            | BridgeError::DataLoss { .. }
            | BridgeError::CipherAlreadyInitialized
            | BridgeError::InvalidSessionKey(_)
            | BridgeError::Config(_) => ErrorClass::Recoverable,
        }
    }

    /// True if the connection carrying this error must be closed.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    pub(crate) fn range(field: &'static str, value: impl Into<i64>) -> Self {
        BridgeError::Range {
            field,
            value: value.into(),
        }
    }
}

/// Type alias for Results using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_framing_and_io_are_fatal() {
        let fatal = [
            BridgeError::FramingCorruption {
                opcode: 1,
                declared: 0,
                requested: 4,
            },
            BridgeError::OversizedFrame(1 << 20),
            BridgeError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
        ];
        for err in &fatal {
            assert!(err.is_fatal(), "{err} should be fatal");
        }

        let survivable = [
            BridgeError::range("year", 2031),
            BridgeError::UnknownCode {
                table: "object kind",
                generation: Generation::Wotlk,
                code: 0x42,
            },
            BridgeError::DataLoss {
                reason: constants::ERR_KIND_NOT_IN_GENERATION,
            },
        ];
        for err in &survivable {
            assert!(!err.is_fatal(), "{err} should not be fatal");
        }
    }

    #[test]
    fn test_unknown_code_message_carries_context() {
        let err = BridgeError::UnknownCode {
            table: "update kind",
            generation: Generation::Tbc,
            code: 9,
        };
        let text = err.to_string();
        assert!(text.contains("update kind"));
        assert!(text.contains("tbc"));
        assert!(text.contains("0x9"));
        assert_eq!(err.class(), ErrorClass::MessageDropped);
    }
}
