//! # Protocol Bridge
//!
//! Wire-format translation core for a proxy sitting between modern game
//! clients and legacy game servers.
//!
//! The bridge deciphers legacy frame headers, decodes each frame into a
//! canonical message, and re-encodes it in the other generation's layout.
//! Identifiers are widened from 64 to 128 bits (and narrowed back),
//! enumeration codes are remapped, and packed calendar times are carried
//! through unchanged or shifted between realm and server clocks.
//!
//! ## Layout
//! - [`core`]: frame layouts, tokio codecs and body cursors
//! - [`crypto`]: the legacy header stream ciphers
//! - [`time`]: packed calendar time, time units and clocks
//! - [`identity`]: identifiers and cross-generation enumerations
//! - [`protocol`]: opcodes, handlers, encoders and the connection pipeline
//! - [`transport`]: async relay over tokio streams
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging and metrics
//!
//! ## Example
//! ```rust,no_run
//! use protocol_bridge::config::BridgeConfig;
//! use protocol_bridge::crypto::{keyed_cipher, SessionKey};
//! use protocol_bridge::protocol::{BridgeContext, Connection, Dispatcher};
//! use std::sync::Arc;
//!
//! # fn main() -> protocol_bridge::error::Result<()> {
//! let config = BridgeConfig::from_file("bridge.toml")?;
//! let bridge = Arc::new(BridgeContext::from_config(&config)?);
//! let dispatcher = Arc::new(Dispatcher::standard()?);
//!
//! let key = SessionKey::new(vec![0x11; 40])?;
//! let cipher = keyed_cipher(bridge.legacy().cipher_kind(), &key)?;
//! let mut connection = Connection::new(bridge, dispatcher, cipher)?;
//!
//! let mut to_client = bytes::BytesMut::new();
//! connection.from_server(&[], &mut to_client)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod time;
pub mod transport;
pub mod utils;
