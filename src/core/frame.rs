//! Frame header layout shared by every generation.
//!
//! ```text
//! [Length(2|4)] [Opcode(2|4)] [Body(Length)]
//! ```
//!
//! Opcodes are always little-endian; the length's byte order is a property
//! of the layout (legacy servers use big-endian lengths).

use crate::error::{BridgeError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Byte order of the length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Big,
    Little,
}

/// Widths and conventions of one direction's frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    /// Width of the length field in bytes (2 or 4)
    pub length_width: u8,

    /// Width of the opcode field in bytes (2 or 4)
    pub opcode_width: u8,

    /// Byte order of the length field
    pub length_order: ByteOrder,

    /// Whether the declared length counts the opcode bytes as well as the body
    #[serde(default)]
    pub length_covers_opcode: bool,
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: u32,
    pub body_len: usize,
}

/// One complete, decrypted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u32,
    pub body: Bytes,
}

impl Frame {
    pub fn new(opcode: u32, body: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            body: body.into(),
        }
    }
}

impl FrameLayout {
    /// Total header size in bytes.
    #[inline]
    pub fn header_len(&self) -> usize {
        usize::from(self.length_width) + usize::from(self.opcode_width)
    }

    /// Largest body this layout can declare.
    pub fn max_body_len(&self) -> usize {
        let max_length = match self.length_width {
            2 => usize::from(u16::MAX),
            _ => u32::MAX as usize,
        };
        if self.length_covers_opcode {
            max_length - usize::from(self.opcode_width)
        } else {
            max_length
        }
    }

    /// Validate field widths, returning a list of problems.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !matches!(self.length_width, 2 | 4) {
            errors.push(format!(
                "Invalid length width: {} (valid: 2 or 4)",
                self.length_width
            ));
        }

        if !matches!(self.opcode_width, 2 | 4) {
            errors.push(format!(
                "Invalid opcode width: {} (valid: 2 or 4)",
                self.opcode_width
            ));
        }

        errors
    }

    /// Decode a plaintext header. `header` must hold exactly `header_len()` bytes.
    pub fn decode_header(&self, mut header: &[u8]) -> Result<FrameHeader> {
        let declared = match (self.length_width, self.length_order) {
            (2, ByteOrder::Big) => usize::from(header.get_u16()),
            (2, ByteOrder::Little) => usize::from(header.get_u16_le()),
            (_, ByteOrder::Big) => header.get_u32() as usize,
            (_, ByteOrder::Little) => header.get_u32_le() as usize,
        };

        let opcode = match self.opcode_width {
            2 => u32::from(header.get_u16_le()),
            _ => header.get_u32_le(),
        };

        let body_len = if self.length_covers_opcode {
            declared
                .checked_sub(usize::from(self.opcode_width))
                .ok_or(BridgeError::FramingCorruption {
                    opcode,
                    declared,
                    requested: usize::from(self.opcode_width),
                })?
        } else {
            declared
        };

        Ok(FrameHeader { opcode, body_len })
    }

    /// Append a plaintext header for `header` to `dst`.
    pub fn encode_header(&self, header: &FrameHeader, dst: &mut BytesMut) -> Result<()> {
        if header.body_len > self.max_body_len() {
            return Err(BridgeError::OversizedFrame(header.body_len));
        }

        let declared = if self.length_covers_opcode {
            header.body_len + usize::from(self.opcode_width)
        } else {
            header.body_len
        };

        match (self.length_width, self.length_order) {
            (2, ByteOrder::Big) => dst.put_u16(declared as u16),
            (2, ByteOrder::Little) => dst.put_u16_le(declared as u16),
            (_, ByteOrder::Big) => dst.put_u32(declared as u32),
            (_, ByteOrder::Little) => dst.put_u32_le(declared as u32),
        }

        match self.opcode_width {
            2 => {
                let opcode = u16::try_from(header.opcode)
                    .map_err(|_| BridgeError::range("opcode", i64::from(header.opcode)))?;
                dst.put_u16_le(opcode);
            }
            _ => dst.put_u32_le(header.opcode),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_INBOUND: FrameLayout = FrameLayout {
        length_width: 2,
        opcode_width: 2,
        length_order: ByteOrder::Big,
        length_covers_opcode: false,
    };

    #[test]
    fn test_legacy_header_byte_order() {
        let mut buf = BytesMut::new();
        LEGACY_INBOUND
            .encode_header(
                &FrameHeader {
                    opcode: 0x00AA,
                    body_len: 8,
                },
                &mut buf,
            )
            .unwrap();
        assert_eq!(&buf[..], &[0x00, 0x08, 0xAA, 0x00]);

        let header = LEGACY_INBOUND.decode_header(&buf).unwrap();
        assert_eq!(header.opcode, 0xAA);
        assert_eq!(header.body_len, 8);
    }

    #[test]
    fn test_length_covering_opcode_is_subtracted() {
        let layout = FrameLayout {
            length_covers_opcode: true,
            ..LEGACY_INBOUND
        };
        let header = layout.decode_header(&[0x00, 0x0A, 0x01, 0x00]).unwrap();
        assert_eq!(header.body_len, 8);

        let short = layout.decode_header(&[0x00, 0x01, 0x01, 0x00]);
        assert!(matches!(
            short,
            Err(BridgeError::FramingCorruption { declared: 1, .. })
        ));
    }

    #[test]
    fn test_narrow_opcode_field_rejects_wide_opcode() {
        let mut buf = BytesMut::new();
        let result = LEGACY_INBOUND.encode_header(
            &FrameHeader {
                opcode: 0x1_0000,
                body_len: 0,
            },
            &mut buf,
        );
        assert!(matches!(result, Err(BridgeError::Range { field: "opcode", .. })));
    }

    #[test]
    fn test_body_larger_than_length_field_rejected() {
        let mut buf = BytesMut::new();
        let result = LEGACY_INBOUND.encode_header(
            &FrameHeader {
                opcode: 1,
                body_len: 70_000,
            },
            &mut buf,
        );
        assert!(matches!(result, Err(BridgeError::OversizedFrame(70_000))));
    }

    #[test]
    fn test_invalid_widths_reported() {
        let layout = FrameLayout {
            length_width: 3,
            opcode_width: 1,
            ..LEGACY_INBOUND
        };
        assert_eq!(layout.validate().len(), 2);
        assert!(LEGACY_INBOUND.validate().is_empty());
    }
}
