//! Sequential readers and writers over frame bodies.
//!
//! All integers are little-endian. Reads never run past the body: a short
//! body is reported as [`BridgeError::FramingCorruption`] with the opcode,
//! the declared body length and the offset the read would have needed.
//!
//! Two packed identifier encodings are supported:
//!
//! ```text
//! legacy 64-bit:   [mask(1)] [byte i of guid for each set bit i]
//! modern 128-bit:  [low mask(1)] [high mask(1)] [low bytes] [high bytes]
//! ```

use crate::error::{BridgeError, Result};
use crate::identity::guid::{NarrowGuid, WideGuid};
use crate::time::PackedTime;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Cursor over one decrypted frame body.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    opcode: u32,
    declared: usize,
    buf: &'a [u8],
    bit_pos: u8,
    bit_value: u8,
}

impl<'a> PacketReader<'a> {
    pub fn new(opcode: u32, body: &'a [u8]) -> Self {
        Self {
            opcode,
            declared: body.len(),
            buf: body,
            bit_pos: 8,
            bit_value: 0,
        }
    }

    /// Opcode of the frame being read, for diagnostics.
    pub fn opcode(&self) -> u32 {
        self.opcode
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.declared - self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    fn ensure(&self, len: usize) -> Result<()> {
        if self.buf.len() < len {
            return Err(BridgeError::FramingCorruption {
                opcode: self.opcode,
                declared: self.declared,
                requested: self.position() + len,
            });
        }
        Ok(())
    }

    fn reset_bits(&mut self) {
        self.bit_pos = 8;
        self.bit_value = 0;
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        self.reset_bits();
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        self.reset_bits();
        Ok(self.buf.get_i8())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        self.reset_bits();
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        self.reset_bits();
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        self.reset_bits();
        Ok(self.buf.get_i32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        self.reset_bits();
        Ok(self.buf.get_u64_le())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        self.reset_bits();
        Ok(self.buf.get_i64_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        self.reset_bits();
        Ok(self.buf.get_f32_le())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        self.reset_bits();
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read one bit, most significant first.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.bit_pos == 8 {
            self.ensure(1)?;
            self.bit_value = self.buf.get_u8();
            self.bit_pos = 0;
        }
        let bit = (self.bit_value >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Read `count` bits (at most 32) into the low bits of a `u32`.
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..count.min(32) {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Unpacked 64-bit identifier.
    pub fn read_guid64(&mut self) -> Result<NarrowGuid> {
        Ok(NarrowGuid::new(self.read_u64()?))
    }

    /// Mask-compressed 64-bit identifier.
    pub fn read_packed_guid64(&mut self) -> Result<NarrowGuid> {
        let mask = self.read_u8()?;
        Ok(NarrowGuid::new(self.read_masked_u64(mask)?))
    }

    /// Mask-compressed 128-bit identifier.
    pub fn read_packed_guid128(&mut self) -> Result<WideGuid> {
        let low_mask = self.read_u8()?;
        let high_mask = self.read_u8()?;
        let low = self.read_masked_u64(low_mask)?;
        let high = self.read_masked_u64(high_mask)?;
        Ok(WideGuid::from_parts(low, high))
    }

    /// 32-bit packed calendar time.
    pub fn read_packed_time(&mut self) -> Result<PackedTime> {
        PackedTime::from_raw(self.read_i32()?)
    }

    fn read_masked_u64(&mut self, mask: u8) -> Result<u64> {
        let needed = mask.count_ones() as usize;
        self.ensure(needed)?;

        let mut value = 0u64;
        for shift in 0..8 {
            if mask & (1 << shift) != 0 {
                value |= u64::from(self.buf.get_u8()) << (shift * 8);
            }
        }
        Ok(value)
    }
}

/// Growable body builder.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
    bit_pos: u8,
    bit_value: u8,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Bytes written, counting a partially filled bit byte.
    pub fn len(&self) -> usize {
        self.buf.len() + usize::from(self.bit_pos > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_u8(&mut self, value: u8) {
        self.flush_bits();
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.flush_bits();
        self.buf.put_i8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.flush_bits();
        self.buf.put_u16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.flush_bits();
        self.buf.put_u32_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.flush_bits();
        self.buf.put_i32_le(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.flush_bits();
        self.buf.put_u64_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.flush_bits();
        self.buf.put_i64_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.flush_bits();
        self.buf.put_f32_le(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.flush_bits();
        self.buf.put_slice(bytes);
    }

    /// Append one bit, most significant first.
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.bit_value |= 1 << (7 - self.bit_pos);
        }
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.buf.put_u8(self.bit_value);
            self.bit_pos = 0;
            self.bit_value = 0;
        }
    }

    /// Append the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        for shift in (0..count.min(32)).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Pad a partially written bit byte with zeros.
    pub fn flush_bits(&mut self) {
        if self.bit_pos == 0 {
            return;
        }
        self.buf.put_u8(self.bit_value);
        self.bit_pos = 0;
        self.bit_value = 0;
    }

    pub fn write_guid64(&mut self, guid: NarrowGuid) {
        self.write_u64(guid.raw());
    }

    pub fn write_packed_guid64(&mut self, guid: NarrowGuid) {
        let raw = guid.raw();
        let mask = masked_bytes(raw);
        self.write_u8(mask);
        self.put_masked(raw, mask);
    }

    pub fn write_packed_guid128(&mut self, guid: WideGuid) {
        let low_mask = masked_bytes(guid.low());
        let high_mask = masked_bytes(guid.high());
        self.write_u8(low_mask);
        self.write_u8(high_mask);
        self.put_masked(guid.low(), low_mask);
        self.put_masked(guid.high(), high_mask);
    }

    pub fn write_packed_time(&mut self, time: PackedTime) {
        self.write_i32(time.raw());
    }

    fn put_masked(&mut self, value: u64, mask: u8) {
        for shift in 0..8 {
            if mask & (1 << shift) != 0 {
                self.buf.put_u8((value >> (shift * 8)) as u8);
            }
        }
    }

    /// Finish the body, flushing any pending bits.
    pub fn into_bytes(mut self) -> Bytes {
        self.flush_bits();
        self.buf.freeze()
    }
}

fn masked_bytes(value: u64) -> u8 {
    let mut mask = 0u8;
    for shift in 0..8 {
        if (value >> (shift * 8)) & 0xFF != 0 {
            mask |= 1 << shift;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end_is_framing_corruption() {
        let body = [1u8, 2, 3];
        let mut reader = PacketReader::new(0x47D, &body);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);

        let err = reader.read_u32().unwrap_err();
        match err {
            BridgeError::FramingCorruption {
                opcode,
                declared,
                requested,
            } => {
                assert_eq!(opcode, 0x47D);
                assert_eq!(declared, 3);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(reader.read_u8().is_ok());
    }

    #[test]
    fn test_packed_guid64_layout() {
        let guid = NarrowGuid::new(0xF130_0000_0000_1234);
        let mut writer = PacketWriter::new();
        writer.write_packed_guid64(guid);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..], &[0b1100_0011, 0x34, 0x12, 0x30, 0xF1]);

        let mut reader = PacketReader::new(0, &bytes);
        assert_eq!(reader.read_packed_guid64().unwrap(), guid);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_empty_packed_guid128_is_two_zero_masks() {
        let mut writer = PacketWriter::new();
        writer.write_packed_guid128(WideGuid::EMPTY);
        assert_eq!(&writer.into_bytes()[..], &[0, 0]);
    }

    #[test]
    fn test_packed_guid128_reads_back() {
        let guid = WideGuid::from_parts(0x0000_0000_00AB_0001, 0x0800_0400_0000_0000);
        let mut writer = PacketWriter::new();
        writer.write_packed_guid128(guid);
        let bytes = writer.into_bytes();

        let mut reader = PacketReader::new(0, &bytes);
        assert_eq!(reader.read_packed_guid128().unwrap(), guid);
    }

    #[test]
    fn test_truncated_packed_guid_reports_corruption() {
        // Mask promises three bytes, body carries one.
        let body = [0b0000_0111u8, 0x01];
        let mut reader = PacketReader::new(0x2AA, &body);
        assert!(matches!(
            reader.read_packed_guid64(),
            Err(BridgeError::FramingCorruption { requested: 4, .. })
        ));
    }

    #[test]
    fn test_bits_are_msb_first_and_flushed_by_bytes() {
        let mut writer = PacketWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b01, 2);
        writer.write_u8(0xFF);
        writer.write_bit(true);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..], &[0b1010_0000, 0xFF, 0b1000_0000]);

        let mut reader = PacketReader::new(0, &bytes);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(2).unwrap(), 0b01);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert!(reader.read_bit().unwrap());
    }

    #[test]
    fn test_len_counts_partial_bit_byte() {
        let mut writer = PacketWriter::new();
        assert!(writer.is_empty());
        writer.write_bit(false);
        assert_eq!(writer.len(), 1);
        writer.flush_bits();
        assert_eq!(writer.len(), 1);
    }
}
