// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The buffer contract between field descriptors and the host protocol
//! object that owns packet memory.
//!
//! A protocol object implements the five required methods of
//! [`StructuredBuffer`] (typically by embedding a
//! [`pktfields_common::SpliceBuf`]); the byte-aligned integer, raw byte
//! and bit-level accessors that descriptors call are provided on top of
//! them. After any mutation that changes the buffer's length
//! ([`splice`](StructuredBuffer::splice)), the caller must invoke
//! [`finalize`](StructuredBuffer::finalize) before reading any
//! length-dependent field.

use crate::error::FieldError;
use crate::utils;

/// An ordered, mutable byte sequence representing one packet or header
/// plus trailer.
///
/// Field spans handed to the provided accessors must lie within the
/// buffer's allocated length; a span beyond it is a caller bug and
/// panics.
pub trait StructuredBuffer {
    /// The buffer's current content.
    fn as_bytes(&self) -> &[u8];

    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Replaces the half-open byte range `[start, end)` with
    /// `replacement`, shifting all subsequent content and the buffer's
    /// total length. Declared field offsets are static: a field placed
    /// after `end` observes shifted content, not a shifted offset.
    fn splice(&mut self, start: usize, end: usize, replacement: &[u8]);

    /// The current start and length of the trailing variable region.
    fn payload_offsets(&self) -> (usize, usize);

    /// Recomputes any length and checksum fields after structural edits.
    fn finalize(&mut self);

    /// Reads the byte-aligned span `[offset, offset + len)` as a
    /// big-endian unsigned integer.
    fn uint_field(&self, offset: usize, len: usize) -> u64 {
        utils::bytes_to_uint(self.byte_field(offset, len))
    }

    /// Writes `val` big-endian across the byte-aligned span, validating
    /// its width before touching the buffer.
    fn set_uint_field(&mut self, offset: usize, len: usize, val: u64) -> Result<(), FieldError> {
        let encoded = utils::uint_to_bytes(val, len)?;
        self.set_byte_field(offset, len, &encoded)
    }

    fn byte_field(&self, offset: usize, len: usize) -> &[u8] {
        self.as_bytes()
            .get(offset..offset + len)
            .expect("field span exceeds allocated buffer length")
    }

    /// Overwrites the span with `bytes`, which must match its width
    /// exactly.
    fn set_byte_field(&mut self, offset: usize, len: usize, bytes: &[u8]) -> Result<(), FieldError> {
        if bytes.len() != len {
            return Err(FieldError::malformed(
                "replacement length does not match field width",
            ));
        }
        self.as_bytes_mut()
            .get_mut(offset..offset + len)
            .expect("field span exceeds allocated buffer length")
            .copy_from_slice(bytes);
        Ok(())
    }

    /// Reads `bit_len` bits starting `bit_offset` bits past the byte at
    /// `offset`, MSB-first. `bit_offset` may exceed 7 to address
    /// subsequent bytes; the result carries no sign extension.
    fn bit_field(&self, offset: usize, bit_offset: usize, bit_len: usize) -> u64 {
        assert!(bit_len <= 64, "bit field wider than 64 bits");
        let (first_byte, last_byte, trailing) = bit_span(offset, bit_offset, bit_len);
        let acc = self
            .as_bytes()
            .get(first_byte..last_byte)
            .expect("bit field span exceeds allocated buffer length")
            .iter()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
        ((acc >> trailing) & bit_mask(bit_len)) as u64
    }

    /// Writes `val` into the bit span, validating that it fits in
    /// `bit_len` bits before touching the buffer.
    fn set_bit_field(
        &mut self,
        offset: usize,
        bit_offset: usize,
        bit_len: usize,
        val: u64,
    ) -> Result<(), FieldError> {
        assert!(bit_len <= 64, "bit field wider than 64 bits");
        if u128::from(val) > bit_mask(bit_len) {
            return Err(FieldError::out_of_range("value too wide for bit field"));
        }
        let (first_byte, last_byte, trailing) = bit_span(offset, bit_offset, bit_len);
        let span = self
            .as_bytes_mut()
            .get_mut(first_byte..last_byte)
            .expect("bit field span exceeds allocated buffer length");
        let mut acc = span.iter().fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
        acc &= !(bit_mask(bit_len) << trailing);
        acc |= u128::from(val) << trailing;
        for byte in span.iter_mut().rev() {
            *byte = acc as u8;
            acc >>= 8;
        }
        Ok(())
    }
}

/// Resolves a bit range to the enclosing byte range plus the number of
/// bits between the range's end and the final byte boundary.
#[inline]
fn bit_span(offset: usize, bit_offset: usize, bit_len: usize) -> (usize, usize, usize) {
    let first_bit = offset * 8 + bit_offset;
    let last_bit = first_bit + bit_len;
    let first_byte = first_bit / 8;
    let last_byte = (last_bit + 7) / 8;
    (first_byte, last_byte, last_byte * 8 - last_bit)
}

#[inline]
fn bit_mask(bit_len: usize) -> u128 {
    (1u128 << bit_len) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrorKind;
    use pktfields_common::SpliceBuf;

    // Bare test host: the whole buffer is payload-free header.
    struct RawHeader(SpliceBuf);

    impl StructuredBuffer for RawHeader {
        fn as_bytes(&self) -> &[u8] {
            self.0.as_slice()
        }

        fn as_bytes_mut(&mut self) -> &mut [u8] {
            self.0.as_mut_slice()
        }

        fn splice(&mut self, start: usize, end: usize, replacement: &[u8]) {
            self.0.splice(start, end, replacement);
        }

        fn payload_offsets(&self) -> (usize, usize) {
            (self.0.len(), 0)
        }

        fn finalize(&mut self) {}
    }

    #[test]
    fn uint_fields_are_big_endian() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(6));
        hdr.set_uint_field(1, 2, 0x0102).unwrap();
        assert_eq!(hdr.as_bytes(), &[0, 1, 2, 0, 0, 0]);
        assert_eq!(hdr.uint_field(1, 2), 0x0102);
        assert_eq!(hdr.uint_field(0, 3), 0x0001_02);
    }

    #[test]
    fn uint_field_width_validated_before_write() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(4));
        let err = hdr.set_uint_field(0, 1, 256).unwrap_err();
        assert_eq!(err.kind, FieldErrorKind::OutOfRange);
        assert_eq!(hdr.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn byte_field_round_trip() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(4));
        hdr.set_byte_field(1, 2, &[0xaa, 0xbb]).unwrap();
        assert_eq!(hdr.byte_field(1, 2), &[0xaa, 0xbb]);
        assert!(hdr.set_byte_field(1, 2, &[0xaa]).is_err());
    }

    #[test]
    fn bit_fields_are_msb_first() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(2));
        // version/ihl style nibbles
        hdr.set_bit_field(0, 0, 4, 0x4).unwrap();
        hdr.set_bit_field(0, 4, 4, 0x5).unwrap();
        assert_eq!(hdr.as_bytes(), &[0x45, 0x00]);
        assert_eq!(hdr.bit_field(0, 0, 4), 0x4);
        assert_eq!(hdr.bit_field(0, 4, 4), 0x5);
    }

    #[test]
    fn bit_field_straddles_bytes() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(3));
        hdr.set_bit_field(0, 6, 7, 0b1010101).unwrap();
        assert_eq!(hdr.bit_field(0, 6, 7), 0b1010101);
        assert_eq!(hdr.as_bytes(), &[0b0000_0010, 0b1010_1000, 0]);
        // a bit offset past the first byte addresses subsequent bytes
        hdr.set_bit_field(0, 16, 8, 0xff).unwrap();
        assert_eq!(hdr.as_bytes()[2], 0xff);
    }

    #[test]
    fn bit_field_value_validated() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(2));
        assert_eq!(
            hdr.set_bit_field(0, 0, 3, 8).unwrap_err().kind,
            FieldErrorKind::OutOfRange
        );
        assert_eq!(hdr.as_bytes(), &[0, 0]);
    }

    #[test]
    fn full_width_bit_field() {
        let mut hdr = RawHeader(SpliceBuf::zeroed(9));
        hdr.set_bit_field(0, 4, 64, u64::MAX).unwrap();
        assert_eq!(hdr.bit_field(0, 4, 64), u64::MAX);
        assert_eq!(hdr.as_bytes()[0], 0x0f);
        assert_eq!(hdr.as_bytes()[8], 0xf0);
    }
}
