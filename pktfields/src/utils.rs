// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Numeric codec primitives
//!
//! Multi-byte big-endian integer conversion and the 16-bit Internet
//! checksum that several field types depend on.

use crate::error::FieldError;

/// Interprets `bytes` as big-endian digits in base 256. An empty slice
/// yields 0. Slices longer than 8 bytes are a caller bug.
#[inline]
pub fn bytes_to_uint(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8, "bytes_to_uint() span exceeds 8 bytes");
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// The inverse of [`bytes_to_uint`]: encodes `value` big-endian,
/// left-padded with zero bytes to exactly `width` bytes. Fails if the
/// minimal encoding of `value` does not fit in `width` bytes.
pub fn uint_to_bytes(value: u64, width: usize) -> Result<Vec<u8>, FieldError> {
    let needed = (64 - value.leading_zeros() as usize + 7) / 8;
    if needed > width {
        return Err(FieldError::out_of_range("number too wide for field width"));
    }
    let mut out = vec![0u8; width];
    for (i, byte) in out.iter_mut().rev().take(needed).enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
    Ok(out)
}

/// Computes the 16-bit Internet checksum (RFC 1071) across `data`.
///
/// All 16-bit big-endian words are summed with end-around carry; an odd
/// trailing byte contributes the high byte of a virtual final word. The
/// result is the one's complement of the folded sum.
pub fn checksum16(data: &[u8]) -> u16 {
    let mut sum: u16 = 0;
    let mut iter = data.iter();
    while let Some(&first) = iter.next() {
        let second = *iter.next().unwrap_or(&0);
        sum = ones_complement_add(sum, (u16::from(first) << 8) | u16::from(second));
    }
    !sum
}

#[inline]
pub fn ones_complement_add(a: u16, b: u16) -> u16 {
    let new = a.wrapping_add(b);
    if new < a {
        new.wrapping_add(1)
    } else {
        new
    }
}

/// Finds the longest run of zero values in `groups`, returned as an
/// inclusive `(start, end)` index pair. Ties are broken in favor of the
/// earliest-starting run; `(0, 0)` is returned when no run longer than a
/// single leading zero exists.
pub fn longest_zero_run(groups: &[u16]) -> (usize, usize) {
    let mut best = (0usize, 0usize);
    let mut i = 0;
    while i < groups.len() {
        if groups[i] == 0 {
            let start = i;
            while i + 1 < groups.len() && groups[i + 1] == 0 {
                i += 1;
            }
            if i - start > best.1 - best.0 {
                best = (start, i);
            }
        }
        i += 1;
    }
    best
}
