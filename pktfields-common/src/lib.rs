// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![forbid(unsafe_code)]

//! A growable byte buffer with range-splice semantics.
//!
//! Protocol objects that expose packet headers through `pktfields`
//! descriptors embed a [`SpliceBuf`] as their backing storage. The one
//! operation that sets it apart from a plain `Vec<u8>` is [`splice`],
//! which replaces an arbitrary byte range and shifts the tail, changing
//! the buffer's total length in the process.
//!
//! [`splice`]: SpliceBuf::splice

/// A mutable byte sequence representing one packet or header plus trailer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpliceBuf {
    buf: Vec<u8>,
}

impl SpliceBuf {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled buffer of the given length.
    #[inline]
    pub fn zeroed(len: usize) -> Self {
        Self { buf: vec![0; len] }
    }

    #[inline]
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// The length of the stored buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends the provided bytes to the end of the buffer.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Truncates the buffer to the specified position.
    pub fn truncate(&mut self, pos: usize) {
        assert!(self.buf.len() >= pos);
        self.buf.truncate(pos);
    }

    /// Replaces the half-open byte range `[start, end)` with `replacement`,
    /// shifting all subsequent content. The buffer grows or shrinks by the
    /// difference between the range length and `replacement.len()`.
    ///
    /// Panics if the range is invalid or extends past the buffer's length.
    pub fn splice(&mut self, start: usize, end: usize, replacement: &[u8]) {
        assert!(
            start <= end && end <= self.buf.len(),
            "splice() range out of bounds for SpliceBuf"
        );
        self.buf.splice(start..end, replacement.iter().copied());
    }
}

impl From<Vec<u8>> for SpliceBuf {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self { buf }
    }
}

impl From<&[u8]> for SpliceBuf {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        Self {
            buf: bytes.to_vec(),
        }
    }
}

impl AsRef<[u8]> for SpliceBuf {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsMut<[u8]> for SpliceBuf {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}
