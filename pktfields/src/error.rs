// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types raised by field descriptors and codecs.

use core::fmt;

/// An error raised synchronously by a descriptor, codec or registry
/// operation. No error is retried or swallowed internally, and a failed
/// `set` never leaves its buffer partially written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub reason: &'static str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A value that cannot be represented in the target encoding: a
    /// malformed address or mask, a non-canonical netmask bit pattern, an
    /// oversized integer or string for the field's width.
    Malformed,
    /// A structural parameter outside its permitted bounds: a prefix
    /// length beyond the address family's width, an address-list span
    /// that is not a multiple of four bytes, a flag value wider than its
    /// bit field.
    OutOfRange,
    /// A name with no registration: an unknown option or flag name, an
    /// unknown field name in a registry lookup.
    UnknownOption,
}

impl FieldError {
    #[inline]
    pub(crate) fn malformed(reason: &'static str) -> Self {
        FieldError {
            kind: FieldErrorKind::Malformed,
            reason,
        }
    }

    #[inline]
    pub(crate) fn out_of_range(reason: &'static str) -> Self {
        FieldError {
            kind: FieldErrorKind::OutOfRange,
            reason,
        }
    }

    #[inline]
    pub(crate) fn unknown_option(reason: &'static str) -> Self {
        FieldError {
            kind: FieldErrorKind::UnknownOption,
            reason,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldErrorKind::Malformed => write!(f, "malformed value: {}", self.reason),
            FieldErrorKind::OutOfRange => write!(f, "value out of range: {}", self.reason),
            FieldErrorKind::UnknownOption => write!(f, "unknown name: {}", self.reason),
        }
    }
}

impl std::error::Error for FieldError {}
