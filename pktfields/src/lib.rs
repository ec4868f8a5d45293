// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A library for describing and manipulating packet header fields
//! declaratively.
//!
//! A protocol is expressed as a set of named fields -- integers,
//! bit-fields, flag sets, padded strings, addresses, variable trailers --
//! each bound to a byte/bit position in an underlying buffer, with typed
//! get/set semantics, symbolic-name lookup and automatic buffer
//! resynchronization when a write changes the buffer's length.
//!
//! The pieces compose bottom-up:
//!
//! - [`utils`] holds big-endian integer conversion and the 16-bit
//!   Internet checksum,
//! - [`options`] holds the case-insensitive name/value tables used for
//!   symbolic constants and flags,
//! - [`addr`] holds the IPv4/IPv6/Ethernet address and netmask codecs,
//! - [`buffer`] defines the [`StructuredBuffer`](buffer::StructuredBuffer)
//!   contract a host protocol object provides,
//! - [`fields`] defines the field descriptors and the per-protocol
//!   [`FieldRegistry`](fields::FieldRegistry),
//! - [`demo`] wires them all together over a sample header.

#![allow(clippy::len_without_is_empty)]

pub mod addr;
pub mod buffer;
pub mod demo;
pub mod error;
pub mod fields;
pub mod options;
pub mod utils;
