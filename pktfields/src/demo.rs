// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A worked example of declaring a protocol with field descriptors.
//!
//! [`DemoHeader`] is a fictional 24-byte datagram header wired up with a
//! [`FieldRegistry`]. It shows the full pattern a real protocol object
//! follows: embed a [`SpliceBuf`], implement [`StructuredBuffer`] over
//! it, declare the field table once, and recompute the length and
//! checksum fields in [`finalize`](StructuredBuffer::finalize).
//!
//! Wire layout:
//!
//! ```text
//!  0        | version (4 bits), ihl (4 bits)
//!  1        | type (0 = reply, 5 = redirect, 8 = echo)
//!  2..=3    | total length, set by finalize()
//!  4..=5    | checksum over the whole datagram, set by finalize()
//!  6        | flags (0x1 = more, 0x2 = urgent)
//!  7        | reserved
//!  8..=11   | detail: ident for echo/reply, gateway for redirect
//!  12..=15  | source address
//!  16..=19  | destination address
//!  20..=23  | load estimate, host byte order
//!  24..     | payload
//! ```

use pktfields_common::SpliceBuf;

use crate::buffer::StructuredBuffer;
use crate::fields::{
    BitField, FieldDescriptor, FieldRegistry, FlagsField, HostOrder32Field, IntegerField,
    Ipv4AddressField, PayloadField, ProxyField,
};
use crate::options::OptionTable;
use crate::utils;

const HEADER_LEN: usize = 24;
const LENGTH_OFFSET: usize = 2;
const CHECKSUM_OFFSET: usize = 4;

/// The example protocol's header plus payload.
#[derive(Clone, Debug)]
pub struct DemoHeader {
    buf: SpliceBuf,
}

impl DemoHeader {
    /// Creates a header carrying `payload`, with the version and header
    /// length fields pre-filled and length/checksum finalized.
    pub fn new(payload: &[u8]) -> Self {
        let mut buf = SpliceBuf::zeroed(HEADER_LEN);
        buf.append(payload);
        let mut header = DemoHeader { buf };
        // version 1, ihl in 4-byte words
        header.as_bytes_mut()[0] = 0x10 | (HEADER_LEN / 4) as u8;
        header.finalize();
        header
    }

    /// Reconstructs a header from its wire form.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() >= HEADER_LEN,
            "insufficient bytes for a DemoHeader"
        );
        DemoHeader {
            buf: SpliceBuf::from(bytes),
        }
    }

    /// The field table shared by every `DemoHeader` instance.
    pub fn registry() -> FieldRegistry {
        let types = OptionTable::new()
            .with("reply", 0)
            .with("redirect", 5)
            .with("echo", 8);
        let flags = OptionTable::new().with("more", 0x1).with("urgent", 0x2);
        FieldRegistry::new()
            .with("version", FieldDescriptor::Bit(BitField::new(0, 0, 4)))
            .with("ihl", FieldDescriptor::Bit(BitField::new(0, 4, 4)))
            .with(
                "type",
                FieldDescriptor::Int(IntegerField::with_options(1, 1, types)),
            )
            .with("length", FieldDescriptor::Int(IntegerField::new(2, 2)))
            .with("checksum", FieldDescriptor::Int(IntegerField::new(4, 2)))
            .with(
                "flags",
                FieldDescriptor::Flags(FlagsField::new(6, 0, 8, flags)),
            )
            .with("ident", FieldDescriptor::Int(IntegerField::new(8, 4)))
            .with(
                "gateway",
                FieldDescriptor::Ipv4Addr(Ipv4AddressField::new(8)),
            )
            .with(
                "detail",
                FieldDescriptor::Proxy(
                    ProxyField::new(
                        "type",
                        vec![(5, "gateway".to_string()), (8, "ident".to_string())],
                    )
                    .with_fallback("ident"),
                ),
            )
            .with("src", FieldDescriptor::Ipv4Addr(Ipv4AddressField::new(12)))
            .with("dst", FieldDescriptor::Ipv4Addr(Ipv4AddressField::new(16)))
            .with("load", FieldDescriptor::HostOrder32(HostOrder32Field::new(20)))
            .with("payload", FieldDescriptor::Payload(PayloadField::new()))
    }

    /// True when the stored checksum matches the datagram's content.
    pub fn checksum_ok(&self) -> bool {
        // summing a correctly checksummed datagram folds to all-ones
        utils::checksum16(self.buf.as_slice()) == 0
    }
}

impl StructuredBuffer for DemoHeader {
    fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut_slice()
    }

    fn splice(&mut self, start: usize, end: usize, replacement: &[u8]) {
        self.buf.splice(start, end, replacement);
    }

    fn payload_offsets(&self) -> (usize, usize) {
        (HEADER_LEN, self.buf.len() - HEADER_LEN)
    }

    fn finalize(&mut self) {
        let total = self.buf.len() as u64;
        self.set_uint_field(LENGTH_OFFSET, 2, total)
            .expect("total datagram length exceeds the 16-bit length field");
        self.set_uint_field(CHECKSUM_OFFSET, 2, 0).expect("checksum field is in the fixed header");
        let sum = utils::checksum16(self.buf.as_slice());
        self.set_uint_field(CHECKSUM_OFFSET, 2, u64::from(sum))
            .expect("checksum field is in the fixed header");
    }
}
