// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed field descriptors and the per-protocol registry that binds them
//! to names.
//!
//! A protocol is described as a [`FieldRegistry`]: an ordered table of
//! named [`FieldDescriptor`]s, each binding a byte/bit position in a
//! [`StructuredBuffer`] to a semantic type. Descriptors hold no mutable
//! state; one registry serves any number of buffers of the same
//! protocol. Client code can work through the registry with dynamic
//! [`Value`]s, or call the typed accessors each descriptor exposes.

use crate::addr::{Address, EthernetAddress, Ipv4Address, Ipv6Address};
use crate::buffer::StructuredBuffer;
use crate::error::FieldError;
use crate::options::OptionTable;

/// A dynamic field value crossing the registry boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Uint(u64),
    Bytes(Vec<u8>),
    Text(String),
    /// Flag names to be resolved and bitwise-ORed.
    Names(Vec<String>),
    Addr(Address),
    AddrList(Vec<Ipv4Address>),
}

/// A binary field spanning a whole number of bytes, passed through
/// without conversion.
#[derive(Clone, Debug)]
pub struct ByteRangeField {
    offset: usize,
    len: usize,
}

impl ByteRangeField {
    #[inline]
    pub fn new(offset: usize, len: usize) -> Self {
        ByteRangeField { offset, len }
    }

    #[inline]
    pub fn get<'a, B: StructuredBuffer>(&self, buf: &'a B) -> &'a [u8] {
        buf.byte_field(self.offset, self.len)
    }

    #[inline]
    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, bytes: &[u8]) -> Result<(), FieldError> {
        buf.set_byte_field(self.offset, self.len, bytes)
    }
}

/// An integer field spanning a whole number of bytes, big-endian on the
/// wire.
///
/// When the field carries a fixed set of symbolic constants, attach an
/// [`OptionTable`] and set it by name through
/// [`set_named`](Self::set_named) (or a [`Value::Text`] through the
/// registry). Reads always return the raw number; resolving it back to a
/// display name is the caller's concern via
/// [`OptionTable::display_name`].
#[derive(Clone, Debug)]
pub struct IntegerField {
    offset: usize,
    len: usize,
    options: Option<OptionTable>,
}

impl IntegerField {
    #[inline]
    pub fn new(offset: usize, len: usize) -> Self {
        IntegerField {
            offset,
            len,
            options: None,
        }
    }

    #[inline]
    pub fn with_options(offset: usize, len: usize, options: OptionTable) -> Self {
        IntegerField {
            offset,
            len,
            options: Some(options),
        }
    }

    #[inline]
    pub fn options(&self) -> Option<&OptionTable> {
        self.options.as_ref()
    }

    #[inline]
    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> u64 {
        buf.uint_field(self.offset, self.len)
    }

    #[inline]
    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, val: u64) -> Result<(), FieldError> {
        buf.set_uint_field(self.offset, self.len, val)
    }

    /// Resolves `name` through the field's option table and writes the
    /// registered value.
    pub fn set_named<B: StructuredBuffer>(&self, buf: &mut B, name: &str) -> Result<(), FieldError> {
        let options = self
            .options
            .as_ref()
            .ok_or_else(|| FieldError::unknown_option("field carries no option table"))?;
        self.set(buf, options.get(name)?)
    }
}

/// A 32-bit integer field stored in host byte order on the wire.
///
/// Most header fields are network order; a few (load averages, kernel
/// counters) are stored in host order by convention. Reads and writes
/// use native-endian byte interpretation of the 4-byte span.
#[derive(Clone, Debug)]
pub struct HostOrder32Field {
    offset: usize,
    options: Option<OptionTable>,
}

impl HostOrder32Field {
    #[inline]
    pub fn new(offset: usize) -> Self {
        HostOrder32Field {
            offset,
            options: None,
        }
    }

    #[inline]
    pub fn with_options(offset: usize, options: OptionTable) -> Self {
        HostOrder32Field {
            offset,
            options: Some(options),
        }
    }

    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> u64 {
        let span: [u8; 4] = buf
            .byte_field(self.offset, 4)
            .try_into()
            .expect("host-order field span is exactly 4 bytes");
        u64::from(u32::from_ne_bytes(span))
    }

    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, val: u64) -> Result<(), FieldError> {
        let val: u32 = val
            .try_into()
            .map_err(|_| FieldError::out_of_range("number too wide for field width"))?;
        buf.set_byte_field(self.offset, 4, &val.to_ne_bytes())
    }

    pub fn set_named<B: StructuredBuffer>(&self, buf: &mut B, name: &str) -> Result<(), FieldError> {
        let options = self
            .options
            .as_ref()
            .ok_or_else(|| FieldError::unknown_option("field carries no option table"))?;
        self.set(buf, options.get(name)?)
    }
}

/// A fixed-width ASCII field, NUL-padded on write and NUL-stripped on
/// read.
#[derive(Clone, Debug)]
pub struct PaddedStringField {
    offset: usize,
    len: usize,
}

impl PaddedStringField {
    #[inline]
    pub fn new(offset: usize, len: usize) -> Self {
        PaddedStringField { offset, len }
    }

    /// The field's content up to (excluding) the first NUL byte.
    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> Result<String, FieldError> {
        let span = buf.byte_field(self.offset, self.len);
        let end = span.iter().position(|&b| b == 0).unwrap_or(span.len());
        String::from_utf8(span[..end].to_vec())
            .map_err(|_| FieldError::malformed("field content is not valid text"))
    }

    /// Writes `val` right-padded with NUL bytes to the field width.
    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, val: &str) -> Result<(), FieldError> {
        if val.len() > self.len {
            return Err(FieldError::malformed("string too long for field width"));
        }
        if !val.is_ascii() {
            return Err(FieldError::malformed("string field must be ASCII"));
        }
        let mut padded = val.as_bytes().to_vec();
        padded.resize(self.len, 0);
        buf.set_byte_field(self.offset, self.len, &padded)
    }
}

/// An unsigned field spanning an arbitrary run of bits, MSB-first from
/// the byte at `offset`.
#[derive(Clone, Debug)]
pub struct BitField {
    offset: usize,
    bit_offset: usize,
    bit_len: usize,
}

impl BitField {
    #[inline]
    pub fn new(offset: usize, bit_offset: usize, bit_len: usize) -> Self {
        BitField {
            offset,
            bit_offset,
            bit_len,
        }
    }

    #[inline]
    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> u64 {
        buf.bit_field(self.offset, self.bit_offset, self.bit_len)
    }

    #[inline]
    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, val: u64) -> Result<(), FieldError> {
        buf.set_bit_field(self.offset, self.bit_offset, self.bit_len, val)
    }
}

/// A bit field composed of named flags.
///
/// The stored value is a plain bitmask; flags can be written verbatim,
/// by a single option name, or as a sequence of names bitwise-ORed
/// together.
#[derive(Clone, Debug)]
pub struct FlagsField {
    bits: BitField,
    options: Option<OptionTable>,
}

impl FlagsField {
    #[inline]
    pub fn new(offset: usize, bit_offset: usize, bit_len: usize, options: OptionTable) -> Self {
        FlagsField {
            bits: BitField::new(offset, bit_offset, bit_len),
            options: Some(options),
        }
    }

    #[inline]
    pub fn options(&self) -> Option<&OptionTable> {
        self.options.as_ref()
    }

    /// The raw bitmask; name resolution for display goes through the
    /// option table.
    #[inline]
    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> u64 {
        self.bits.get(buf)
    }

    #[inline]
    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, mask: u64) -> Result<(), FieldError> {
        self.bits.set(buf, mask)
    }

    pub fn set_flag<B: StructuredBuffer>(&self, buf: &mut B, name: &str) -> Result<(), FieldError> {
        self.set(buf, self.resolve(name)?)
    }

    /// Writes the bitwise OR of the named flags.
    pub fn set_flags<B, S>(&self, buf: &mut B, names: &[S]) -> Result<(), FieldError>
    where
        B: StructuredBuffer,
        S: AsRef<str>,
    {
        let mut mask = 0;
        for name in names {
            mask |= self.resolve(name.as_ref())?;
        }
        self.set(buf, mask)
    }

    fn resolve(&self, name: &str) -> Result<u64, FieldError> {
        self.options
            .as_ref()
            .ok_or_else(|| FieldError::unknown_option("field carries no option table"))?
            .get(name)
    }
}

/// A 32-bit flags field stored in host byte order.
#[derive(Clone, Debug)]
pub struct HostOrder32FlagsField {
    word: HostOrder32Field,
}

impl HostOrder32FlagsField {
    #[inline]
    pub fn new(offset: usize, options: OptionTable) -> Self {
        HostOrder32FlagsField {
            word: HostOrder32Field::with_options(offset, options),
        }
    }

    #[inline]
    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> u64 {
        self.word.get(buf)
    }

    #[inline]
    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, mask: u64) -> Result<(), FieldError> {
        self.word.set(buf, mask)
    }

    #[inline]
    pub fn set_flag<B: StructuredBuffer>(&self, buf: &mut B, name: &str) -> Result<(), FieldError> {
        self.word.set_named(buf, name)
    }

    pub fn set_flags<B, S>(&self, buf: &mut B, names: &[S]) -> Result<(), FieldError>
    where
        B: StructuredBuffer,
        S: AsRef<str>,
    {
        let options = self
            .word
            .options
            .as_ref()
            .ok_or_else(|| FieldError::unknown_option("field carries no option table"))?;
        let mut mask = 0;
        for name in names {
            mask |= options.get(name.as_ref())?;
        }
        self.word.set(buf, mask)
    }
}

macro_rules! address_field {
    ($(#[$doc:meta])* $field:ident, $addr:ty, $width:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $field {
            offset: usize,
        }

        impl $field {
            #[inline]
            pub fn new(offset: usize) -> Self {
                $field { offset }
            }

            #[inline]
            pub fn get<B: StructuredBuffer>(&self, buf: &B) -> $addr {
                <$addr>::from_bytes(buf.byte_field(self.offset, $width))
                    .expect("address span has the family's exact width")
            }

            #[inline]
            pub fn set<B: StructuredBuffer>(
                &self,
                buf: &mut B,
                addr: &$addr,
            ) -> Result<(), FieldError> {
                buf.set_byte_field(self.offset, $width, addr.as_bytes())
            }

            /// Parses `text` as this field's address family and writes it.
            #[inline]
            pub fn set_text<B: StructuredBuffer>(
                &self,
                buf: &mut B,
                text: &str,
            ) -> Result<(), FieldError> {
                self.set(buf, &text.parse::<$addr>()?)
            }
        }
    };
}

address_field!(
    /// A 4-byte IPv4 address field.
    Ipv4AddressField,
    Ipv4Address,
    4
);
address_field!(
    /// A 16-byte IPv6 address field.
    Ipv6AddressField,
    Ipv6Address,
    16
);
address_field!(
    /// A 6-byte Ethernet address field.
    EthernetAddressField,
    EthernetAddress,
    6
);

/// A field holding consecutive 4-byte IPv4 addresses, as found in IP
/// source-routing options.
///
/// The declared span must be a multiple of 4 bytes. Writing a list of a
/// different length splices the buffer and finalizes it, since the total
/// buffer length generally changes.
#[derive(Clone, Debug)]
pub struct Ipv4AddressListField {
    offset: usize,
    len: usize,
}

impl Ipv4AddressListField {
    pub fn new(offset: usize, len: usize) -> Result<Self, FieldError> {
        if len % 4 != 0 {
            return Err(FieldError::out_of_range(
                "address list must span a multiple of 4 bytes",
            ));
        }
        Ok(Ipv4AddressListField { offset, len })
    }

    pub fn get<B: StructuredBuffer>(&self, buf: &B) -> Vec<Ipv4Address> {
        buf.byte_field(self.offset, self.len)
            .chunks_exact(4)
            .map(|group| Ipv4Address::from_bytes(group).expect("chunk is 4 bytes"))
            .collect()
    }

    pub fn set<B: StructuredBuffer>(
        &self,
        buf: &mut B,
        addrs: &[Ipv4Address],
    ) -> Result<(), FieldError> {
        let mut bytes = Vec::with_capacity(addrs.len() * 4);
        for addr in addrs {
            bytes.extend_from_slice(addr.as_bytes());
        }
        buf.splice(self.offset, self.offset + self.len, &bytes);
        buf.finalize();
        Ok(())
    }
}

/// The trailing variable region of a packet.
///
/// The span is not fixed: each access asks the buffer for the payload's
/// current offset and length. Writing splices exactly that span; any
/// length-dependent field must be finalized by the caller afterwards.
#[derive(Clone, Debug, Default)]
pub struct PayloadField;

impl PayloadField {
    #[inline]
    pub fn new() -> Self {
        PayloadField
    }

    pub fn get<'a, B: StructuredBuffer>(&self, buf: &'a B) -> &'a [u8] {
        let (offset, len) = buf.payload_offsets();
        buf.byte_field(offset, len)
    }

    pub fn set<B: StructuredBuffer>(&self, buf: &mut B, val: &[u8]) -> Result<(), FieldError> {
        let (offset, len) = buf.payload_offsets();
        buf.splice(offset, offset + len, val);
        Ok(())
    }
}

/// Tagged-variant dispatch for regions whose interpretation depends on a
/// previously-read discriminator field.
///
/// At each access the proxy reads the named discriminator from the
/// buffer, selects the delegate field registered for its value (or the
/// fallback), and forwards through the registry. Delegates are resolved
/// at call time, never bound at construction; a proxy may not delegate
/// to another proxy.
#[derive(Clone, Debug)]
pub struct ProxyField {
    discriminant: String,
    variants: Vec<(u64, String)>,
    fallback: Option<String>,
}

impl ProxyField {
    pub fn new<S: Into<String>>(discriminant: S, variants: Vec<(u64, String)>) -> Self {
        ProxyField {
            discriminant: discriminant.into(),
            variants,
            fallback: None,
        }
    }

    pub fn with_fallback<S: Into<String>>(mut self, fallback: S) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// The name of the field this proxy currently designates.
    pub fn delegate_name<B: StructuredBuffer>(
        &self,
        registry: &FieldRegistry,
        buf: &B,
    ) -> Result<&str, FieldError> {
        let tag = match registry.get(buf, &self.discriminant)? {
            Value::Uint(tag) => tag,
            _ => return Err(FieldError::malformed("discriminator field is not numeric")),
        };
        self.variants
            .iter()
            .find(|(value, _)| *value == tag)
            .map(|(_, name)| name.as_str())
            .or(self.fallback.as_deref())
            .ok_or_else(|| FieldError::unknown_option("no variant for discriminator value"))
    }
}

/// A typed accessor bound to a fixed location in a buffer, dispatchable
/// through a [`FieldRegistry`] by name.
#[derive(Clone, Debug)]
pub enum FieldDescriptor {
    Bytes(ByteRangeField),
    Int(IntegerField),
    HostOrder32(HostOrder32Field),
    PaddedString(PaddedStringField),
    Bit(BitField),
    Flags(FlagsField),
    HostOrder32Flags(HostOrder32FlagsField),
    Ipv4Addr(Ipv4AddressField),
    Ipv6Addr(Ipv6AddressField),
    EtherAddr(EthernetAddressField),
    Ipv4AddrList(Ipv4AddressListField),
    Payload(PayloadField),
    Proxy(ProxyField),
}

impl FieldDescriptor {
    /// Reads the field's current value from `buf`.
    pub fn get<B: StructuredBuffer>(
        &self,
        registry: &FieldRegistry,
        buf: &B,
    ) -> Result<Value, FieldError> {
        match self {
            FieldDescriptor::Bytes(f) => Ok(Value::Bytes(f.get(buf).to_vec())),
            FieldDescriptor::Int(f) => Ok(Value::Uint(f.get(buf))),
            FieldDescriptor::HostOrder32(f) => Ok(Value::Uint(f.get(buf))),
            FieldDescriptor::PaddedString(f) => Ok(Value::Text(f.get(buf)?)),
            FieldDescriptor::Bit(f) => Ok(Value::Uint(f.get(buf))),
            FieldDescriptor::Flags(f) => Ok(Value::Uint(f.get(buf))),
            FieldDescriptor::HostOrder32Flags(f) => Ok(Value::Uint(f.get(buf))),
            FieldDescriptor::Ipv4Addr(f) => Ok(Value::Addr(Address::Ipv4(f.get(buf)))),
            FieldDescriptor::Ipv6Addr(f) => Ok(Value::Addr(Address::Ipv6(f.get(buf)))),
            FieldDescriptor::EtherAddr(f) => Ok(Value::Addr(Address::Ethernet(f.get(buf)))),
            FieldDescriptor::Ipv4AddrList(f) => Ok(Value::AddrList(f.get(buf))),
            FieldDescriptor::Payload(f) => Ok(Value::Bytes(f.get(buf).to_vec())),
            FieldDescriptor::Proxy(f) => registry.delegate(f, buf)?.get(registry, buf),
        }
    }

    /// Writes `value` to the field, validating it fully before any
    /// buffer mutation.
    pub fn set<B: StructuredBuffer>(
        &self,
        registry: &FieldRegistry,
        buf: &mut B,
        value: Value,
    ) -> Result<(), FieldError> {
        match (self, value) {
            (FieldDescriptor::Bytes(f), Value::Bytes(bytes)) => f.set(buf, &bytes),
            (FieldDescriptor::Int(f), Value::Uint(v)) => f.set(buf, v),
            (FieldDescriptor::Int(f), Value::Text(name)) => f.set_named(buf, &name),
            (FieldDescriptor::HostOrder32(f), Value::Uint(v)) => f.set(buf, v),
            (FieldDescriptor::HostOrder32(f), Value::Text(name)) => f.set_named(buf, &name),
            (FieldDescriptor::PaddedString(f), Value::Text(s)) => f.set(buf, &s),
            (FieldDescriptor::Bit(f), Value::Uint(v)) => f.set(buf, v),
            (FieldDescriptor::Flags(f), Value::Uint(mask)) => f.set(buf, mask),
            (FieldDescriptor::Flags(f), Value::Text(name)) => f.set_flag(buf, &name),
            (FieldDescriptor::Flags(f), Value::Names(names)) => f.set_flags(buf, &names),
            (FieldDescriptor::HostOrder32Flags(f), Value::Uint(mask)) => f.set(buf, mask),
            (FieldDescriptor::HostOrder32Flags(f), Value::Text(name)) => f.set_flag(buf, &name),
            (FieldDescriptor::HostOrder32Flags(f), Value::Names(names)) => f.set_flags(buf, &names),
            (FieldDescriptor::Ipv4Addr(f), Value::Addr(Address::Ipv4(a))) => f.set(buf, &a),
            (FieldDescriptor::Ipv4Addr(f), Value::Text(s)) => f.set_text(buf, &s),
            (FieldDescriptor::Ipv6Addr(f), Value::Addr(Address::Ipv6(a))) => f.set(buf, &a),
            (FieldDescriptor::Ipv6Addr(f), Value::Text(s)) => f.set_text(buf, &s),
            (FieldDescriptor::EtherAddr(f), Value::Addr(Address::Ethernet(a))) => f.set(buf, &a),
            (FieldDescriptor::EtherAddr(f), Value::Text(s)) => f.set_text(buf, &s),
            (FieldDescriptor::Ipv4AddrList(f), Value::AddrList(addrs)) => f.set(buf, &addrs),
            (FieldDescriptor::Payload(f), Value::Bytes(bytes)) => f.set(buf, &bytes),
            (FieldDescriptor::Proxy(f), value) => {
                registry.delegate(f, buf)?.set(registry, buf, value)
            }
            _ => Err(FieldError::malformed("value type does not suit the field")),
        }
    }
}

/// The ordered `name -> descriptor` table describing one protocol
/// header. Enumeration follows insertion order.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<(String, FieldDescriptor)>,
}

impl FieldRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` under `name`, replacing any previous
    /// binding of that name.
    pub fn insert<S: Into<String>>(&mut self, name: S, descriptor: FieldDescriptor) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = descriptor,
            None => self.fields.push((name, descriptor)),
        }
    }

    /// Chainable form of [`insert`](Self::insert) for declaring a
    /// protocol inline.
    #[inline]
    pub fn with<S: Into<String>>(mut self, name: S, descriptor: FieldDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn descriptor(&self, name: &str) -> Result<&FieldDescriptor, FieldError> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
            .ok_or_else(|| FieldError::unknown_option("no field registered under that name"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Reads the named field from `buf`.
    pub fn get<B: StructuredBuffer>(&self, buf: &B, name: &str) -> Result<Value, FieldError> {
        self.descriptor(name)?.get(self, buf)
    }

    /// Writes the named field in `buf`.
    pub fn set<B: StructuredBuffer>(
        &self,
        buf: &mut B,
        name: &str,
        value: Value,
    ) -> Result<(), FieldError> {
        self.descriptor(name)?.set(self, buf, value)
    }

    /// Resolves a proxy's delegate descriptor, refusing proxy chains.
    fn delegate<B: StructuredBuffer>(
        &self,
        proxy: &ProxyField,
        buf: &B,
    ) -> Result<&FieldDescriptor, FieldError> {
        let name = proxy.delegate_name(self, buf)?;
        let descriptor = self.descriptor(name)?;
        if matches!(descriptor, FieldDescriptor::Proxy(_)) {
            return Err(FieldError::malformed("proxy field delegates to a proxy"));
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrorKind;
    use pktfields_common::SpliceBuf;

    // Minimal host object: byte 0 holds the header length, the payload
    // trails it, and finalize() keeps byte 1 equal to the total length.
    struct TestHeader {
        buf: SpliceBuf,
        header_len: usize,
    }

    impl TestHeader {
        fn new(header_len: usize) -> Self {
            TestHeader {
                buf: SpliceBuf::zeroed(header_len),
                header_len,
            }
        }
    }

    impl StructuredBuffer for TestHeader {
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
            (self.header_len, self.buf.len() - self.header_len)
        }

        fn finalize(&mut self) {
            let total = self.buf.len() as u8;
            self.buf.as_mut_slice()[1] = total;
        }
    }

    #[test]
    fn integer_field_with_options() {
        let field = IntegerField::with_options(
            2,
            1,
            OptionTable::new().with("echo", 8).with("echoreply", 0),
        );
        let mut hdr = TestHeader::new(8);
        field.set_named(&mut hdr, "Echo").unwrap();
        assert_eq!(field.get(&hdr), 8);
        assert_eq!(
            field.set_named(&mut hdr, "bogus").unwrap_err().kind,
            FieldErrorKind::UnknownOption
        );
    }

    #[test]
    fn integer_field_without_options_rejects_names() {
        let field = IntegerField::new(0, 2);
        let mut hdr = TestHeader::new(4);
        assert_eq!(
            field.set_named(&mut hdr, "echo").unwrap_err().kind,
            FieldErrorKind::UnknownOption
        );
    }

    #[test]
    fn host_order_field_round_trips() {
        let field = HostOrder32Field::new(0);
        let mut hdr = TestHeader::new(8);
        field.set(&mut hdr, 0xdead_beef).unwrap();
        assert_eq!(field.get(&hdr), 0xdead_beef);
        assert_eq!(hdr.as_bytes()[..4], 0xdead_beefu32.to_ne_bytes());
        assert!(field.set(&mut hdr, u64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn padded_string_field() {
        let field = PaddedStringField::new(2, 4);
        let mut hdr = TestHeader::new(8);
        field.set(&mut hdr, "ab").unwrap();
        assert_eq!(hdr.as_bytes()[2..6], *b"ab\0\0");
        assert_eq!(field.get(&hdr).unwrap(), "ab");
        assert_eq!(
            field.set(&mut hdr, "abcde").unwrap_err().kind,
            FieldErrorKind::Malformed
        );
        // the failed set left the field untouched
        assert_eq!(field.get(&hdr).unwrap(), "ab");
    }

    #[test]
    fn flags_field_ors_names() {
        let field = FlagsField::new(0, 2, 6, OptionTable::new().with("a", 0x1).with("b", 0x2));
        let mut hdr = TestHeader::new(4);
        field.set_flags(&mut hdr, &["a", "b"]).unwrap();
        assert_eq!(field.get(&hdr), 0x3);
        field.set_flag(&mut hdr, "B").unwrap();
        assert_eq!(field.get(&hdr), 0x2);
        field.set(&mut hdr, 0x21).unwrap();
        assert_eq!(field.get(&hdr), 0x21);
        assert!(field.set_flags(&mut hdr, &["a", "nope"]).is_err());
    }

    #[test]
    fn host_order_flags_field() {
        let field =
            HostOrder32FlagsField::new(4, OptionTable::new().with("up", 0x1).with("debug", 0x4));
        let mut hdr = TestHeader::new(8);
        field.set_flags(&mut hdr, &["up", "DEBUG"]).unwrap();
        assert_eq!(field.get(&hdr), 0x5);
        assert_eq!(hdr.as_bytes()[4..8], 0x5u32.to_ne_bytes());
    }

    #[test]
    fn address_fields() {
        let v4 = Ipv4AddressField::new(0);
        let mut hdr = TestHeader::new(26);
        v4.set_text(&mut hdr, "10.0.0.1").unwrap();
        assert!(v4.get(&hdr) == "10.0.0.1");

        let v6 = Ipv6AddressField::new(4);
        v6.set_text(&mut hdr, "fe80::1").unwrap();
        assert_eq!(v6.get(&hdr).text(), "fe80::1");

        let eth = EthernetAddressField::new(20);
        eth.set_text(&mut hdr, "aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(eth.get(&hdr).text(), "aa:bb:cc:dd:ee:ff");

        assert!(v4.set_text(&mut hdr, "fe80::1").is_err());
    }

    #[test]
    fn address_list_field() {
        assert!(Ipv4AddressListField::new(4, 6).is_err());

        let field = Ipv4AddressListField::new(4, 8).unwrap();
        let mut hdr = TestHeader::new(12);
        let addrs: Vec<Ipv4Address> = ["1.1.1.1", "2.2.2.2", "3.3.3.3"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        field.set(&mut hdr, &addrs).unwrap();
        // the span grew by 4 bytes and finalize() saw the new length
        assert_eq!(hdr.as_bytes().len(), 16);
        assert_eq!(hdr.as_bytes()[1], 16);
        let field = Ipv4AddressListField::new(4, 12).unwrap();
        assert_eq!(field.get(&hdr), addrs);
    }

    #[test]
    fn payload_field_resizes_buffer() {
        let field = PayloadField::new();
        let mut hdr = TestHeader::new(4);
        assert_eq!(field.get(&hdr), &[] as &[u8]);
        field.set(&mut hdr, b"hello").unwrap();
        hdr.finalize();
        assert_eq!(field.get(&hdr), b"hello");
        assert_eq!(hdr.as_bytes().len(), 9);
        field.set(&mut hdr, b"hi").unwrap();
        hdr.finalize();
        assert_eq!(field.get(&hdr), b"hi");
        assert_eq!(hdr.as_bytes()[1], 6);
    }

    fn proxied_registry() -> FieldRegistry {
        FieldRegistry::new()
            .with("type", FieldDescriptor::Int(IntegerField::new(0, 1)))
            .with("id", FieldDescriptor::Int(IntegerField::new(2, 2)))
            .with(
                "gateway",
                FieldDescriptor::Ipv4Addr(Ipv4AddressField::new(2)),
            )
            .with(
                "body",
                FieldDescriptor::Proxy(
                    ProxyField::new(
                        "type",
                        vec![(8, "id".to_string()), (5, "gateway".to_string())],
                    )
                    .with_fallback("id"),
                ),
            )
    }

    #[test]
    fn proxy_field_dispatches_on_discriminator() {
        let registry = proxied_registry();
        let mut hdr = TestHeader::new(8);

        registry.set(&mut hdr, "type", Value::Uint(8)).unwrap();
        registry.set(&mut hdr, "body", Value::Uint(42)).unwrap();
        assert_eq!(registry.get(&hdr, "body").unwrap(), Value::Uint(42));

        registry.set(&mut hdr, "type", Value::Uint(5)).unwrap();
        registry
            .set(&mut hdr, "body", Value::Text("10.0.0.1".to_string()))
            .unwrap();
        match registry.get(&hdr, "body").unwrap() {
            Value::Addr(addr) => assert_eq!(addr.text(), "10.0.0.1"),
            other => panic!("expected an address, got {other:?}"),
        }

        // unmapped discriminator value falls back
        registry.set(&mut hdr, "type", Value::Uint(99)).unwrap();
        assert!(matches!(
            registry.get(&hdr, "body").unwrap(),
            Value::Uint(_)
        ));
    }

    #[test]
    fn registry_dispatch_and_errors() {
        let registry = proxied_registry();
        let mut hdr = TestHeader::new(8);
        assert_eq!(
            registry.get(&hdr, "missing").unwrap_err().kind,
            FieldErrorKind::UnknownOption
        );
        assert_eq!(
            registry
                .set(&mut hdr, "id", Value::Bytes(vec![1]))
                .unwrap_err()
                .kind,
            FieldErrorKind::Malformed
        );
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["type", "id", "gateway", "body"]
        );
    }
}
