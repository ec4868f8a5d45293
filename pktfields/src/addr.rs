// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Address and netmask value objects: IPv4, IPv6 and Ethernet, with
//! textual parse/format and raw byte (de)serialization.
//!
//! Each value is an immutable pairing of a textual form and its raw
//! byte form. Values constructed from text keep the text as given;
//! values constructed from bytes render the canonical form (for IPv6,
//! the longest run of zero groups is compressed to `::` -- with the
//! historical exception that a run ending at the first group is left
//! uncompressed). Equality is always raw-byte equality.

use core::fmt;
use core::str::FromStr;

use crate::error::FieldError;
use crate::utils;

/// The address family an address or mask value belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
    Ethernet,
}

/// Splits a ":"-delimited address into its hexadecimal blocks, skipping
/// empty segments. Applicable to Ethernet and IPv6 addresses.
fn hex_blocks(s: &str) -> Result<Vec<u16>, FieldError> {
    let mut nums = Vec::new();
    for part in s.split(':') {
        if part.is_empty() {
            continue;
        }
        let num = u32::from_str_radix(part, 16)
            .map_err(|_| FieldError::malformed("malformed address block"))?;
        if num > 0xffff {
            return Err(FieldError::malformed("address block exceeds 16 bits"));
        }
        nums.push(num as u16);
    }
    Ok(nums)
}

/// An IPv4 address in dotted-decimal form, e.g. `192.168.0.2`.
#[derive(Clone, Debug)]
pub struct Ipv4Address {
    text: String,
    bytes: [u8; 4],
}

impl Ipv4Address {
    pub const FAMILY: AddressFamily = AddressFamily::Ipv4;

    /// Builds the address from its 4-byte wire form, rendering
    /// dotted-decimal text.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| FieldError::malformed("IPv4 address must have 4 bytes"))?;
        let text = bytes.map(|b| b.to_string()).join(".");
        Ok(Ipv4Address { text, bytes })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.bytes
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl FromStr for Ipv4Address {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, FieldError> {
        let mut bytes = [0u8; 4];
        let mut octets = s.split('.');
        for byte in bytes.iter_mut() {
            let octet = octets
                .next()
                .ok_or_else(|| FieldError::malformed("IPv4 address must have 4 octets"))?;
            *byte = octet
                .parse::<u8>()
                .map_err(|_| FieldError::malformed("malformed IPv4 octet"))?;
        }
        if octets.next().is_some() {
            return Err(FieldError::malformed("IPv4 address must have 4 octets"));
        }
        Ok(Ipv4Address {
            text: s.to_string(),
            bytes,
        })
    }
}

/// An IPv6 address in colon-hex form, e.g. `::1`, `fe80::1` or
/// `1:2:3:4:5:6:7:8`.
#[derive(Clone, Debug)]
pub struct Ipv6Address {
    text: String,
    bytes: [u8; 16],
}

impl Ipv6Address {
    pub const FAMILY: AddressFamily = AddressFamily::Ipv6;

    /// Builds the address from its 16-byte wire form, rendering the
    /// compressed textual form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        let bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| FieldError::malformed("IPv6 address must have 16 bytes"))?;
        let mut groups = [0u16; 8];
        for (i, group) in groups.iter_mut().enumerate() {
            *group = utils::bytes_to_uint(&bytes[2 * i..2 * i + 2]) as u16;
        }
        let rendered: Vec<String> = groups.iter().map(|g| format!("{g:x}")).collect();
        let (start, finish) = utils::longest_zero_run(&groups);
        // A zero run ending at the first group is never compressed; this
        // matches the historical formatter bit for bit.
        let text = if finish != 0 {
            format!(
                "{}::{}",
                rendered[..start].join(":"),
                rendered[finish + 1..].join(":")
            )
        } else {
            rendered.join(":")
        };
        Ok(Ipv6Address { text, bytes })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl FromStr for Ipv6Address {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, FieldError> {
        let nums = match s.split_once("::") {
            Some((head, tail)) => {
                if tail.contains("::") {
                    return Err(FieldError::malformed(
                        "only one :: abbreviation allowed in an IPv6 address",
                    ));
                }
                let head = hex_blocks(head)?;
                let tail = hex_blocks(tail)?;
                let padding = 8usize
                    .checked_sub(head.len() + tail.len())
                    .ok_or_else(|| FieldError::malformed("malformed IPv6 address"))?;
                let mut nums = head;
                nums.extend(std::iter::repeat(0).take(padding));
                nums.extend(tail);
                nums
            }
            None => hex_blocks(s)?,
        };
        if nums.len() != 8 {
            return Err(FieldError::malformed("IPv6 address must have 8 groups"));
        }
        let mut bytes = [0u8; 16];
        for (i, num) in nums.iter().enumerate() {
            bytes[2 * i..2 * i + 2].copy_from_slice(&num.to_be_bytes());
        }
        Ok(Ipv6Address {
            text: s.to_string(),
            bytes,
        })
    }
}

/// An Ethernet (MAC) address, e.g. `00:0c:29:3a:5b:7c`.
#[derive(Clone, Debug)]
pub struct EthernetAddress {
    text: String,
    bytes: [u8; 6],
}

impl EthernetAddress {
    pub const FAMILY: AddressFamily = AddressFamily::Ethernet;

    /// Builds the address from its 6-byte wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        let bytes: [u8; 6] = bytes
            .try_into()
            .map_err(|_| FieldError::malformed("Ethernet address must have 6 bytes"))?;
        let text = bytes.map(|b| format!("{b:02x}")).join(":");
        Ok(EthernetAddress { text, bytes })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl FromStr for EthernetAddress {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, FieldError> {
        let nums = hex_blocks(s)?;
        if nums.len() != 6 {
            return Err(FieldError::malformed("Ethernet address must have 6 octets"));
        }
        let mut bytes = [0u8; 6];
        for (byte, &num) in bytes.iter_mut().zip(&nums) {
            if num > 0xff {
                return Err(FieldError::malformed("Ethernet octet exceeds 8 bits"));
            }
            *byte = num as u8;
        }
        Ok(EthernetAddress {
            text: s.to_string(),
            bytes,
        })
    }
}

/// Counts the one-bits of a canonical netmask, rejecting any
/// non-contiguous bit pattern: the bytes must be a run of `0xff`,
/// at most one partial byte, then all zeros.
fn count_prefix(bytes: &[u8]) -> Result<u32, FieldError> {
    let mut iter = bytes.iter();
    let mut num = 0;
    let partial = loop {
        match iter.next() {
            None => return Ok(num),
            Some(0xff) => num += 8,
            Some(&b) => break b,
        }
    };
    num += match partial {
        0x00 => 0,
        0x80 => 1,
        0xc0 => 2,
        0xe0 => 3,
        0xf0 => 4,
        0xf8 => 5,
        0xfc => 6,
        0xfe => 7,
        _ => return Err(FieldError::malformed("invalid mask")),
    };
    if iter.any(|&b| b != 0) {
        return Err(FieldError::malformed("invalid mask"));
    }
    Ok(num)
}

/// Produces the wire form of a netmask with the given prefix length,
/// zero-padded to `width` bytes. Bounds are the caller's concern.
fn mask_bytes_from_prefix(prefix: u32, width: usize) -> Vec<u8> {
    let mut bytes = vec![0xffu8; (prefix / 8) as usize];
    if prefix % 8 != 0 {
        bytes.push((0xffu16 << (8 - prefix % 8)) as u8);
    }
    bytes.resize(width, 0);
    bytes
}

/// An IPv4 netmask: an [`Ipv4Address`] whose bit pattern is a contiguous
/// run of one-bits, carrying the equivalent prefix length.
#[derive(Clone, Debug)]
pub struct Ipv4Mask {
    addr: Ipv4Address,
    prefix: u32,
}

impl Ipv4Mask {
    /// Builds the mask for a prefix length between 0 and 32.
    pub fn from_prefix(prefix: u32) -> Result<Self, FieldError> {
        if prefix > 32 {
            return Err(FieldError::out_of_range("prefix must be between 0 and 32"));
        }
        Self::from_bytes(&mask_bytes_from_prefix(prefix, 4))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        let addr = Ipv4Address::from_bytes(bytes)?;
        let prefix = count_prefix(addr.as_bytes())?;
        Ok(Ipv4Mask { addr, prefix })
    }

    #[inline]
    pub fn prefix(&self) -> u32 {
        self.prefix
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] {
        self.addr.as_bytes()
    }

    #[inline]
    pub fn text(&self) -> &str {
        self.addr.text()
    }
}

impl FromStr for Ipv4Mask {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, FieldError> {
        let addr = Ipv4Address::from_str(s)?;
        let prefix = count_prefix(addr.as_bytes())?;
        Ok(Ipv4Mask { addr, prefix })
    }
}

/// An IPv6 netmask with its prefix length.
#[derive(Clone, Debug)]
pub struct Ipv6Mask {
    addr: Ipv6Address,
    prefix: u32,
}

impl Ipv6Mask {
    /// Builds the mask for a prefix length between 0 and 128.
    pub fn from_prefix(prefix: u32) -> Result<Self, FieldError> {
        if prefix > 128 {
            return Err(FieldError::out_of_range("prefix must be between 0 and 128"));
        }
        Self::from_bytes(&mask_bytes_from_prefix(prefix, 16))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        let addr = Ipv6Address::from_bytes(bytes)?;
        let prefix = count_prefix(addr.as_bytes())?;
        Ok(Ipv6Mask { addr, prefix })
    }

    #[inline]
    pub fn prefix(&self) -> u32 {
        self.prefix
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.addr.as_bytes()
    }

    #[inline]
    pub fn text(&self) -> &str {
        self.addr.text()
    }
}

impl FromStr for Ipv6Mask {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, FieldError> {
        let addr = Ipv6Address::from_str(s)?;
        let prefix = count_prefix(addr.as_bytes())?;
        Ok(Ipv6Mask { addr, prefix })
    }
}

/// An address of any supported family.
#[derive(Clone, Debug)]
pub enum Address {
    Ipv4(Ipv4Address),
    Ipv6(Ipv6Address),
    Ethernet(EthernetAddress),
}

impl Address {
    /// Dispatches to the family matching the byte count: 4 bytes parse
    /// as IPv4 and 16 as IPv6. Ethernet addresses are never inferred
    /// from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        match bytes.len() {
            4 => Ok(Address::Ipv4(Ipv4Address::from_bytes(bytes)?)),
            16 => Ok(Address::Ipv6(Ipv6Address::from_bytes(bytes)?)),
            _ => Err(FieldError::malformed("address byte length not recognized")),
        }
    }

    #[inline]
    pub fn family(&self) -> AddressFamily {
        match self {
            Address::Ipv4(_) => AddressFamily::Ipv4,
            Address::Ipv6(_) => AddressFamily::Ipv6,
            Address::Ethernet(_) => AddressFamily::Ethernet,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Address::Ipv4(a) => a.as_bytes(),
            Address::Ipv6(a) => a.as_bytes(),
            Address::Ethernet(a) => a.as_bytes(),
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Address::Ipv4(a) => a.text(),
            Address::Ipv6(a) => a.text(),
            Address::Ethernet(a) => a.text(),
        }
    }
}

impl FromStr for Address {
    type Err = FieldError;

    /// Attempts IPv4, IPv6 and Ethernet parses in that order.
    fn from_str(s: &str) -> Result<Self, FieldError> {
        if let Ok(a) = Ipv4Address::from_str(s) {
            return Ok(Address::Ipv4(a));
        }
        if let Ok(a) = Ipv6Address::from_str(s) {
            return Ok(Address::Ipv6(a));
        }
        if let Ok(a) = EthernetAddress::from_str(s) {
            return Ok(Address::Ethernet(a));
        }
        Err(FieldError::malformed("not a valid address"))
    }
}

/// A netmask of either IP family.
#[derive(Clone, Debug)]
pub enum Mask {
    Ipv4(Ipv4Mask),
    Ipv6(Ipv6Mask),
}

impl Mask {
    #[inline]
    pub fn prefix(&self) -> u32 {
        match self {
            Mask::Ipv4(m) => m.prefix(),
            Mask::Ipv6(m) => m.prefix(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Mask::Ipv4(m) => m.as_bytes(),
            Mask::Ipv6(m) => m.as_bytes(),
        }
    }
}

impl FromStr for Mask {
    type Err = FieldError;

    /// Attempts IPv4 then IPv6 mask parses.
    fn from_str(s: &str) -> Result<Self, FieldError> {
        if let Ok(m) = Ipv4Mask::from_str(s) {
            return Ok(Mask::Ipv4(m));
        }
        if let Ok(m) = Ipv6Mask::from_str(s) {
            return Ok(Mask::Ipv6(m));
        }
        Err(FieldError::malformed("not a valid mask"))
    }
}

macro_rules! byte_equality {
    ($($ty:ty),+) => {
        $(
            impl PartialEq for $ty {
                #[inline]
                fn eq(&self, other: &Self) -> bool {
                    self.as_bytes() == other.as_bytes()
                }
            }

            impl Eq for $ty {}

            // Comparison against an unparseable string is simply unequal.
            impl PartialEq<&str> for $ty {
                #[inline]
                fn eq(&self, other: &&str) -> bool {
                    match other.parse::<$ty>() {
                        Ok(parsed) => self.as_bytes() == parsed.as_bytes(),
                        Err(_) => false,
                    }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.text())
                }
            }
        )+
    };
}

byte_equality!(Ipv4Address, Ipv6Address, EthernetAddress, Ipv4Mask, Ipv6Mask);

impl PartialEq for Address {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.family() == other.family() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mask::Ipv4(m) => f.write_str(m.text()),
            Mask::Ipv6(m) => f.write_str(m.text()),
        }
    }
}
