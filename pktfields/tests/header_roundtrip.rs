// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Drives the demo protocol through its registry: named reads and
//! writes, discriminator-driven dispatch, and length/checksum
//! resynchronization after structural edits.

use pktfields::buffer::StructuredBuffer;
use pktfields::demo::DemoHeader;
use pktfields::error::FieldErrorKind;
use pktfields::fields::Value;

#[test]
fn build_and_read_back_by_name() {
    let registry = DemoHeader::registry();
    let mut hdr = DemoHeader::new(b"ping!");

    registry
        .set(&mut hdr, "type", Value::Text("Echo".to_string()))
        .unwrap();
    registry
        .set(
            &mut hdr,
            "flags",
            Value::Names(vec!["more".to_string(), "URGENT".to_string()]),
        )
        .unwrap();
    registry
        .set(&mut hdr, "src", Value::Text("192.168.0.2".to_string()))
        .unwrap();
    registry
        .set(&mut hdr, "dst", Value::Text("10.0.0.1".to_string()))
        .unwrap();
    registry.set(&mut hdr, "load", Value::Uint(750)).unwrap();
    registry.set(&mut hdr, "detail", Value::Uint(0xbeef)).unwrap();
    hdr.finalize();

    assert_eq!(registry.get(&hdr, "version").unwrap(), Value::Uint(1));
    assert_eq!(registry.get(&hdr, "ihl").unwrap(), Value::Uint(6));
    assert_eq!(registry.get(&hdr, "type").unwrap(), Value::Uint(8));
    assert_eq!(registry.get(&hdr, "flags").unwrap(), Value::Uint(0x3));
    assert_eq!(registry.get(&hdr, "load").unwrap(), Value::Uint(750));
    assert_eq!(registry.get(&hdr, "ident").unwrap(), Value::Uint(0xbeef));
    assert_eq!(
        registry.get(&hdr, "length").unwrap(),
        Value::Uint(24 + 5)
    );
    match registry.get(&hdr, "src").unwrap() {
        Value::Addr(addr) => assert_eq!(addr.text(), "192.168.0.2"),
        other => panic!("expected an address, got {other:?}"),
    }
    assert_eq!(
        registry.get(&hdr, "payload").unwrap(),
        Value::Bytes(b"ping!".to_vec())
    );
    assert!(hdr.checksum_ok());
}

#[test]
fn detail_region_follows_the_type_field() {
    let registry = DemoHeader::registry();
    let mut hdr = DemoHeader::new(&[]);

    registry
        .set(&mut hdr, "type", Value::Text("redirect".to_string()))
        .unwrap();
    registry
        .set(&mut hdr, "detail", Value::Text("172.16.0.254".to_string()))
        .unwrap();
    match registry.get(&hdr, "detail").unwrap() {
        Value::Addr(addr) => assert_eq!(addr.text(), "172.16.0.254"),
        other => panic!("expected an address, got {other:?}"),
    }

    // the same bytes reinterpret as an identifier once the type changes
    registry
        .set(&mut hdr, "type", Value::Text("echo".to_string()))
        .unwrap();
    assert_eq!(
        registry.get(&hdr, "detail").unwrap(),
        Value::Uint(0xac10_00fe)
    );
}

#[test]
fn payload_writes_resynchronize_length_and_checksum() {
    let registry = DemoHeader::registry();
    let mut hdr = DemoHeader::new(b"abc");
    assert_eq!(registry.get(&hdr, "length").unwrap(), Value::Uint(27));
    assert!(hdr.checksum_ok());

    registry
        .set(&mut hdr, "payload", Value::Bytes(b"a longer payload".to_vec()))
        .unwrap();
    hdr.finalize();
    assert_eq!(registry.get(&hdr, "length").unwrap(), Value::Uint(40));
    assert_eq!(
        registry.get(&hdr, "payload").unwrap(),
        Value::Bytes(b"a longer payload".to_vec())
    );
    assert!(hdr.checksum_ok());

    registry
        .set(&mut hdr, "payload", Value::Bytes(Vec::new()))
        .unwrap();
    hdr.finalize();
    assert_eq!(registry.get(&hdr, "length").unwrap(), Value::Uint(24));
    assert!(hdr.checksum_ok());
}

#[test]
fn wire_form_survives_a_round_trip() {
    let registry = DemoHeader::registry();
    let mut hdr = DemoHeader::new(b"data");
    registry
        .set(&mut hdr, "src", Value::Text("1.2.3.4".to_string()))
        .unwrap();
    registry.set(&mut hdr, "type", Value::Uint(8)).unwrap();
    hdr.finalize();

    let reparsed = DemoHeader::from_bytes(hdr.as_bytes());
    assert!(reparsed.checksum_ok());
    for name in registry.names() {
        assert_eq!(
            registry.get(&hdr, name).unwrap(),
            registry.get(&reparsed, name).unwrap(),
            "field {name} did not survive the round trip"
        );
    }
}

#[test]
fn bad_writes_leave_the_buffer_untouched() {
    let registry = DemoHeader::registry();
    let mut hdr = DemoHeader::new(&[]);
    let before = hdr.as_bytes().to_vec();

    let err = registry
        .set(&mut hdr, "type", Value::Text("bogus".to_string()))
        .unwrap_err();
    assert_eq!(err.kind, FieldErrorKind::UnknownOption);

    let err = registry
        .set(&mut hdr, "version", Value::Uint(16))
        .unwrap_err();
    assert_eq!(err.kind, FieldErrorKind::OutOfRange);

    let err = registry
        .set(&mut hdr, "src", Value::Text("999.0.0.1".to_string()))
        .unwrap_err();
    assert_eq!(err.kind, FieldErrorKind::Malformed);

    assert_eq!(hdr.as_bytes(), before.as_slice());
}
