// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

#![no_main]

use arbitrary::Arbitrary;
use codeobject::NoteIter;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Note {
    name: Vec<u8>,
    desc: Vec<u8>,
    note_type: u32,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    notes: Vec<Note>,
    /// Bytes appended after the last record.
    trailer: Vec<u8>,
}

fn pad(buf: &mut Vec<u8>) {
    buf.resize(buf.len().next_multiple_of(4), 0);
}

fn encode(notes: &[Note]) -> Vec<u8> {
    let mut buf = Vec::new();
    for note in notes {
        buf.extend_from_slice(&(note.name.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(note.desc.len() as u32).to_le_bytes());
        buf.extend_from_slice(&note.note_type.to_le_bytes());
        buf.extend_from_slice(&note.name);
        pad(&mut buf);
        buf.extend_from_slice(&note.desc);
        pad(&mut buf);
    }
    buf
}

fuzz_target!(|input: FuzzInput| {
    let mut buf = encode(&input.notes);
    let encoded_len = buf.len();
    buf.extend_from_slice(&input.trailer);

    let mut iter = NoteIter::new(&buf);
    for note in &input.notes {
        let parsed = iter.next().expect("encoded note not yielded");
        assert_eq!(parsed.name(), note.name.as_slice());
        assert_eq!(parsed.desc(), note.desc.as_slice());
        assert_eq!(parsed.note_type(), note.note_type);
    }
    assert_eq!(iter.remaining(), &buf[encoded_len..]);

    // Whatever follows must not panic, and iteration ends for good.
    for _ in iter.by_ref() {}
    assert_eq!(iter.next().map(|n| n.note_type()), None);
});
