// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

#![no_main]

use codeobject::HsaCodeObject;
use libfuzzer_sys::{fuzz_target, Corpus};
use std::hint::black_box;

fuzz_target!(|data: &[u8]| -> Corpus {
    let Ok(co) = HsaCodeObject::read(data) else {
        return Corpus::Reject;
    };

    for note in co.notes() {
        let _ = black_box((note.name(), note.desc(), note.note_type()));
    }
    let _ = black_box(co.code_object_version());
    let _ = black_box(co.isa());
    let _ = black_box(co.section_index_by_name(".text"));

    let mut count = 0;
    for kernel in co.kernels() {
        let _ = black_box(co.kernel_name(&kernel));
        let _ = black_box(co.kernel_code(&kernel));
        let _ = black_box(co.kernel_extent(&kernel));
        let _ = black_box(co.kernel_descriptor(&kernel));
        assert_eq!(co.kernel_at(count), Some(kernel));
        count += 1;
    }
    assert_eq!(count, co.kernel_count());
    assert!(co.kernel_markers().windows(2).all(|w| w[0] < w[1]));

    Corpus::Keep
});
