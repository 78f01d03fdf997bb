// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

extern crate alloc;

use super::*;
use alloc::vec::Vec;

const TEXT_ADDR: u64 = 0x100;
const SHSTRTAB: &[u8] = b"\0.text\0.strtab\0.symtab\0.shstrtab\0";
const STRTAB: &[u8] = b"\0kern\0data\0";

fn push_hdr(buf: &mut Vec<u8>, machine: u16, shoff: u64, shnum: u16, shstrndx: u16) {
    buf.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 64, 1, 0, 0, 0, 0, 0, 0, 0]);
    buf.extend_from_slice(&Elf64Hdr::ET_DYN.to_le_bytes());
    buf.extend_from_slice(&machine.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes()); // e_version
    buf.extend_from_slice(&0u64.to_le_bytes()); // e_entry
    buf.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
    buf.extend_from_slice(&shoff.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    buf.extend_from_slice(&64u16.to_le_bytes()); // e_ehsize
    buf.extend_from_slice(&56u16.to_le_bytes()); // e_phentsize
    buf.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
    buf.extend_from_slice(&64u16.to_le_bytes()); // e_shentsize
    buf.extend_from_slice(&shnum.to_le_bytes());
    buf.extend_from_slice(&shstrndx.to_le_bytes());
}

#[allow(clippy::too_many_arguments)]
fn push_shdr(
    buf: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    entsize: u64,
) {
    buf.extend_from_slice(&name.to_le_bytes());
    buf.extend_from_slice(&sh_type.to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());
    buf.extend_from_slice(&addr.to_le_bytes());
    buf.extend_from_slice(&offset.to_le_bytes());
    buf.extend_from_slice(&size.to_le_bytes());
    buf.extend_from_slice(&link.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // sh_info
    buf.extend_from_slice(&4u64.to_le_bytes()); // sh_addralign
    buf.extend_from_slice(&entsize.to_le_bytes());
}

fn push_sym(buf: &mut Vec<u8>, name: u32, info: u8, shndx: u16, value: u64, size: u64) {
    buf.extend_from_slice(&name.to_le_bytes());
    buf.push(info);
    buf.push(0);
    buf.extend_from_slice(&shndx.to_le_bytes());
    buf.extend_from_slice(&value.to_le_bytes());
    buf.extend_from_slice(&size.to_le_bytes());
}

fn pad_to(buf: &mut Vec<u8>, align: usize) {
    while buf.len() % align != 0 {
        buf.push(0);
    }
}

/// Builds a small AMDGPU shared object with the sections
/// `[null, .text, .strtab, .symtab, .shstrtab]`.
fn build_image(text_size_override: Option<u64>) -> Vec<u8> {
    let mut buf = Vec::new();
    push_hdr(&mut buf, Elf64Hdr::EM_AMDGPU, 0, 5, 4);

    let text_off = buf.len() as u64;
    buf.extend_from_slice(&[0xbf; 16]);

    let strtab_off = buf.len() as u64;
    buf.extend_from_slice(STRTAB);
    pad_to(&mut buf, 8);

    let symtab_off = buf.len() as u64;
    push_sym(&mut buf, 0, 0, 0, 0, 0);
    push_sym(
        &mut buf,
        1,
        Elf64Sym::make_info(Elf64Sym::STB_GLOBAL, Elf64Sym::STT_AMDGPU_HSA_KERNEL),
        1,
        TEXT_ADDR,
        16,
    );
    push_sym(
        &mut buf,
        6,
        Elf64Sym::make_info(Elf64Sym::STB_LOCAL, Elf64Sym::STT_OBJECT),
        0xfff1,
        0,
        0,
    );
    let symtab_size = buf.len() as u64 - symtab_off;

    let shstrtab_off = buf.len() as u64;
    buf.extend_from_slice(SHSTRTAB);
    pad_to(&mut buf, 8);

    let shoff = buf.len() as u64;
    let text_flags = (Elf64ShdrFlags::ALLOC | Elf64ShdrFlags::EXECINSTR).bits();
    push_shdr(&mut buf, 0, Elf64Shdr::SHT_NULL, 0, 0, 0, 0, 0, 0);
    push_shdr(
        &mut buf,
        1,
        Elf64Shdr::SHT_PROGBITS,
        text_flags,
        TEXT_ADDR,
        text_off,
        text_size_override.unwrap_or(16),
        0,
        0,
    );
    push_shdr(
        &mut buf,
        7,
        Elf64Shdr::SHT_STRTAB,
        0,
        0,
        strtab_off,
        STRTAB.len() as u64,
        0,
        0,
    );
    push_shdr(
        &mut buf,
        15,
        Elf64Shdr::SHT_SYMTAB,
        0,
        0,
        symtab_off,
        symtab_size,
        2,
        24,
    );
    push_shdr(
        &mut buf,
        23,
        Elf64Shdr::SHT_STRTAB,
        0,
        0,
        shstrtab_off,
        SHSTRTAB.len() as u64,
        0,
        0,
    );

    buf[40..48].copy_from_slice(&shoff.to_le_bytes());
    buf
}

#[test]
fn test_elf64_shdr_verify_methods() {
    // Create a valid Elf64Shdr instance for testing.
    let valid_shdr = Elf64Shdr {
        sh_name: 1,
        sh_type: Elf64Shdr::SHT_PROGBITS,
        sh_flags: Elf64ShdrFlags::ALLOC | Elf64ShdrFlags::EXECINSTR,
        sh_addr: 0x1000,
        sh_offset: 0x2000,
        sh_size: 0x3000,
        sh_link: 0,
        sh_info: 0,
        sh_addralign: 256,
        sh_entsize: 0,
    };
    assert!(valid_shdr.verify().is_ok());
    assert!(valid_shdr.is_executable());

    // A non power of two alignment is rejected.
    let invalid_shdr = Elf64Shdr {
        sh_addralign: 7,
        ..valid_shdr
    };
    assert_eq!(
        invalid_shdr.verify(),
        Err(ElfError::InvalidAddressAlignment)
    );

    // An allocated section wrapping around the address space is rejected.
    let wrapping_shdr = Elf64Shdr {
        sh_addr: u64::MAX - 0xff,
        sh_addralign: 0,
        ..valid_shdr
    };
    assert_eq!(wrapping_shdr.verify(), Err(ElfError::InvalidAddressRange));

    // SHT_NOBITS sections occupy no file content.
    let bss = Elf64Shdr {
        sh_type: Elf64Shdr::SHT_NOBITS,
        ..valid_shdr
    };
    assert!(bss.file_range().unwrap().is_empty());
}

#[test]
fn test_elf64_addr_range_methods() {
    let addr_range = Elf64AddrRange {
        vaddr_begin: 0x1000,
        vaddr_end: 0x2000,
    };
    assert_eq!(addr_range.len(), 0x1000);
    assert!(!addr_range.is_empty());

    let valid_addr_range = Elf64AddrRange::try_from((0x1000, 0x2000)).unwrap();
    assert_eq!(valid_addr_range.vaddr_begin, 0x1000);
    assert_eq!(valid_addr_range.vaddr_end, 0x3000);

    assert!(addr_range.contains(&Elf64AddrRange::try_from((0x1000, 0x1000)).unwrap()));
    assert!(addr_range.contains(&Elf64AddrRange::try_from((0x2000, 0)).unwrap()));
    assert!(!addr_range.contains(&Elf64AddrRange::try_from((0xfff, 0x10)).unwrap()));
    assert!(!addr_range.contains(&Elf64AddrRange::try_from((0x1ff0, 0x11)).unwrap()));

    assert_eq!(
        Elf64AddrRange::try_from((u64::MAX, 1)),
        Err(ElfError::InvalidAddressRange)
    );
}

#[test]
fn test_elf64_file_range_try_from() {
    // Valid range
    let valid_range: (Elf64Off, Elf64Xword) = (0, 100);
    let result: Result<Elf64FileRange, ElfError> = valid_range.try_into();
    let file_range = result.unwrap();
    assert_eq!(file_range.offset_begin, 0);
    assert_eq!(file_range.offset_end, 100);
    assert_eq!(file_range.len(), 100);

    // Invalid range (overflow)
    let invalid_range: (Elf64Off, Elf64Xword) = (usize::MAX as Elf64Off, 100);
    let result: Result<Elf64FileRange, ElfError> = invalid_range.try_into();
    assert_eq!(result, Err(ElfError::InvalidFileRange));
}

#[test]
fn test_elf64_hdr_read() {
    let image = build_image(None);
    let elf_hdr = Elf64Hdr::read(&image).unwrap();
    assert_eq!(elf_hdr.e_type, Elf64Hdr::ET_DYN);
    assert_eq!(elf_hdr.e_machine, Elf64Hdr::EM_AMDGPU);
    assert_eq!(elf_hdr.e_version, Elf64Hdr::EV_CURRENT);
    assert_eq!(elf_hdr.os_abi(), Elf64Hdr::ELFOSABI_AMDGPU_HSA);
    assert_eq!(elf_hdr.abi_version(), 1);
    assert_eq!(elf_hdr.e_shnum, 5);
    assert_eq!(elf_hdr.e_shstrndx, 4);

    assert_eq!(Elf64Hdr::read(&image[..10]), Err(ElfError::FileTooShort));
    assert_eq!(Elf64Hdr::read(&image[..40]), Err(ElfError::FileTooShort));

    let mut bad_magic = image.clone();
    bad_magic[1] = b'X';
    assert_eq!(Elf64Hdr::read(&bad_magic), Err(ElfError::UnrecognizedMagic));

    let mut class32 = image.clone();
    class32[4] = 1;
    assert_eq!(Elf64Hdr::read(&class32), Err(ElfError::UnsupportedClass));

    let mut big_endian = image.clone();
    big_endian[5] = 2;
    assert_eq!(
        Elf64Hdr::read(&big_endian),
        Err(ElfError::UnsupportedEndianess)
    );

    let mut x86 = image.clone();
    x86[18..20].copy_from_slice(&62u16.to_le_bytes());
    assert_eq!(Elf64Hdr::read(&x86), Err(ElfError::UnsupportedMachine));

    let mut core_file = image;
    core_file[16..18].copy_from_slice(&4u16.to_le_bytes());
    assert_eq!(Elf64Hdr::read(&core_file), Err(ElfError::UnsupportedType));
}

#[test]
fn test_elf64_file_read_sections() {
    let image = build_image(None);
    let elf = Elf64File::read(&image).unwrap();
    assert_eq!(elf.shnum(), 5);

    let names: Vec<&[u8]> = elf
        .shdrs_iter()
        .map(|(_, shdr)| elf.section_name(&shdr).unwrap().to_bytes())
        .collect();
    assert_eq!(
        names,
        [
            &b""[..],
            &b".text"[..],
            &b".strtab"[..],
            &b".symtab"[..],
            &b".shstrtab"[..]
        ]
    );

    let text = elf.shdr(1).unwrap();
    assert!(text.is_executable());
    assert_eq!(text.sh_addr, TEXT_ADDR);
    assert_eq!(elf.section_data(&text).unwrap(), &[0xbf; 16]);
    assert_eq!(elf.shdr(5), Err(ElfError::InvalidSectionIndex));

    let range = text.file_range().unwrap();
    assert_eq!(elf.file_bytes(range).unwrap(), &[0xbf; 16]);
    let past_end = Elf64FileRange {
        offset_begin: image.len() - 4,
        offset_end: image.len() + 4,
    };
    assert_eq!(elf.file_bytes(past_end), Err(ElfError::InvalidFileRange));
}

#[test]
fn test_elf64_file_read_symbols() {
    let image = build_image(None);
    let elf = Elf64File::read(&image).unwrap();

    let symtab = elf.symtab().unwrap();
    assert_eq!(symtab.len(), 3);
    assert_eq!(symtab.read_sym(3), Err(ElfError::InvalidSymbolIndex));

    let syms: Vec<Elf64Sym> = elf.syms_iter().collect();
    assert_eq!(syms.len(), 3);
    assert_eq!(syms[1].st_type(), Elf64Sym::STT_AMDGPU_HSA_KERNEL);
    assert_eq!(syms[1].st_bind(), Elf64Sym::STB_GLOBAL);
    assert_eq!(syms[1].st_value, TEXT_ADDR);
    assert_eq!(elf.symbol_name(&syms[1]).unwrap().to_bytes(), b"kern");
    assert_eq!(syms[2].st_type(), Elf64Sym::STT_OBJECT);
    assert_eq!(elf.symbol_name(&syms[2]).unwrap().to_bytes(), b"data");

    // A copied iterator replays the same sequence.
    let mut iter = elf.syms_iter();
    iter.next();
    let snapshot = iter;
    assert_eq!(iter.position(), 1);
    assert_eq!(iter.collect::<Vec<_>>(), snapshot.collect::<Vec<_>>());
}

#[test]
fn test_elf64_file_read_rejects_corruption() {
    // Section content extending past the end of the file.
    let image = build_image(Some(0x10000));
    assert_eq!(Elf64File::read(&image), Err(ElfError::FileTooShort));

    // Section header table cut off.
    let image = build_image(None);
    assert_eq!(
        Elf64File::read(&image[..image.len() - 1]),
        Err(ElfError::FileTooShort)
    );

    // Section name string table index out of range.
    let mut image = build_image(None);
    image[62..64].copy_from_slice(&5u16.to_le_bytes());
    assert_eq!(Elf64File::read(&image), Err(ElfError::InvalidSectionIndex));

    // Section link one past the last section header.
    let mut image = build_image(None);
    let shoff = u64::from_le_bytes(image[40..48].try_into().unwrap()) as usize;
    let text_link = shoff + Elf64Shdr::SIZE + 40;
    image[text_link..text_link + 4].copy_from_slice(&5u32.to_le_bytes());
    assert_eq!(Elf64File::read(&image), Err(ElfError::InvalidSectionIndex));
    image[text_link..text_link + 4].copy_from_slice(&4u32.to_le_bytes());
    assert!(Elf64File::read(&image).is_ok());

    // Section name string table index pointing at a non-strtab section.
    let mut image = build_image(None);
    image[62..64].copy_from_slice(&1u16.to_le_bytes());
    assert_eq!(
        Elf64File::read(&image),
        Err(ElfError::IncompatibleSectionType)
    );
}

#[test]
fn test_elf64_file_without_sections() {
    let mut image = Vec::new();
    push_hdr(&mut image, Elf64Hdr::EM_AMDGPU, 0, 0, 0);
    let elf = Elf64File::read(&image).unwrap();
    assert_eq!(elf.shnum(), 0);
    assert!(elf.symtab().is_none());
    assert_eq!(elf.syms_iter().count(), 0);
    assert_eq!(elf.shdrs_iter().count(), 0);
}

#[test]
fn test_elf64_strtab_get_str() {
    let strtab = Elf64Strtab::new(b"\0abc\0def");
    assert_eq!(strtab.get_str(0).unwrap().to_bytes(), b"");
    assert_eq!(strtab.get_str(1).unwrap().to_bytes(), b"abc");
    assert_eq!(strtab.get_str(2).unwrap().to_bytes(), b"bc");
    // Unterminated string at the end of the table.
    assert_eq!(strtab.get_str(5), Err(ElfError::InvalidStrtabString));
    assert_eq!(strtab.get_str(8), Err(ElfError::InvalidStrtabString));
    assert_eq!(strtab.get_str(100), Err(ElfError::InvalidStrtabString));
}

#[test]
fn test_elf64_symtab_new() {
    let buf = [0u8; 50];
    assert_eq!(
        Elf64Symtab::new(&buf, 16),
        Err(ElfError::InvalidSymbolEntrySize)
    );
    // Trailing partial entries are ignored.
    let symtab = Elf64Symtab::new(&buf, 24).unwrap();
    assert_eq!(symtab.len(), 2);
    assert_eq!(symtab.iter().count(), 2);
    assert!(Elf64Symtab::new(&[], 24).unwrap().is_empty());
}
