// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Builders for synthetic code objects used by the unit tests.

use alloc::vec::Vec;
use elf::{Elf64Hdr, Elf64Shdr, Elf64ShdrFlags, Elf64Sym};

/// Encodes one NOTE record, padding name and description to 4 bytes.
pub fn note_bytes(name: &[u8], desc: &[u8], note_type: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(desc.len() as u32).to_le_bytes());
    buf.extend_from_slice(&note_type.to_le_bytes());
    buf.extend_from_slice(name);
    pad_to(&mut buf, 4);
    buf.extend_from_slice(desc);
    pad_to(&mut buf, 4);
    buf
}

/// Encodes the description of an ISA note.
pub fn isa_desc(vendor: &[u8], arch: &[u8], major: u32, minor: u32, stepping: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(vendor.len() as u16).to_le_bytes());
    buf.extend_from_slice(&(arch.len() as u16).to_le_bytes());
    buf.extend_from_slice(&major.to_le_bytes());
    buf.extend_from_slice(&minor.to_le_bytes());
    buf.extend_from_slice(&stepping.to_le_bytes());
    buf.extend_from_slice(vendor);
    buf.extend_from_slice(arch);
    buf
}

fn pad_to(buf: &mut Vec<u8>, align: usize) {
    while buf.len() % align != 0 {
        buf.push(0);
    }
}

#[derive(Debug)]
struct SectionEntry {
    name: &'static str,
    sh_type: u32,
    flags: Elf64ShdrFlags,
    addr: u64,
    data: Vec<u8>,
    link: u32,
    entsize: u64,
}

#[derive(Debug)]
struct SymbolEntry {
    name: &'static str,
    info: u8,
    shndx: u16,
    value: u64,
    size: u64,
}

/// Assembles a little-endian ELF64 AMDGPU shared object. User sections get
/// indices starting at 1; `.symtab`, `.strtab` and `.shstrtab` are
/// appended by [`Self::build`].
#[derive(Debug, Default)]
pub struct CodeObjectBuilder {
    sections: Vec<SectionEntry>,
    symbols: Vec<SymbolEntry>,
}

impl CodeObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a section and returns its index.
    pub fn section(
        &mut self,
        name: &'static str,
        sh_type: u32,
        flags: Elf64ShdrFlags,
        addr: u64,
        data: &[u8],
    ) -> u16 {
        self.sections.push(SectionEntry {
            name,
            sh_type,
            flags,
            addr,
            data: data.to_vec(),
            link: 0,
            entsize: 0,
        });
        self.sections.len() as u16
    }

    pub fn text(&mut self, addr: u64, data: &[u8]) -> u16 {
        self.section(
            ".text",
            Elf64Shdr::SHT_PROGBITS,
            Elf64ShdrFlags::ALLOC | Elf64ShdrFlags::EXECINSTR,
            addr,
            data,
        )
    }

    pub fn data(&mut self, addr: u64, data: &[u8]) -> u16 {
        self.section(
            ".data",
            Elf64Shdr::SHT_PROGBITS,
            Elf64ShdrFlags::ALLOC | Elf64ShdrFlags::WRITE,
            addr,
            data,
        )
    }

    pub fn notes(&mut self, data: &[u8]) -> u16 {
        self.section(
            ".note",
            Elf64Shdr::SHT_NOTE,
            Elf64ShdrFlags::empty(),
            0,
            data,
        )
    }

    /// Adds a global symbol of type `typ`.
    pub fn symbol(
        &mut self,
        name: &'static str,
        typ: u8,
        shndx: u16,
        value: u64,
        size: u64,
    ) -> &mut Self {
        self.symbols.push(SymbolEntry {
            name,
            info: Elf64Sym::make_info(Elf64Sym::STB_GLOBAL, typ),
            shndx,
            value,
            size,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        // .symtab follows the user sections, then .strtab and .shstrtab.
        let strtab_idx = self.sections.len() as u32 + 2;
        let shstrtab_idx = strtab_idx + 1;

        let mut strtab = Vec::from(&b"\0"[..]);
        let mut symtab = Vec::from(&[0u8; 24][..]);
        for sym in &self.symbols {
            let name_off = strtab.len() as u32;
            strtab.extend_from_slice(sym.name.as_bytes());
            strtab.push(0);

            symtab.extend_from_slice(&name_off.to_le_bytes());
            symtab.push(sym.info);
            symtab.push(0);
            symtab.extend_from_slice(&sym.shndx.to_le_bytes());
            symtab.extend_from_slice(&sym.value.to_le_bytes());
            symtab.extend_from_slice(&sym.size.to_le_bytes());
        }

        let extra = [
            SectionEntry {
                name: ".symtab",
                sh_type: Elf64Shdr::SHT_SYMTAB,
                flags: Elf64ShdrFlags::empty(),
                addr: 0,
                data: symtab,
                link: strtab_idx,
                entsize: 24,
            },
            SectionEntry {
                name: ".strtab",
                sh_type: Elf64Shdr::SHT_STRTAB,
                flags: Elf64ShdrFlags::empty(),
                addr: 0,
                data: strtab,
                link: 0,
                entsize: 0,
            },
        ];

        let mut shstrtab = Vec::from(&b"\0"[..]);
        let mut name_offs = Vec::new();
        for name in self
            .sections
            .iter()
            .chain(extra.iter())
            .map(|s| s.name)
            .chain([".shstrtab"])
        {
            name_offs.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
        }

        let mut buf = Vec::new();
        buf.extend_from_slice(&[
            0x7f,
            b'E',
            b'L',
            b'F',
            2,
            1,
            1,
            Elf64Hdr::ELFOSABI_AMDGPU_HSA,
            1,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
        ]);
        buf.extend_from_slice(&Elf64Hdr::ET_DYN.to_le_bytes());
        buf.extend_from_slice(&Elf64Hdr::EM_AMDGPU.to_le_bytes());
        buf.extend_from_slice(&Elf64Hdr::EV_CURRENT.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes()); // e_entry
        buf.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
        buf.extend_from_slice(&0u64.to_le_bytes()); // e_shoff, patched below
        buf.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        buf.extend_from_slice(&64u16.to_le_bytes()); // e_ehsize
        buf.extend_from_slice(&56u16.to_le_bytes()); // e_phentsize
        buf.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
        buf.extend_from_slice(&64u16.to_le_bytes()); // e_shentsize
        buf.extend_from_slice(&((shstrtab_idx + 1) as u16).to_le_bytes());
        buf.extend_from_slice(&(shstrtab_idx as u16).to_le_bytes());

        // Section contents, each placed at an 8 byte aligned offset.
        let mut offsets = Vec::new();
        for data in self
            .sections
            .iter()
            .chain(extra.iter())
            .map(|s| s.data.as_slice())
            .chain([shstrtab.as_slice()])
        {
            pad_to(&mut buf, 8);
            offsets.push(buf.len() as u64);
            buf.extend_from_slice(data);
        }
        pad_to(&mut buf, 8);

        let shoff = buf.len() as u64;
        buf[40..48].copy_from_slice(&shoff.to_le_bytes());

        // Null section header.
        buf.extend_from_slice(&[0; 64]);
        let shstrtab_entry = SectionEntry {
            name: ".shstrtab",
            sh_type: Elf64Shdr::SHT_STRTAB,
            flags: Elf64ShdrFlags::empty(),
            addr: 0,
            data: shstrtab,
            link: 0,
            entsize: 0,
        };
        let entries = self
            .sections
            .iter()
            .chain(extra.iter())
            .chain([&shstrtab_entry]);
        for ((entry, name_off), offset) in entries.zip(name_offs).zip(offsets) {
            buf.extend_from_slice(&name_off.to_le_bytes());
            buf.extend_from_slice(&entry.sh_type.to_le_bytes());
            buf.extend_from_slice(&entry.flags.bits().to_le_bytes());
            buf.extend_from_slice(&entry.addr.to_le_bytes());
            buf.extend_from_slice(&offset.to_le_bytes());
            buf.extend_from_slice(&(entry.data.len() as u64).to_le_bytes());
            buf.extend_from_slice(&entry.link.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes()); // sh_info
            buf.extend_from_slice(&1u64.to_le_bytes()); // sh_addralign
            buf.extend_from_slice(&entry.entsize.to_le_bytes());
        }

        buf
    }
}
