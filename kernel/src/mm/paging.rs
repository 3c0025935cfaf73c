//! Формат 32-битных таблиц страниц (без PAE).
//! 32-bit page table format (non-PAE).
//!
//! Каталог и таблица имеют одинаковый вид: 1024 записи по 4 байта,
//! выровненные на 4 КиБ.
//! A directory and a table look the same: 1024 four-byte entries,
//! aligned to 4 KiB.

use core::ops::{Index, IndexMut};

use bitflags::bitflags;

use super::PhysAddr;
use crate::config::ENTRIES_PER_TABLE;

bitflags! {
    /// Флаги страницы / Page flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        const PRESENT       = 1 << 0;
        const WRITABLE      = 1 << 1;
        const USER          = 1 << 2;
        const WRITE_THROUGH = 1 << 3;
        const NO_CACHE      = 1 << 4;
        const ACCESSED      = 1 << 5;
        const DIRTY         = 1 << 6;
        /// 4 МиБ страница в каталоге / 4 MiB page in a directory
        const HUGE          = 1 << 7;
        const GLOBAL        = 1 << 8;
    }
}

impl PageFlags {
    /// Ядро: присутствует + запись / Kernel: present + writable
    pub const KERNEL: Self = Self::PRESENT.union(Self::WRITABLE);
    /// Пользователь: присутствует + запись + user / User: present + writable + user
    pub const USER_RW: Self = Self::KERNEL.union(Self::USER);
}

const ADDR_MASK: u32 = 0xFFFF_F000;

/// Запись каталога или таблицы / Directory or table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Entry(u32);

impl Entry {
    pub const EMPTY: Self = Self(0);

    pub const fn new(addr: PhysAddr, flags: PageFlags) -> Self {
        Self((addr.0 & ADDR_MASK) | flags.bits())
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn addr(self) -> PhysAddr {
        PhysAddr(self.0 & ADDR_MASK)
    }

    pub const fn flags(self) -> PageFlags {
        PageFlags::from_bits_truncate(self.0)
    }

    pub const fn is_present(self) -> bool {
        self.0 & PageFlags::PRESENT.bits() != 0
    }
}

/// Каталог или таблица страниц / Page directory or page table
#[repr(C, align(4096))]
pub struct PageTable {
    entries: [Entry; ENTRIES_PER_TABLE],
}

impl PageTable {
    pub const fn new() -> Self {
        Self { entries: [Entry::EMPTY; ENTRIES_PER_TABLE] }
    }

    pub fn clear(&mut self) {
        self.entries.fill(Entry::EMPTY);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for PageTable {
    type Output = Entry;
    fn index(&self, i: usize) -> &Entry {
        &self.entries[i]
    }
}

impl IndexMut<usize> for PageTable {
    fn index_mut(&mut self, i: usize) -> &mut Entry {
        &mut self.entries[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_keeps_frame_and_flags_apart() {
        let e = Entry::new(PhysAddr(0x0012_3456), PageFlags::USER_RW);
        assert_eq!(e.addr(), PhysAddr(0x0012_3000));
        assert_eq!(e.flags(), PageFlags::USER_RW);
        assert_eq!(e.raw(), 0x0012_3007);
        assert!(e.is_present());
    }

    #[test]
    fn kernel_flags_are_three() {
        assert_eq!(PageFlags::KERNEL.bits(), 0x3);
        assert_eq!(PageFlags::USER_RW.bits(), 0x7);
    }

    #[test]
    fn table_is_page_sized_and_aligned() {
        assert_eq!(core::mem::size_of::<PageTable>(), 4096);
        assert_eq!(core::mem::align_of::<PageTable>(), 4096);
    }

    #[test]
    fn new_table_has_nothing_present() {
        let t = PageTable::new();
        assert!(t.iter().all(|e| !e.is_present()));
    }
}
