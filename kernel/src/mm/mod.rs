//! Memory Management subsystem
//!
//! Два уровня / Two layers:
//!   paging - формат записей каталога и таблиц / directory and table entry format
//!   vmm    - ядро и пользовательские адресные пространства / kernel and user spaces
//!
//! Динамической памяти нет: все таблицы статические.
//! There is no dynamic memory: every table is static.

pub mod paging;
pub mod vmm;

use crate::config::PAGE_SIZE;

/// Физический адрес / Physical address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct PhysAddr(pub u32);

/// Виртуальный адрес / Virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct VirtAddr(pub u32);

impl PhysAddr {
    pub const fn new(addr: u32) -> Self { Self(addr) }
    pub const fn as_u32(self) -> u32   { self.0 }

    pub const fn offset(self, bytes: u32) -> Self {
        Self(self.0 + bytes)
    }
}

impl VirtAddr {
    pub const fn new(addr: u32) -> Self { Self(addr) }
    pub const fn as_u32(self) -> u32   { self.0 }

    /// Индекс в каталоге страниц (биты 22–31) / Page directory index (bits 22–31)
    pub const fn directory_index(self) -> usize {
        (self.0 >> 22) as usize
    }

    /// Индекс в таблице страниц (биты 12–21) / Page table index (bits 12–21)
    pub const fn table_index(self) -> usize {
        ((self.0 >> 12) & 0x3FF) as usize
    }

    pub const fn page_offset(self) -> u32 {
        self.0 & (PAGE_SIZE - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virt_addr_splits_into_indices() {
        let v = VirtAddr::new(0xC00B_8123);
        assert_eq!(v.directory_index(), 768);
        assert_eq!(v.table_index(), 0xB8);
        assert_eq!(v.page_offset(), 0x123);
    }
}
