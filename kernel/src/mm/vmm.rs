//! Virtual Memory Manager
//!
//! Управляет адресными пространствами: одно пространство ядра и арена
//! пользовательских пространств, по одному на слот таблицы процессов.
//! Manages address spaces: one kernel space and an arena of user spaces,
//! one per process table slot.
//!
//! Ядро работает в тождественном отображении нижних 4 МиБ, поэтому
//! физический адрес таблицы равен её виртуальному адресу.
//! The kernel runs identity-mapped in the low 4 MiB, so the physical
//! address of a table equals its virtual address.

use log::{debug, info};

use super::paging::{Entry, PageFlags, PageTable};
use super::{PhysAddr, VirtAddr};
use crate::config::{
    ENTRIES_PER_TABLE, KERNEL_BASE, MAX_PROCESSES, PAGE_SIZE, USER_BASE, VGA_BUFFER,
};

/// Индекс окна ядра в каталоге / Kernel window index in the directory
pub const KERNEL_PDE_INDEX: usize = VirtAddr::new(KERNEL_BASE).directory_index();

/// Физический адрес таблицы в тождественном отображении.
/// Physical address of a table under the identity mapping.
pub fn phys_of(table: &PageTable) -> PhysAddr {
    PhysAddr(table as *const PageTable as usize as u32)
}

/// Дескриптор адресного пространства, хранимый в юните.
/// Address space handle stored in an execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpace {
    Kernel { root: PhysAddr },
    User   { root: PhysAddr, slot: usize },
}

impl AddressSpace {
    /// Физический адрес каталога (значение для CR3)
    /// Physical address of the directory (the CR3 value)
    pub const fn root(self) -> PhysAddr {
        match self {
            Self::Kernel { root } | Self::User { root, .. } => root,
        }
    }
}

// ── Kernel space ─────────────────────────────────────────────────────────────

/// Каталог ядра и его единственная таблица.
/// The kernel directory and its single table.
pub struct KernelSpace {
    directory: PageTable,
    low:       PageTable,
}

impl KernelSpace {
    pub const fn new() -> Self {
        Self { directory: PageTable::new(), low: PageTable::new() }
    }

    /// Строит тождественное отображение 4 МиБ и окно по 0xC000_0000.
    /// Builds the 4 MiB identity map and the alias at 0xC000_0000.
    pub fn build(&mut self) {
        self.directory.clear();
        for i in 0..ENTRIES_PER_TABLE {
            let frame = PhysAddr(i as u32 * PAGE_SIZE);
            self.low[i] = Entry::new(frame, PageFlags::KERNEL);
        }

        // Текстовый буфер VGA должен остаться доступным после включения paging
        // The VGA text buffer must stay reachable once paging is on
        let vga = VirtAddr::new(VGA_BUFFER);
        self.low[vga.table_index()] = Entry::new(PhysAddr(VGA_BUFFER), PageFlags::KERNEL);

        let low = Entry::new(phys_of(&self.low), PageFlags::KERNEL);
        self.directory[0] = low;
        self.directory[KERNEL_PDE_INDEX] = low;

        info!("vmm: kernel directory at {:#010x}", self.root().0);
    }

    pub fn root(&self) -> PhysAddr {
        phys_of(&self.directory)
    }

    pub fn handle(&self) -> AddressSpace {
        AddressSpace::Kernel { root: self.root() }
    }

    /// Запись каталога, общая для всех пространств
    /// The directory entry shared by every space
    pub fn shared_entry(&self) -> Entry {
        self.directory[KERNEL_PDE_INDEX]
    }

    pub fn translate(&self, virt: VirtAddr) -> Option<PhysAddr> {
        let pde = self.directory[virt.directory_index()];
        if !pde.is_present() || pde.addr() != phys_of(&self.low) {
            return None;
        }
        walk(&self.low, virt)
    }
}

impl Default for KernelSpace {
    fn default() -> Self {
        Self::new()
    }
}

fn walk(table: &PageTable, virt: VirtAddr) -> Option<PhysAddr> {
    let pte = table[virt.table_index()];
    pte.is_present().then(|| pte.addr().offset(virt.page_offset()))
}

// ── User spaces ──────────────────────────────────────────────────────────────

struct UserSpace {
    directory: PageTable,
    table:     PageTable,
}

impl UserSpace {
    const fn new() -> Self {
        Self { directory: PageTable::new(), table: PageTable::new() }
    }

    fn build(&mut self, shared: Entry) {
        self.directory.clear();
        for i in 0..ENTRIES_PER_TABLE {
            let frame = PhysAddr(USER_BASE + i as u32 * PAGE_SIZE);
            self.table[i] = Entry::new(frame, PageFlags::USER_RW);
        }
        self.directory[0] = Entry::new(phys_of(&self.table), PageFlags::USER_RW);
        self.directory[KERNEL_PDE_INDEX] = shared;
    }
}

/// Арена пользовательских пространств, индексируемая слотом.
/// Arena of user spaces indexed by slot.
pub struct UserSpaces {
    spaces: [UserSpace; MAX_PROCESSES],
    used:   [bool; MAX_PROCESSES],
}

impl UserSpaces {
    pub const fn new() -> Self {
        const EMPTY: UserSpace = UserSpace::new();
        Self { spaces: [EMPTY; MAX_PROCESSES], used: [false; MAX_PROCESSES] }
    }

    pub fn create(&mut self, kernel: &KernelSpace) -> Option<AddressSpace> {
        let slot = self.used.iter().position(|used| !used)?;
        let space = &mut self.spaces[slot];
        space.build(kernel.shared_entry());
        self.used[slot] = true;

        let root = phys_of(&space.directory);
        debug!("vmm: user space {} at {:#010x}", slot, root.0);
        Some(AddressSpace::User { root, slot })
    }

    pub fn release(&mut self, slot: usize) {
        if let Some(used) = self.used.get_mut(slot) {
            *used = false;
        }
    }

    pub fn in_use(&self) -> usize {
        self.used.iter().filter(|used| **used).count()
    }

    pub fn translate(&self, slot: usize, kernel: &KernelSpace, virt: VirtAddr)
        -> Option<PhysAddr>
    {
        if !*self.used.get(slot)? {
            return None;
        }
        let space = &self.spaces[slot];
        match virt.directory_index() {
            0 => walk(&space.table, virt),
            KERNEL_PDE_INDEX => kernel.translate(virt),
            _ => None,
        }
    }
}

impl Default for UserSpaces {
    fn default() -> Self {
        Self::new()
    }
}

// ── Allocator seam ───────────────────────────────────────────────────────────

/// Источник адресных пространств для таблицы процессов.
/// Source of address spaces for the process table.
pub trait SpaceAllocator {
    fn kernel_space(&self) -> AddressSpace;
    fn create_user_space(&mut self) -> Option<AddressSpace>;
    fn release(&mut self, space: AddressSpace);
}

/// Все адресные пространства ядра / Every address space of the kernel
pub struct AddressSpaces {
    kernel: &'static KernelSpace,
    users:  &'static mut UserSpaces,
}

impl AddressSpaces {
    pub fn new(kernel: &'static KernelSpace, users: &'static mut UserSpaces) -> Self {
        Self { kernel, users }
    }

    pub fn user_spaces_in_use(&self) -> usize {
        self.users.in_use()
    }

    pub fn translate(&self, space: AddressSpace, virt: VirtAddr) -> Option<PhysAddr> {
        match space {
            AddressSpace::Kernel { .. } => self.kernel.translate(virt),
            AddressSpace::User { slot, .. } => self.users.translate(slot, self.kernel, virt),
        }
    }
}

impl SpaceAllocator for AddressSpaces {
    fn kernel_space(&self) -> AddressSpace {
        self.kernel.handle()
    }

    fn create_user_space(&mut self) -> Option<AddressSpace> {
        self.users.create(self.kernel)
    }

    fn release(&mut self, space: AddressSpace) {
        if let AddressSpace::User { slot, .. } = space {
            self.users.release(slot);
        }
    }
}
