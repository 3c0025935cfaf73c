//! Включение страничной адресации / Turning paging on
//!
//! Таблицы лежат в статической памяти ядра; загрузчик кладёт ядро
//! в нижние 4 МиБ, поэтому тождественное отображение покрывает его.
//! The tables live in static kernel memory; the loader places the kernel
//! in the low 4 MiB, so the identity map covers it.

use core::arch::asm;
use core::ptr::addr_of_mut;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::mm::vmm::{AddressSpaces, KernelSpace, UserSpaces};
use crate::mm::PhysAddr;

const CR0_PG: u32 = 0x8000_0000;

static mut KERNEL_SPACE: KernelSpace = KernelSpace::new();
static mut USER_SPACES: UserSpaces = UserSpaces::new();
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// # Safety
/// `root` должен указывать на корректный каталог, отображающий текущий код.
/// `root` must point at a valid directory that maps the running code.
pub unsafe fn load_root(root: PhysAddr) {
    unsafe { asm!("mov cr3, {}", in(reg) root.as_u32(), options(nostack, preserves_flags)) };
}

/// # Safety
/// CR3 должен быть уже загружен / CR3 must already be loaded
pub unsafe fn enable_paging() {
    unsafe {
        asm!(
            "mov {tmp}, cr0",
            "or {tmp}, {pg}",
            "mov cr0, {tmp}",
            tmp = out(reg) _,
            pg = const CR0_PG,
            options(nostack),
        );
    }
}

/// Построить пространство ядра и включить paging. Только один раз.
/// Build the kernel space and enable paging. Once only.
pub fn init() -> Option<AddressSpaces> {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        log::warn!("mm: paging already initialized");
        return None;
    }

    // SAFETY: флаг выше гарантирует единственную ссылку на статики.
    // SAFETY: the flag above guarantees a single reference to the statics.
    let (kernel, users) = unsafe { (&mut *addr_of_mut!(KERNEL_SPACE), &mut *addr_of_mut!(USER_SPACES)) };
    kernel.build();

    unsafe {
        load_root(kernel.root());
        enable_paging();
    }
    log::info!("mm: paging enabled");

    Some(AddressSpaces::new(kernel, users))
}
