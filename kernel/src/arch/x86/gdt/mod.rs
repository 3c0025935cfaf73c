//! Global Descriptor Table (GDT) - i686
//!
//! Плоская модель: все сегменты с базой 0 и лимитом 4 ГиБ.
//! Flat model: every segment has base 0 and a 4 GiB limit.
//!
//!  Индекс / Index  Сегмент / Segment
//!  ─────────────────────────────────
//!  0               Null descriptor (обязателен / required)
//!  1               Kernel Code  (ring 0, execute)
//!  2               Kernel Data  (ring 0, read/write)
//!  3               User Code    (ring 3, execute)
//!  4               User Data    (ring 3, read/write)
//!  5               TSS          (esp0 для входа из ring 3 / esp0 for ring 3 entry)

use core::mem::size_of;

// ── Селекторы сегментов / Segment selectors ───────────────────────────────────
pub const KERNEL_CODE: u16 = 0x08;
pub const KERNEL_DATA: u16 = 0x10;
pub const USER_CODE:   u16 = 0x1B;
pub const USER_DATA:   u16 = 0x23;
pub const TSS_SEL:     u16 = 0x28;

// ── Байты доступа / Access bytes ─────────────────────────────────────────────
const KERNEL_CODE_ACCESS: u8 = 0x9A;
const KERNEL_DATA_ACCESS: u8 = 0x92;
const USER_CODE_ACCESS:   u8 = 0xFA;
const USER_DATA_ACCESS:   u8 = 0xF2;
/// Present, 32-bit available TSS
const TSS_ACCESS:         u8 = 0x89;

/// Гранулярность 4 КиБ + 32-битный сегмент / 4 KiB granularity + 32-bit segment
const FLAT_FLAGS: u8 = 0xC;

/// Закодировать 8-байтовый дескриптор сегмента.
/// Encode an 8-byte segment descriptor.
pub const fn descriptor(base: u32, limit: u32, access: u8, flags: u8) -> u64 {
    let mut d = (limit & 0xFFFF) as u64;
    d |= ((base & 0x00FF_FFFF) as u64) << 16;
    d |= (access as u64) << 40;
    d |= (((limit >> 16) & 0xF) as u64) << 48;
    d |= ((flags & 0xF) as u64) << 52;
    d |= ((base >> 24) as u64) << 56;
    d
}

/// TSS - хранит стек ядра для переключения привилегий.
/// TSS - stores the kernel stack for privilege level switches.
#[repr(C)]
pub struct Tss {
    link:           u32,
    /// Стек ядра для прерываний из ring 3 / Kernel stack for ring 3 interrupts
    pub esp0:       u32,
    pub ss0:        u32,
    unused:         [u32; 22],
    trap:           u16,
    pub iomap_base: u16,
}

impl Tss {
    pub const fn new() -> Self {
        Self {
            link: 0,
            esp0: 0,
            ss0: KERNEL_DATA as u32,
            unused: [0; 22],
            trap: 0,
            // Карты ввода-вывода нет / No I/O map
            iomap_base: size_of::<Tss>() as u16,
        }
    }
}

impl Default for Tss {
    fn default() -> Self {
        Self::new()
    }
}

pub const GDT_ENTRIES: usize = 6;

/// Таблица для адреса TSS / The table for a given TSS address
pub const fn table(tss_addr: u32) -> [u64; GDT_ENTRIES] {
    [
        0,
        descriptor(0, 0xF_FFFF, KERNEL_CODE_ACCESS, FLAT_FLAGS),
        descriptor(0, 0xF_FFFF, KERNEL_DATA_ACCESS, FLAT_FLAGS),
        descriptor(0, 0xF_FFFF, USER_CODE_ACCESS, FLAT_FLAGS),
        descriptor(0, 0xF_FFFF, USER_DATA_ACCESS, FLAT_FLAGS),
        descriptor(tss_addr, size_of::<Tss>() as u32 - 1, TSS_ACCESS, 0),
    ]
}

#[cfg(target_arch = "x86")]
mod load {
    use core::ptr::addr_of_mut;

    use super::*;

    #[repr(C, packed)]
    struct GdtDescriptor {
        size:   u16,
        offset: u32,
    }

    /// Стек ядра для прерываний из userspace (16KB).
    /// Kernel interrupt stack for userspace interrupts (16KB).
    #[repr(align(16))]
    struct KernelStack([u8; 16 * 1024]);

    static mut KERNEL_STACK: KernelStack = KernelStack([0; 16 * 1024]);
    static mut TSS: Tss = Tss::new();
    static mut GDT: [u64; GDT_ENTRIES] = [0; GDT_ENTRIES];

    /// Инициализировать и загрузить GDT + TSS.
    /// Initialize and load GDT + TSS.
    pub fn init() {
        unsafe {
            let stack = addr_of_mut!(KERNEL_STACK);
            let tss = addr_of_mut!(TSS);
            let gdt = addr_of_mut!(GDT);

            // 1. Вершина стека ядра → TSS.esp0
            (*tss).esp0 = stack.add(1) as u32;

            // 2. GDT с правильным адресом TSS
            *gdt = table(tss as u32);

            // 3. Загрузить GDTR
            let descriptor = GdtDescriptor {
                size:   (size_of::<[u64; GDT_ENTRIES]>() - 1) as u16,
                offset: gdt as u32,
            };

            core::arch::asm!(
                "lgdt [{desc}]",
                // Обновить регистры данных / Update data registers
                "mov ax, {kdata}",
                "mov ds, ax",
                "mov es, ax",
                "mov fs, ax",
                "mov gs, ax",
                "mov ss, ax",
                // Обновить CS через far return / Update CS via far return
                "push {kcode}",
                "lea eax, [2f]",
                "push eax",
                "retf",
                "2:",
                // Загрузить TSS / Load TSS
                "ltr {tss:x}",
                desc  = in(reg) &descriptor,
                kcode = const KERNEL_CODE as u32,
                kdata = const KERNEL_DATA,
                tss   = in(reg) TSS_SEL,
                out("eax") _,
            );
        }
        log::info!("gdt: loaded, tss at {:#x}", TSS_SEL);
    }
}

#[cfg(target_arch = "x86")]
pub use load::init;
