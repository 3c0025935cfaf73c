//! x86 (i686) platform initialization

pub mod gdt;
pub mod idt;

#[cfg(target_arch = "x86")]
pub mod cpu;
#[cfg(target_arch = "x86")]
pub mod mm;
#[cfg(target_arch = "x86")]
pub mod port;
#[cfg(target_arch = "x86")]
pub mod user;

/// x86 init sequence
///
/// Возвращает адресные пространства; `None` при повторном вызове.
/// Returns the address spaces; `None` on a repeated call.
#[cfg(target_arch = "x86")]
pub fn init() -> Option<crate::mm::vmm::AddressSpaces> {
    gdt::init();   // Global Descriptor Table + TSS
    idt::install(); // IDT + PIC, прерывания включены / interrupts enabled
    mm::init()     // Page tables (identity map + 0xC000_0000 window)
}
