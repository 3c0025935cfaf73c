//! HAL - Hardware Abstraction Layer
//!
//! Только 32-битный x86. Чистая логика (кодирование IDT/GDT, маски PIC)
//! собирается и в тестах на хосте; всё, что содержит ассемблер, - только
//! под `target_arch = "x86"`.
//! 32-bit x86 only. Pure logic (IDT/GDT encoding, PIC masks) also builds
//! in host tests; everything that carries assembly is `target_arch = "x86"`
//! only.

#[cfg(any(target_arch = "x86", test))]
pub mod x86;

#[cfg(target_arch = "x86")]
pub use x86 as current;

/// Инициализация платформы - вызывается первой из kernel_main.
/// Platform initialization - called first from kernel_main.
#[cfg(target_arch = "x86")]
pub fn init() -> Option<crate::mm::vmm::AddressSpaces> {
    current::init()
}
