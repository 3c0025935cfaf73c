//! Порты ввода-вывода / I/O ports

use core::arch::asm;

/// # Safety
/// Запись в порт может иметь любые побочные эффекты на устройство.
/// A port write may have any side effect on the device.
#[inline]
pub unsafe fn outb(port: u16, val: u8) {
    unsafe { asm!("out dx, al", in("dx") port, in("al") val, options(nomem, nostack, preserves_flags)) };
}

/// # Safety
/// Чтение порта может менять состояние устройства.
/// A port read may change device state.
#[inline]
pub unsafe fn inb(port: u16) -> u8 {
    let val: u8;
    unsafe { asm!("in al, dx", out("al") val, in("dx") port, options(nomem, nostack, preserves_flags)) };
    val
}

/// Короткая пауза для медленных устройств (запись в порт 0x80).
/// Short delay for slow devices (write to port 0x80).
#[inline]
pub fn io_wait() {
    unsafe { outb(0x80, 0) };
}
