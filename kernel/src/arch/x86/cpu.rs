//! Управление флагом IF и остановка CPU / IF flag control and CPU halt

use core::arch::asm;

const EFLAGS_IF: u32 = 1 << 9;

#[inline]
pub fn enable_interrupts() {
    unsafe { asm!("sti", options(nomem, nostack)) };
}

#[inline]
pub fn disable_interrupts() {
    unsafe { asm!("cli", options(nomem, nostack)) };
}

pub fn interrupts_enabled() -> bool {
    let eflags: u32;
    unsafe { asm!("pushfd", "pop {}", out(reg) eflags, options(nomem, preserves_flags)) };
    eflags & EFLAGS_IF != 0
}

/// Выполнить `f` с выключенными прерываниями и вернуть IF как был.
/// Run `f` with interrupts disabled and restore IF afterwards.
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    let was_enabled = interrupts_enabled();
    if was_enabled {
        disable_interrupts();
    }
    let ret = f();
    if was_enabled {
        enable_interrupts();
    }
    ret
}

/// Ждать следующего прерывания / Wait for the next interrupt
#[inline]
pub fn halt() {
    unsafe { asm!("hlt", options(nomem, nostack)) };
}

pub fn halt_forever() -> ! {
    loop {
        disable_interrupts();
        halt();
    }
}
