//! Входные заглушки прерываний / Interrupt entry stubs
//!
//! Каждая заглушка кладёт код ошибки (фиктивный, если CPU его не кладёт)
//! и номер вектора, затем общий путь сохраняет регистры и вызывает
//! `trap_dispatch(&mut TrapFrame)`.
//! Each stub pushes an error code (a dummy one if the CPU does not) and
//! the vector number, then the common path saves the registers and calls
//! `trap_dispatch(&mut TrapFrame)`.

use core::arch::global_asm;

use super::Handlers;

global_asm!(
    ".pushsection .text",

    ".global isr_default",
    "isr_default:",
    "    push 0",
    "    push 0xFF",
    "    jmp isr_common",

    // Double fault: CPU уже положил код ошибки / the CPU already pushed an error code
    ".global isr_double_fault",
    "isr_double_fault:",
    "    push 0x08",
    "    jmp isr_common",

    ".global isr_timer",
    "isr_timer:",
    "    push 0",
    "    push 0x20",
    "    jmp isr_common",

    ".global isr_keyboard",
    "isr_keyboard:",
    "    push 0",
    "    push 0x21",
    "    jmp isr_common",

    ".global isr_syscall",
    "isr_syscall:",
    "    push 0",
    "    push 0x80",
    "    jmp isr_common",

    "isr_common:",
    "    pushad",
    "    push esp",
    "    call {dispatch}",
    "    add esp, 4",
    "    popad",
    "    add esp, 8",
    "    iretd",

    ".popsection",
    dispatch = sym super::handlers::trap_dispatch,
);

extern "C" {
    fn isr_default();
    fn isr_double_fault();
    fn isr_timer();
    fn isr_keyboard();
    fn isr_syscall();
}

/// Адреса заглушек для заполнения IDT / Stub addresses for filling the IDT
pub fn handlers() -> Handlers {
    Handlers {
        default:      isr_default as usize as u32,
        double_fault: isr_double_fault as usize as u32,
        timer:        isr_timer as usize as u32,
        keyboard:     isr_keyboard as usize as u32,
        syscall:      isr_syscall as usize as u32,
    }
}
