//! Сырой вход в ядро / Raw kernel entry

use core::arch::asm;

use crate::abi::Syscall;

/// Выполнить `int 0x80` с тремя аргументами.
/// Issue `int 0x80` with three arguments.
///
/// # Safety
/// Указатели в аргументах должны быть валидны для этого вызова.
/// Pointer arguments must be valid for the given call.
#[inline(always)]
pub unsafe fn syscall3(call: Syscall, arg1: u32, arg2: u32, arg3: u32) -> i32 {
    let ret: i32;
    unsafe {
        asm!(
            "int 0x80",
            inlateout("eax") call.number() => ret,
            in("ebx") arg1,
            in("ecx") arg2,
            in("edx") arg3,
        );
    }
    ret
}

#[inline(always)]
pub unsafe fn syscall1(call: Syscall, arg1: u32) -> i32 {
    unsafe { syscall3(call, arg1, 0, 0) }
}

#[inline(always)]
pub unsafe fn syscall0(call: Syscall) -> i32 {
    unsafe { syscall3(call, 0, 0, 0) }
}
