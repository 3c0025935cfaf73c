//! i686 boot entry point - Multiboot
//!
//! Загрузчик входит в `_start` в 32-битном защищённом режиме, paging
//! выключен, eax = магическое число, ebx = адрес multiboot info.
//! The loader enters `_start` in 32-bit protected mode with paging off,
//! eax = magic, ebx = multiboot info address.
//! We set up the boot stack, zero BSS, then call kernel_main(magic, info).

use core::arch::global_asm;

global_asm!(
    r#"
.section .multiboot, "a"
.balign 4
    .long 0x1BADB002                    /* magic */
    .long 0x00000003                    /* ALIGN | MEMINFO */
    .long -(0x1BADB002 + 0x00000003)    /* checksum */

.section .text
.global _start
_start:
    cli

    /* Switch to our 64KB boot stack */
    movl $boot_stack_top, %esp
    andl $-16, %esp

    /* Сохранить magic: rep stosb портит eax / Keep magic: rep stosb clobbers eax */
    movl %eax, %esi

    /* Zero BSS: edi = __bss_start, ecx = byte count, al = 0 */
    movl $__bss_start, %edi
    movl $__bss_end, %ecx
    subl %edi, %ecx
    xorl %eax, %eax
    rep stosb

    pushl %ebx
    pushl %esi
    call kernel_main

    /* kernel_main never returns - halt just in case */
.hang:
    cli
    hlt
    jmp .hang

.section .bss
.balign 16
boot_stack_bottom:
    .skip 65536
boot_stack_top:
"#,
    options(att_syntax)
);

/// Значение eax от Multiboot-загрузчика / eax value from a Multiboot loader
pub const BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;
