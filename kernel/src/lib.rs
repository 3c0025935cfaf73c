//! BronzeOS kernel core
//!
//! Подсистемы / Subsystems:
//!   arch     - GDT, IDT + PIC, включение paging / enabling paging
//!   mm       - таблицы страниц и адресные пространства / page tables and address spaces
//!   sched    - таблица процессов + приоритетный выбор / process table + priority selection
//!   vfs      - файловая система в памяти / in-memory file system
//!   syscall  - шлюз int 0x80 / the int 0x80 gate
//!   context  - объект ядра, владеющий всеми таблицами / the kernel object owning every table
//!
//! Всё, что содержит ассемблер, собирается только для i686; остальное
//! тестируется на хосте через `cargo test`.
//! Everything with assembly builds for i686 only; the rest is tested on
//! the host with `cargo test`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arch;
pub mod config;
pub mod context;
pub mod drivers;
pub mod mm;
pub mod sched;
pub mod syscall;
pub mod vfs;

#[cfg(target_arch = "x86")]
pub mod logger;
#[cfg(target_arch = "x86")]
pub mod tasks;
