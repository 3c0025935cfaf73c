//! Конфигурация ядра - всё задаётся при компиляции.
//! Kernel configuration - everything is fixed at compile time.

use log::LevelFilter;

// ── Ёмкости таблиц / Table capacities ────────────────────────────────────────

pub const MAX_PROCESSES: usize = 8;
pub const MAX_INODES: usize = 8;
pub const MAX_FILES: usize = 32;
/// Байт данных в одном inode / Data bytes per inode
pub const INODE_DATA_SIZE: usize = 128;
/// Байт имени без завершающего NUL / Name bytes without the trailing NUL
pub const INODE_NAME_MAX: usize = 31;

// ── Память / Memory layout ───────────────────────────────────────────────────

pub const PAGE_SIZE: u32 = 4096;
pub const ENTRIES_PER_TABLE: usize = 1024;
/// Начало верхнего окна ядра / Start of the kernel high window
pub const KERNEL_BASE: u32 = 0xC000_0000;
/// Физическая база пользовательского региона / User region physical base
pub const USER_BASE: u32 = 0x0010_0000;
/// Стек пользователя лежит через две страницы от базы
/// The user stack sits two pages above the base
pub const USER_STACK_PAGES: u32 = 2;
/// Текстовый буфер VGA / VGA text buffer
pub const VGA_BUFFER: u32 = 0x000B_8000;

// ── Векторы прерываний / Interrupt vectors ───────────────────────────────────

pub const PIC1_OFFSET: u8 = 0x20; // IRQ 0–7  → 0x20–0x27
pub const PIC2_OFFSET: u8 = 0x28; // IRQ 8–15 → 0x28–0x2F
pub const DOUBLE_FAULT_VECTOR: u8 = 0x08;
pub const TIMER_VECTOR: u8 = PIC1_OFFSET;
pub const KEYBOARD_VECTOR: u8 = PIC1_OFFSET + 1;
pub const SYSCALL_VECTOR: u8 = libbronze::abi::SYSCALL_VECTOR;

// ── Syscall ABI ──────────────────────────────────────────────────────────────

pub const SYSCALL_STR_MAX: usize = libbronze::abi::STR_MAX;
pub const LIST_BUFFER_SIZE: usize = libbronze::abi::LIST_BUFFER_SIZE;

// ── Устройства / Devices ─────────────────────────────────────────────────────

pub const COM1: u16 = 0x3F8;
pub const KEYBOARD_RING_SIZE: usize = 256;

/// Уровень журнала / Log level
pub const LOG_LEVEL: LevelFilter = if cfg!(feature = "syscall-trace") {
    LevelFilter::Trace
} else {
    LevelFilter::Info
};
