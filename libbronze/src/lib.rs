//! libbronze - BronzeOS userspace library
//!
//! Тонкая обёртка над системными вызовами + общая таблица ABI.
//! Thin wrapper over syscalls + the shared ABI table.
//!
//! Ядро декодирует `eax` через тот же [`abi::Syscall`], поэтому номера
//! существуют ровно в одном месте.
//! The kernel decodes `eax` through the same [`abi::Syscall`], so the
//! numbers live in exactly one place.
//!
//! Использование / Usage:
//! ```ignore
//! use libbronze::fs;
//! let fd = fs::open(c"notes.txt")?;
//! let n = fs::read(fd, &mut buf)?;
//! fs::close(fd);
//! ```

#![no_std]

pub mod abi;

#[cfg(target_arch = "x86")]
mod raw;
#[cfg(target_arch = "x86")]
pub mod fs;
#[cfg(target_arch = "x86")]
pub mod io;
#[cfg(target_arch = "x86")]
pub mod task;

use thiserror::Error;

/// Ошибки syscall / Syscall errors
///
/// Ядро сообщает об отказе единственным значением `-1`, поэтому причина
/// на этой стороне не различается.
/// The kernel reports every refusal as `-1`, so the cause is not
/// distinguishable on this side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("kernel rejected the call (code {0})")]
    Rejected(i32),
    #[error("argument does not fit the kernel ABI")]
    InvalidArg,
}

pub type Result<T> = core::result::Result<T, Error>;

/// Дескриптор открытого файла / Open file descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fd(pub u32);

/// Идентификатор процесса / Process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pid(pub u32);
