//! Syscall gate - int 0x80
//!
//! Регистры / Registers:
//!   eax - номер / number
//!   ebx, ecx, edx - аргументы / arguments
//!   eax ← результат / result
//!
//! Номера / Numbers (общие с libbronze / shared with libbronze):
//!   1 write(str)            - вывести строку на консоль
//!   2 open(name)            - открыть файл, вернуть fd
//!   3 exit()                - завершить текущий юнит
//!   4 ps()                  - число живых юнитов
//!   5 kill(pid)             - завершить юнит
//!   6 read(fd, buf, len)    - прочитать из файла
//!   7 close(fd)             - закрыть fd
//!   8 create(name)          - создать файл, вернуть inode
//!   9 list(buf, len_out)    - имена файлов через пробел
//!
//! Любая ошибка возвращается как -1.
//! Every error comes back as -1.

pub mod handlers;

use libbronze::abi::{self, Syscall};
use log::{debug, trace, warn};
use thiserror::Error;

use crate::context::Kernel;
use crate::vfs::VfsError;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    #[error("unrecognized syscall {0}")]
    Unrecognized(u32),
    #[error("invalid argument")]
    InvalidArgument,
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl SyscallError {
    pub const fn as_errno(self) -> i32 {
        abi::ERROR
    }
}

/// Снимок регистров вызывающего / Snapshot of the caller's registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallArgs {
    pub number: u32,
    pub arg1:   u32,
    pub arg2:   u32,
    pub arg3:   u32,
}

impl SyscallArgs {
    pub const fn from_registers(eax: u32, ebx: u32, ecx: u32, edx: u32) -> Self {
        Self { number: eax, arg1: ebx, arg2: ecx, arg3: edx }
    }
}

/// Доступ к памяти вызывающего / Access to the caller's memory
pub trait UserMemory {
    /// Прочитать строку до NUL или до конца `buf`; возвращает длину без NUL.
    /// Read a string up to NUL or the end of `buf`; returns the length without NUL.
    fn read_cstr(&self, ptr: u32, buf: &mut [u8]) -> Result<usize, SyscallError>;
    /// Проверить, что `len` байт по `ptr` можно записать, ничего не трогая.
    /// Check that `len` bytes at `ptr` are writable without touching them.
    fn check_writable(&self, ptr: u32, len: usize) -> Result<(), SyscallError>;
    fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), SyscallError>;
    fn write_u32(&mut self, ptr: u32, value: u32) -> Result<(), SyscallError>;
}

/// Куда идёт вывод `write` / Where `write` output goes
pub trait Console {
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Разобрать номер и выполнить вызов; результат - значение для eax.
/// Decode the number and run the call; the result is the value for eax.
pub fn dispatch(
    kernel:  &mut Kernel,
    args:    SyscallArgs,
    user:    &mut dyn UserMemory,
    console: &mut dyn Console,
) -> i32 {
    trace!(
        "syscall: eax={} ebx={:#x} ecx={:#x} edx={:#x}",
        args.number, args.arg1, args.arg2, args.arg3
    );

    let call = match Syscall::try_from(args.number) {
        Ok(call) => call,
        Err(number) => {
            let err = SyscallError::Unrecognized(number);
            warn!("syscall: {}", err);
            return err.as_errno();
        }
    };

    match handlers::handle(call, kernel, args, user, console) {
        Ok(value) => value as i32,
        Err(err) => {
            debug!("syscall: {:?} failed: {}", call, err);
            err.as_errno()
        }
    }
}
