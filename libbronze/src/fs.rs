//! Файлы в VFS ядра / Files in the kernel VFS
//!
//! Имя файла - C-строка (до 31 байта хранится ядром).
//! File names are C strings (the kernel keeps up to 31 bytes).

use core::ffi::CStr;

use crate::abi::{self, Syscall, LIST_BUFFER_SIZE, STR_MAX};
use crate::raw::{syscall1, syscall3};
use crate::{Error, Fd, Result};

fn name_arg(name: &CStr) -> Result<u32> {
    if name.is_empty() || name.to_bytes_with_nul().len() > STR_MAX {
        return Err(Error::InvalidArg);
    }
    Ok(name.as_ptr() as u32)
}

/// Создать файл, вернуть номер inode.
/// Create a file, returning its inode id.
pub fn create(name: &CStr) -> Result<u32> {
    let ptr = name_arg(name)?;
    abi::decode(unsafe { syscall1(Syscall::Create, ptr) })
}

/// Открыть существующий файл / Open an existing file
pub fn open(name: &CStr) -> Result<Fd> {
    let ptr = name_arg(name)?;
    abi::decode(unsafe { syscall1(Syscall::Open, ptr) }).map(Fd)
}

/// Прочитать с текущего смещения; `Ok(0)` - конец файла.
/// Read from the current offset; `Ok(0)` means end of file.
pub fn read(fd: Fd, buf: &mut [u8]) -> Result<usize> {
    let ret = unsafe {
        syscall3(Syscall::Read, fd.0, buf.as_mut_ptr() as u32, buf.len() as u32)
    };
    abi::decode(ret).map(|n| n as usize)
}

pub fn close(fd: Fd) {
    unsafe { syscall1(Syscall::Close, fd.0) };
}

/// Имена всех файлов через пробел; возвращает число байт без NUL.
/// Space-separated names of all files; returns the byte count without NUL.
pub fn list(buf: &mut [u8; LIST_BUFFER_SIZE]) -> Result<usize> {
    let mut len: u32 = 0;
    let ret = unsafe {
        syscall3(
            Syscall::List,
            buf.as_mut_ptr() as u32,
            &mut len as *mut u32 as u32,
            0,
        )
    };
    abi::decode(ret).map(|_| len as usize)
}
