//! Вывод на консоль ядра / Kernel console output

use core::ffi::CStr;

use crate::abi::{self, Syscall, STR_MAX};
use crate::raw::syscall1;
use crate::{Error, Result};

/// Напечатать строку через syscall `write`.
/// Print a string through the `write` syscall.
pub fn print(msg: &CStr) -> Result<()> {
    if msg.to_bytes_with_nul().len() > STR_MAX {
        return Err(Error::InvalidArg);
    }
    let ret = unsafe { syscall1(Syscall::Write, msg.as_ptr() as u32) };
    abi::decode(ret).map(|_| ())
}
