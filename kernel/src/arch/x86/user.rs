//! Доступ к памяти вызывающего syscall.
//! Access to the memory of a syscall caller.
//!
//! CR3 не переключается, поэтому указатель вызывающего читается
//! напрямую через тождественное отображение. Принимаются только адреса
//! внутри отображённых 4 МиБ, нулевая страница запрещена.
//! CR3 is never switched, so a caller pointer is read directly through
//! the identity map. Only addresses inside the mapped 4 MiB are accepted,
//! the zero page is refused.

use crate::config::{ENTRIES_PER_TABLE, PAGE_SIZE};
use crate::syscall::{SyscallError, UserMemory};

const LOW: u32 = PAGE_SIZE;
const HIGH: u32 = ENTRIES_PER_TABLE as u32 * PAGE_SIZE;

fn check(ptr: u32, len: usize) -> Result<*mut u8, SyscallError> {
    let end = (ptr as u64) + len as u64;
    if ptr < LOW || end > HIGH as u64 {
        return Err(SyscallError::InvalidArgument);
    }
    Ok(ptr as usize as *mut u8)
}

pub struct RawUserMemory;

impl UserMemory for RawUserMemory {
    fn read_cstr(&self, ptr: u32, buf: &mut [u8]) -> Result<usize, SyscallError> {
        let start = check(ptr, 0)?;
        let avail = (HIGH - ptr) as usize;
        let mut n = 0;
        while n < buf.len() && n < avail {
            // SAFETY: адрес проверен `check` / the address is checked by `check`
            let b = unsafe { start.add(n).read_volatile() };
            if b == 0 {
                break;
            }
            buf[n] = b;
            n += 1;
        }
        Ok(n)
    }

    fn check_writable(&self, ptr: u32, len: usize) -> Result<(), SyscallError> {
        check(ptr, len).map(|_| ())
    }

    fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), SyscallError> {
        let dst = check(ptr, bytes.len())?;
        // SAFETY: диапазон проверен / the range is checked
        unsafe { core::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len()) };
        Ok(())
    }

    fn write_u32(&mut self, ptr: u32, value: u32) -> Result<(), SyscallError> {
        self.write_bytes(ptr, &value.to_ne_bytes())
    }
}
