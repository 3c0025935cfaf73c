//! Syscall ABI - `int 0x80`
//!
//! Регистры / Registers:
//!   eax - номер вызова / call number
//!   ebx - arg1, ecx - arg2, edx - arg3
//!   eax - результат / result
//!
//! | Op | Name   | Arg1       | Arg2        | Arg3    | Result              |
//! |----|--------|------------|-------------|---------|---------------------|
//! | 1  | write  | string ptr | -           | -       | 0                   |
//! | 2  | open   | name ptr   | -           | -       | fd or -1            |
//! | 3  | exit   | -          | -           | -       | 0                   |
//! | 4  | ps     | -          | -           | -       | live unit count     |
//! | 5  | kill   | pid        | -           | -       | 0                   |
//! | 6  | read   | fd         | buf ptr     | max len | bytes read or -1    |
//! | 7  | close  | fd         | -           | -       | 0                   |
//! | 8  | create | name ptr   | -           | -       | inode id or -1      |
//! | 9  | list   | buf ptr    | len-out ptr | -       | 0                   |

use crate::{Error, Result};

/// Вектор программного прерывания / Software interrupt vector
pub const SYSCALL_VECTOR: u8 = 0x80;

/// Единственное значение ошибки / The single error sentinel
pub const ERROR: i32 = -1;

/// Максимальная длина строки, включая NUL / Max string length, NUL included
pub const STR_MAX: usize = 256;

/// Размер буфера `list`, включая NUL / `list` buffer size, NUL included
pub const LIST_BUFFER_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Syscall {
    Write  = 1,
    Open   = 2,
    Exit   = 3,
    Ps     = 4,
    Kill   = 5,
    Read   = 6,
    Close  = 7,
    Create = 8,
    List   = 9,
}

impl Syscall {
    pub const fn number(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Syscall {
    type Error = u32;

    fn try_from(num: u32) -> core::result::Result<Self, u32> {
        Ok(match num {
            1 => Self::Write,
            2 => Self::Open,
            3 => Self::Exit,
            4 => Self::Ps,
            5 => Self::Kill,
            6 => Self::Read,
            7 => Self::Close,
            8 => Self::Create,
            9 => Self::List,
            other => return Err(other),
        })
    }
}

/// Превратить сырое значение `eax` в результат.
/// Turn a raw `eax` value into a result.
pub fn decode(ret: i32) -> Result<u32> {
    if ret < 0 {
        Err(Error::Rejected(ret))
    } else {
        Ok(ret as u32)
    }
}
