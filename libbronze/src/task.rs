//! Управление процессами / Process control

use crate::abi::{self, Syscall};
use crate::raw::{syscall0, syscall1};
use crate::{Pid, Result};

/// Завершить вызывающий процесс.
/// Terminate the calling unit.
///
/// Ядро не переключает контекст, поэтому управление возвращается.
/// The kernel performs no context switch, so control comes back.
pub fn exit() {
    unsafe { syscall0(Syscall::Exit) };
}

/// Количество живых процессов / Number of live units
pub fn ps() -> Result<usize> {
    abi::decode(unsafe { syscall0(Syscall::Ps) }).map(|n| n as usize)
}

pub fn kill(pid: Pid) {
    unsafe { syscall1(Syscall::Kill, pid.0) };
}
