//! Kernel context - таблица процессов, VFS и адресные пространства
//!
//! Один объект владеет всеми глобальными таблицами. На x86 он лежит
//! за `spin::Mutex`; главный цикл берёт его только с выключенными
//! прерываниями, обработчик syscall - только через `try_lock`.
//! One object owns every global table. On x86 it sits behind a
//! `spin::Mutex`; the main loop takes it only with interrupts disabled,
//! the syscall handler only through `try_lock`.

use crate::mm::vmm::AddressSpaces;
use crate::sched::{Pid, Privilege, ProcessTable, SchedError, ScheduleRequest, TaskEntry};
use crate::vfs::Vfs;

pub struct Kernel {
    processes: ProcessTable,
    vfs:       Vfs,
    spaces:    AddressSpaces,
}

impl Kernel {
    pub fn new(spaces: AddressSpaces, request: &'static ScheduleRequest) -> Self {
        Self { processes: ProcessTable::new(request), vfs: Vfs::new(), spaces }
    }

    pub fn init_vfs(&mut self) {
        self.vfs.init();
    }

    // ── Процессы / Processes ────────────────────────────────────────────────

    pub fn create_unit(
        &mut self,
        entry:     TaskEntry,
        priority:  u8,
        privilege: Privilege,
    ) -> Result<usize, SchedError> {
        self.processes.create_unit(entry, priority, privilege, &mut self.spaces)
    }

    pub fn terminate(&mut self, pid: Pid) -> bool {
        self.processes.terminate(pid, &mut self.spaces)
    }

    /// Завершить активный юнит / Terminate the active unit
    pub fn exit_current(&mut self) -> bool {
        match self.processes.active_pid() {
            Some(pid) => self.terminate(pid),
            None => false,
        }
    }

    pub fn live_units(&self) -> usize {
        self.processes.live_count()
    }

    pub fn active_pid(&self) -> Option<Pid> {
        self.processes.active_pid()
    }

    pub fn select(&mut self) -> Option<Pid> {
        self.processes.select()
    }

    pub fn poll_schedule(&mut self) -> Option<Pid> {
        self.processes.poll()
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    // ── Файлы / Files ───────────────────────────────────────────────────────

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut Vfs {
        &mut self.vfs
    }

    pub fn spaces(&self) -> &AddressSpaces {
        &self.spaces
    }
}

#[cfg(target_arch = "x86")]
mod global {
    use spin::{Mutex, Once};

    use super::Kernel;
    use crate::arch::x86::cpu;

    static KERNEL: Once<Mutex<Kernel>> = Once::new();

    /// Установить контекст; повторный вызов возвращает первый.
    /// Install the context; a repeated call returns the first one.
    pub fn install(kernel: Kernel) -> &'static Mutex<Kernel> {
        KERNEL.call_once(|| Mutex::new(kernel))
    }

    /// Для главного цикла: блокировка с выключенными прерываниями.
    /// For the main loop: lock with interrupts disabled.
    pub fn with<R>(f: impl FnOnce(&mut Kernel) -> R) -> Option<R> {
        let kernel = KERNEL.get()?;
        Some(cpu::without_interrupts(|| f(&mut kernel.lock())))
    }

    /// Для обработчиков: не ждать занятую блокировку.
    /// For handlers: never wait on a held lock.
    pub fn try_with<R>(f: impl FnOnce(&mut Kernel) -> R) -> Option<R> {
        let mut kernel = KERNEL.get()?.try_lock()?;
        Some(f(&mut kernel))
    }
}

#[cfg(target_arch = "x86")]
pub use global::{install, try_with, with};

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mm::vmm::{KernelSpace, UserSpaces};
    use crate::sched::UnitState;

    /// Ядро с настоящими таблицами страниц и инициализированной VFS.
    /// A kernel with real page tables and an initialized VFS.
    pub fn kernel() -> Kernel {
        let kspace = Box::leak(Box::new(KernelSpace::new()));
        kspace.build();
        let spaces = AddressSpaces::new(kspace, Box::leak(Box::new(UserSpaces::new())));
        let mut k = Kernel::new(spaces, Box::leak(Box::new(ScheduleRequest::new())));
        k.init_vfs();
        k
    }

    fn noop() {}

    #[test]
    fn seeded_units_pick_highest_priority() {
        let mut k = kernel();
        k.create_unit(noop, 5, Privilege::Kernel).unwrap();
        k.create_unit(noop, 3, Privilege::Kernel).unwrap();
        k.create_unit(noop, 2, Privilege::User).unwrap();
        assert_eq!(k.live_units(), 3);
        assert_eq!(k.spaces().user_spaces_in_use(), 1);

        assert_eq!(k.select(), Some(1));
        assert_eq!(k.processes().get(1).unwrap().state, UnitState::Running);
    }

    #[test]
    fn killing_a_user_unit_returns_its_space() {
        let mut k = kernel();
        k.create_unit(noop, 2, Privilege::User).unwrap();
        assert_eq!(k.spaces().user_spaces_in_use(), 1);
        assert!(k.terminate(1));
        assert_eq!(k.spaces().user_spaces_in_use(), 0);
    }

    #[test]
    fn exit_without_active_unit_is_noop() {
        let mut k = kernel();
        k.create_unit(noop, 2, Privilege::Kernel).unwrap();
        assert!(!k.exit_current());
        assert_eq!(k.live_units(), 1);
    }

    #[test]
    fn exit_terminates_active_and_poll_reselects() {
        let mut k = kernel();
        k.create_unit(noop, 5, Privilege::Kernel).unwrap();
        k.create_unit(noop, 3, Privilege::Kernel).unwrap();
        k.select();
        assert!(k.exit_current());
        assert_eq!(k.poll_schedule(), Some(2));
    }
}
