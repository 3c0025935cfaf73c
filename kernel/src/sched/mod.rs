//! Scheduler - фиксированная таблица процессов + приоритетный выбор
//!
//! Fixed process table with a priority selector.
//!
//! Выбор / Selection:
//!   кандидаты - Ready юниты и текущий Running юнит
//!   candidates are Ready units plus the current Running unit
//!   побеждает строго больший приоритет, при равенстве - меньший слот
//!   strictly higher priority wins, ties go to the lower slot
//!
//! Таймер только поднимает флаг запроса; выбор делает главный цикл.
//! The timer only raises the request flag; the main loop does the selection.
//!
//! Переключения контекста нет: `entry` хранится, но не вызывается,
//! стек и CR3 не меняются.
//! There is no context switch: `entry` is stored but never called,
//! the stack and CR3 are left alone.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{MAX_PROCESSES, PAGE_SIZE, USER_BASE, USER_STACK_PAGES};
use crate::mm::vmm::{AddressSpace, SpaceAllocator};

pub type Pid = u32;

/// Тело задачи / Task body
pub type TaskEntry = fn();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Ready,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Kernel,
    User,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    #[error("process table is full")]
    Full,
    #[error("no free user address space")]
    NoAddressSpace,
}

/// Юнит исполнения / Execution unit
#[derive(Debug, Clone, Copy)]
pub struct ExecutionUnit {
    pub slot:                usize,
    /// 0 - слот свободен / 0 means the slot is free
    pub pid:                 Pid,
    pub entry:               Option<TaskEntry>,
    pub state:               UnitState,
    pub priority:            u8,
    pub privilege:           Privilege,
    pub user_stack_base:     u32,
    pub saved_stack_pointer: u32,
    pub address_space:       Option<AddressSpace>,
}

impl ExecutionUnit {
    const fn free(slot: usize) -> Self {
        Self {
            slot,
            pid: 0,
            entry: None,
            state: UnitState::Terminated,
            priority: 0,
            privilege: Privilege::Kernel,
            user_stack_base: 0,
            saved_stack_pointer: 0,
            address_space: None,
        }
    }

    pub const fn is_free(&self) -> bool {
        self.pid == 0
    }
}

/// Флаг запроса планирования / Scheduling request flag
///
/// Поднимается из обработчика таймера, снимается главным циклом.
/// Raised from the timer handler, consumed by the main loop.
pub struct ScheduleRequest(AtomicBool);

impl ScheduleRequest {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Снять флаг; true если он был поднят / Clear the flag; true if it was raised
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for ScheduleRequest {
    fn default() -> Self {
        Self::new()
    }
}

pub static SCHEDULE_REQUEST: ScheduleRequest = ScheduleRequest::new();

pub struct ProcessTable {
    units:   [ExecutionUnit; MAX_PROCESSES],
    active:  Option<usize>,
    request: &'static ScheduleRequest,
}

impl ProcessTable {
    pub const fn new(request: &'static ScheduleRequest) -> Self {
        let mut units = [ExecutionUnit::free(0); MAX_PROCESSES];
        let mut i = 0;
        while i < MAX_PROCESSES {
            units[i].slot = i;
            i += 1;
        }
        Self { units, active: None, request }
    }

    /// Создать юнит в первом свободном слоте; возвращает индекс слота.
    /// Create a unit in the first free slot; returns the slot index.
    pub fn create_unit(
        &mut self,
        entry:     TaskEntry,
        priority:  u8,
        privilege: Privilege,
        spaces:    &mut dyn SpaceAllocator,
    ) -> Result<usize, SchedError> {
        let slot = self.units.iter().position(ExecutionUnit::is_free).ok_or_else(|| {
            warn!("sched: process table full");
            SchedError::Full
        })?;

        let (space, stack) = match privilege {
            Privilege::Kernel => (spaces.kernel_space(), 0),
            Privilege::User => {
                let space = spaces.create_user_space().ok_or(SchedError::NoAddressSpace)?;
                (space, USER_BASE + USER_STACK_PAGES * PAGE_SIZE)
            }
        };

        let pid = slot as Pid + 1;
        self.units[slot] = ExecutionUnit {
            slot,
            pid,
            entry: Some(entry),
            state: UnitState::Ready,
            priority,
            privilege,
            user_stack_base: stack,
            saved_stack_pointer: stack,
            address_space: Some(space),
        };

        info!("sched: created pid {} ({:?}, priority {})", pid, privilege, priority);
        Ok(slot)
    }

    /// Завершить юнит. Неизвестный pid игнорируется.
    /// Terminate a unit. An unknown pid is ignored.
    pub fn terminate(&mut self, pid: Pid, spaces: &mut dyn SpaceAllocator) -> bool {
        if pid == 0 {
            return false;
        }
        let Some(slot) = self.units.iter().position(|u| u.pid == pid) else {
            debug!("sched: terminate of unknown pid {}", pid);
            return false;
        };

        let unit = &mut self.units[slot];
        if let Some(space) = unit.address_space.take() {
            spaces.release(space);
        }
        *unit = ExecutionUnit::free(slot);

        if self.active == Some(slot) {
            self.active = None;
            self.request.raise();
        }

        info!("sched: terminated pid {}", pid);
        true
    }

    /// Выбрать юнит с наибольшим приоритетом; возвращает pid активного.
    /// Pick the highest-priority unit; returns the active pid.
    pub fn select(&mut self) -> Option<Pid> {
        let active = self.active;
        let mut best: Option<(usize, u8)> = None;

        for (i, unit) in self.units.iter().enumerate() {
            let candidate = match unit.state {
                UnitState::Ready => true,
                UnitState::Running => active == Some(i),
                UnitState::Terminated => false,
            };
            if !candidate {
                continue;
            }
            match best {
                Some((_, p)) if unit.priority <= p => {}
                _ => best = Some((i, unit.priority)),
            }
        }

        let (pick, _) = best?;
        if active != Some(pick) {
            if let Some(prev) = active {
                if self.units[prev].state == UnitState::Running {
                    self.units[prev].state = UnitState::Ready;
                }
            }
            self.units[pick].state = UnitState::Running;
            self.active = Some(pick);
            debug!("sched: switched to pid {}", self.units[pick].pid);
        }

        Some(self.units[pick].pid)
    }

    /// Выполнить выбор, если флаг поднят / Run selection if the flag is raised
    pub fn poll(&mut self) -> Option<Pid> {
        if self.request.take() {
            self.select()
        } else {
            None
        }
    }

    pub fn live_count(&self) -> usize {
        self.units.iter().filter(|u| !u.is_free()).count()
    }

    pub fn active_pid(&self) -> Option<Pid> {
        self.active.map(|slot| self.units[slot].pid)
    }

    pub fn get(&self, pid: Pid) -> Option<&ExecutionUnit> {
        if pid == 0 {
            return None;
        }
        self.units.iter().find(|u| u.pid == pid)
    }

    /// Занятые слоты / Occupied slots
    pub fn iter(&self) -> impl Iterator<Item = &ExecutionUnit> {
        self.units.iter().filter(|u| !u.is_free())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::PhysAddr;

    /// Аллокатор с ограниченным числом пользовательских пространств
    /// Allocator with a bounded number of user spaces
    struct FakeSpaces {
        free:     usize,
        released: usize,
    }

    impl FakeSpaces {
        fn new(free: usize) -> Self {
            Self { free, released: 0 }
        }
    }

    impl SpaceAllocator for FakeSpaces {
        fn kernel_space(&self) -> AddressSpace {
            AddressSpace::Kernel { root: PhysAddr(0x1000) }
        }

        fn create_user_space(&mut self) -> Option<AddressSpace> {
            if self.free == 0 {
                return None;
            }
            self.free -= 1;
            Some(AddressSpace::User { root: PhysAddr(0x2000), slot: self.free })
        }

        fn release(&mut self, space: AddressSpace) {
            if let AddressSpace::User { .. } = space {
                self.free += 1;
                self.released += 1;
            }
        }
    }

    fn noop() {}

    fn table() -> ProcessTable {
        ProcessTable::new(Box::leak(Box::new(ScheduleRequest::new())))
    }

    fn snapshot(t: &ProcessTable) -> Vec<(Pid, UnitState, u8)> {
        t.units.iter().map(|u| (u.pid, u.state, u.priority)).collect()
    }

    #[test]
    fn pids_are_unique_and_nonzero_up_to_capacity() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        for i in 0..MAX_PROCESSES {
            assert_eq!(t.create_unit(noop, 1, Privilege::Kernel, &mut s), Ok(i));
        }
        let mut pids: Vec<Pid> = t.iter().map(|u| u.pid).collect();
        pids.sort_unstable();
        pids.dedup();
        assert_eq!(pids.len(), MAX_PROCESSES);
        assert!(!pids.contains(&0));

        let before = snapshot(&t);
        assert_eq!(t.create_unit(noop, 9, Privilege::Kernel, &mut s), Err(SchedError::Full));
        assert_eq!(snapshot(&t), before);
    }

    #[test]
    fn user_units_get_a_space_and_stack() {
        let mut t = table();
        let mut s = FakeSpaces::new(1);
        let slot = t.create_unit(noop, 2, Privilege::User, &mut s).unwrap();
        let unit = t.get(slot as Pid + 1).unwrap();
        assert_eq!(unit.user_stack_base, USER_BASE + 2 * PAGE_SIZE);
        assert!(matches!(unit.address_space, Some(AddressSpace::User { .. })));

        let k = t.create_unit(noop, 2, Privilege::Kernel, &mut s).unwrap();
        let unit = t.get(k as Pid + 1).unwrap();
        assert_eq!(unit.user_stack_base, 0);
        assert_eq!(unit.address_space, Some(s.kernel_space()));
    }

    #[test]
    fn missing_user_space_leaves_table_unchanged() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        let before = snapshot(&t);
        assert_eq!(
            t.create_unit(noop, 2, Privilege::User, &mut s),
            Err(SchedError::NoAddressSpace)
        );
        assert_eq!(snapshot(&t), before);
        assert_eq!(t.live_count(), 0);
    }

    #[test]
    fn terminate_unknown_pid_is_noop() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        t.create_unit(noop, 1, Privilege::Kernel, &mut s).unwrap();
        let before = snapshot(&t);
        assert!(!t.terminate(0, &mut s));
        assert!(!t.terminate(42, &mut s));
        assert_eq!(snapshot(&t), before);
    }

    #[test]
    fn terminate_frees_exactly_one_slot_and_its_space() {
        let mut t = table();
        let mut s = FakeSpaces::new(2);
        t.create_unit(noop, 1, Privilege::User, &mut s).unwrap();
        t.create_unit(noop, 1, Privilege::User, &mut s).unwrap();
        assert_eq!(t.live_count(), 2);

        assert!(t.terminate(1, &mut s));
        assert_eq!(t.live_count(), 1);
        assert_eq!(s.released, 1);
        assert!(t.get(1).is_none());
        assert!(t.get(2).is_some());

        // Освободившийся слот переиспользуется / The freed slot is reused
        assert_eq!(t.create_unit(noop, 1, Privilege::Kernel, &mut s), Ok(0));
        assert_eq!(t.get(1).map(|u| u.slot), Some(0));
    }

    #[test]
    fn highest_priority_wins() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        for p in [5, 3, 2] {
            t.create_unit(noop, p, Privilege::Kernel, &mut s).unwrap();
        }
        assert_eq!(t.select(), Some(1));
        assert_eq!(t.units[0].state, UnitState::Running);
        assert_eq!(t.units[1].state, UnitState::Ready);
    }

    #[test]
    fn ties_go_to_the_first_slot() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        t.create_unit(noop, 1, Privilege::Kernel, &mut s).unwrap();
        t.create_unit(noop, 5, Privilege::Kernel, &mut s).unwrap();
        t.create_unit(noop, 5, Privilege::Kernel, &mut s).unwrap();
        t.terminate(1, &mut s);
        assert_eq!(t.select(), Some(2));
        assert_eq!(t.active, Some(1));
    }

    #[test]
    fn select_is_idempotent() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        for p in [5, 3, 5] {
            t.create_unit(noop, p, Privilege::Kernel, &mut s).unwrap();
        }
        let first = t.select();
        let after_first = snapshot(&t);
        assert_eq!(t.select(), first);
        assert_eq!(snapshot(&t), after_first);
        assert_eq!(t.iter().filter(|u| u.state == UnitState::Running).count(), 1);
    }

    #[test]
    fn higher_priority_arrival_preempts_and_previous_goes_ready() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        t.create_unit(noop, 3, Privilege::Kernel, &mut s).unwrap();
        assert_eq!(t.select(), Some(1));
        t.create_unit(noop, 7, Privilege::Kernel, &mut s).unwrap();
        assert_eq!(t.select(), Some(2));
        assert_eq!(t.get(1).unwrap().state, UnitState::Ready);
        assert_eq!(t.get(2).unwrap().state, UnitState::Running);
    }

    #[test]
    fn terminating_active_unit_raises_request() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        t.create_unit(noop, 5, Privilege::Kernel, &mut s).unwrap();
        t.create_unit(noop, 3, Privilege::Kernel, &mut s).unwrap();
        t.select();
        assert!(!t.request.is_raised());

        t.terminate(1, &mut s);
        assert_eq!(t.active_pid(), None);
        assert!(t.request.is_raised());
        assert_eq!(t.poll(), Some(2));
        assert!(!t.request.is_raised());
        assert_eq!(t.poll(), None);
    }

    #[test]
    fn poll_waits_for_the_flag() {
        let mut t = table();
        let mut s = FakeSpaces::new(0);
        t.create_unit(noop, 5, Privilege::Kernel, &mut s).unwrap();
        assert_eq!(t.poll(), None);
        assert_eq!(t.active_pid(), None);
        t.request.raise();
        assert_eq!(t.poll(), Some(1));
    }

    #[test]
    fn empty_table_selects_nothing() {
        let mut t = table();
        assert_eq!(t.select(), None);
    }
}
