//! Демонстрационные юниты, создаваемые при загрузке.
//! Demo units seeded at boot.
//!
//! Тела хранятся в таблице процессов, но планировщик их не вызывает.
//! The bodies are stored in the process table but the selector never
//! calls them.

use core::sync::atomic::{AtomicU32, Ordering};

use libbronze::{io, task};
use log::{info, warn};

static COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn counter_task() {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    info!("counter: {}", n);
}

pub fn pacer_task() {
    let ticks = crate::arch::x86::idt::TIMER_TICKS.load(Ordering::Relaxed);
    info!("pacer: {} ticks", ticks);
}

/// Юнит ring 3: печатает через int 0x80 и завершается.
/// Ring 3 unit: prints through int 0x80 and exits.
pub fn user_task() {
    if let Err(err) = io::print(c"Hello from user space!\n") {
        warn!("user task: {}", err);
    }
    task::exit();
}
