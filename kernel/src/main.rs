//! BronzeOS Kernel - точка входа / entry point

#![no_std]
#![no_main]
#![deny(unsafe_op_in_unsafe_fn)]

use core::panic::PanicInfo;

use bronzeos_kernel::arch::{self, x86::cpu};
use bronzeos_kernel::drivers::{keyboard, uart};
use bronzeos_kernel::sched::{Privilege, SCHEDULE_REQUEST};
use bronzeos_kernel::{config, context, kprintln, logger, tasks};
use bronzeos_kernel::context::Kernel;
use log::{debug, error, info, warn};

mod boot;

/// Точка входа ядра - вызывается из `_start`.
/// Kernel entry point - called from `_start`.
#[no_mangle]
pub extern "C" fn kernel_main(magic: u32, info: u32) -> ! {
    // 0. UART - первым делом / first of all
    uart::init();
    kprintln!("BronzeOS booting...");
    if logger::init(config::LOG_LEVEL).is_err() {
        kprintln!("[boot] logger already installed");
    }
    if magic != boot::BOOTLOADER_MAGIC {
        warn!("boot: unexpected loader magic {:#x}", magic);
    }
    debug!("boot: multiboot info at {:#x}", info);

    // 1. Контроллер клавиатуры - до sti / Keyboard controller, before sti
    keyboard::init();

    // 2. GDT + IDT + paging
    let Some(spaces) = arch::init() else {
        error!("boot: address spaces unavailable");
        cpu::halt_forever();
    };

    // 3. Kernel context: VFS + process table
    let mut kernel = Kernel::new(spaces, &SCHEDULE_REQUEST);
    kernel.init_vfs();

    // 4. Демо-юниты / Demo units
    let seeds: [(fn(), u8, Privilege); 3] = [
        (tasks::counter_task, 5, Privilege::Kernel),
        (tasks::pacer_task,   3, Privilege::Kernel),
        (tasks::user_task,    2, Privilege::User),
    ];
    for (entry, priority, privilege) in seeds {
        if let Err(err) = kernel.create_unit(entry, priority, privilege) {
            warn!("boot: cannot seed unit: {}", err);
        }
    }
    if let Some(pid) = kernel.select() {
        info!("sched: initial pid {}", pid);
    }

    context::install(kernel);
    info!("BronzeOS ready");

    // 5. Главный цикл / Main loop
    loop {
        if let Some(Some(pid)) = context::with(|k| k.poll_schedule()) {
            debug!("sched: active pid {}", pid);
        }
        while let Some(code) = keyboard::SCANCODES.pop() {
            debug!("keyboard: scancode {:#04x}", code);
        }
        cpu::halt();
    }
}

/// Panic handler - выводим в UART и halt.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    error!("KERNEL PANIC: {}", info);
    cpu::halt_forever()
}
