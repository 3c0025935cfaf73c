//! Interrupt Descriptor Table (IDT) - i686
//!
//! Все 256 векторов получают обработчик по умолчанию, затем
//! переопределяются нужные.
//! All 256 vectors get the default handler, then the used ones are
//! overridden.
//!
//! Векторы / Vectors:
//!   0x08 #DF  - Double Fault     (критический / critical)
//!   0x20      - Timer IRQ        → флаг планировщика / scheduler flag
//!   0x21      - Keyboard IRQ     → кольцо скан-кодов / scancode ring
//!   0x80      - Syscall gate     (DPL 3)

pub mod pic;
#[cfg(target_arch = "x86")]
mod stubs;

use core::sync::atomic::AtomicU32;

use super::gdt::KERNEL_CODE;
use crate::config::{DOUBLE_FAULT_VECTOR, KEYBOARD_VECTOR, SYSCALL_VECTOR, TIMER_VECTOR};

/// Present | ring 0 | 32-bit Interrupt Gate (IF сбрасывается / IF cleared)
pub const KERNEL_GATE: u8 = 0x8E;
/// Present | ring 3 | 32-bit Interrupt Gate - для int 0x80 / for int 0x80
pub const USER_GATE:   u8 = 0xEE;

pub const IDT_SIZE: usize = 256;

/// Число тиков таймера с загрузки / Timer ticks since boot
pub static TIMER_TICKS: AtomicU32 = AtomicU32::new(0);

// ── Дескриптор прерывания / Interrupt descriptor (8 байт) ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct IdtEntry {
    /// Биты 0–15 обработчика + селектор / handler bits 0–15 + selector
    low:  u32,
    /// Биты 16–31 обработчика + атрибуты / handler bits 16–31 + attributes
    high: u32,
}

impl IdtEntry {
    pub const fn missing() -> Self {
        Self { low: 0, high: 0 }
    }

    pub const fn new(handler: u32, selector: u16, type_attr: u8) -> Self {
        Self {
            low:  (handler & 0xFFFF) | ((selector as u32) << 16),
            high: (handler & 0xFFFF_0000) | ((type_attr as u32) << 8),
        }
    }

    pub const fn handler(&self) -> u32 {
        (self.high & 0xFFFF_0000) | (self.low & 0xFFFF)
    }

    pub const fn selector(&self) -> u16 {
        (self.low >> 16) as u16
    }

    pub const fn type_attr(&self) -> u8 {
        (self.high >> 8) as u8
    }

    pub const fn dpl(&self) -> u8 {
        (self.type_attr() >> 5) & 0b11
    }
}

/// Адреса входных заглушек / Entry stub addresses
#[derive(Debug, Clone, Copy)]
pub struct Handlers {
    pub default:      u32,
    pub double_fault: u32,
    pub timer:        u32,
    pub keyboard:     u32,
    pub syscall:      u32,
}

#[repr(C, align(8))]
pub struct Idt {
    entries: [IdtEntry; IDT_SIZE],
}

impl Idt {
    pub const fn new() -> Self {
        Self { entries: [IdtEntry::missing(); IDT_SIZE] }
    }

    pub fn populate(&mut self, handlers: &Handlers) {
        let gate = |handler, attr| IdtEntry::new(handler, KERNEL_CODE, attr);

        self.entries.fill(gate(handlers.default, KERNEL_GATE));
        self.entries[DOUBLE_FAULT_VECTOR as usize] = gate(handlers.double_fault, KERNEL_GATE);
        self.entries[TIMER_VECTOR as usize] = gate(handlers.timer, KERNEL_GATE);
        self.entries[KEYBOARD_VECTOR as usize] = gate(handlers.keyboard, KERNEL_GATE);
        self.entries[SYSCALL_VECTOR as usize] = gate(handlers.syscall, USER_GATE);
    }

    pub fn entry(&self, vector: u8) -> &IdtEntry {
        &self.entries[vector as usize]
    }
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

// ── Кадр прерывания / Trap frame ─────────────────────────────────────────────

/// Сохраняется входной заглушкой: pushad, затем вектор и код ошибки,
/// затем то, что положил CPU.
/// Saved by the entry stub: pushad, then vector and error code, then what
/// the CPU pushed.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct TrapFrame {
    pub edi:        u32,
    pub esi:        u32,
    pub ebp:        u32,
    esp_dummy:      u32,
    pub ebx:        u32,
    pub edx:        u32,
    pub ecx:        u32,
    pub eax:        u32,
    pub vector:     u32,
    pub error_code: u32,
    pub eip:        u32,
    pub cs:         u32,
    pub eflags:     u32,
}

impl TrapFrame {
    pub fn syscall_args(&self) -> crate::syscall::SyscallArgs {
        crate::syscall::SyscallArgs::from_registers(self.eax, self.ebx, self.ecx, self.edx)
    }

    /// Пришло ли прерывание из ring 3 / Whether the interrupt came from ring 3
    pub fn from_user(&self) -> bool {
        self.cs & 3 == 3
    }
}

// ── Обработчики / Handlers ───────────────────────────────────────────────────

#[cfg(target_arch = "x86")]
mod handlers {
    use core::ptr::addr_of_mut;
    use core::sync::atomic::Ordering;

    use log::{error, info, trace};

    use super::*;
    use crate::arch::x86::user::RawUserMemory;
    use crate::arch::x86::{cpu, port};
    use crate::drivers::{keyboard, uart::SerialConsole, vga};
    use crate::sched::SCHEDULE_REQUEST;
    use crate::{context, syscall};

    static mut IDT: Idt = Idt::new();

    #[repr(C, packed)]
    struct IdtDescriptor {
        size:   u16,
        offset: u32,
    }

    /// Общая точка входа из заглушек / Common entry from the stubs
    pub(super) extern "C" fn trap_dispatch(frame: &mut TrapFrame) {
        match frame.vector as u8 {
            DOUBLE_FAULT_VECTOR => double_fault(frame),
            TIMER_VECTOR => timer(),
            KEYBOARD_VECTOR => keyboard(),
            SYSCALL_VECTOR => syscall(frame),
            _ => unhandled(),
        }
    }

    /// Общая заглушка не знает ни вектора, ни кода ошибки, поэтому кадр
    /// здесь недостоверен и не печатается.
    /// The shared stub knows neither the vector nor the error code, so the
    /// frame is unreliable here and is not printed.
    fn unhandled() -> ! {
        error!("unhandled interrupt");
        vga::put_marker(b'D');
        cpu::halt_forever()
    }

    fn double_fault(frame: &TrapFrame) -> ! {
        error!("double fault (error={:#x}) at eip={:#x}", frame.error_code, frame.eip);
        vga::put_marker(b'F');
        cpu::halt_forever()
    }

    fn timer() {
        TIMER_TICKS.fetch_add(1, Ordering::Relaxed);
        SCHEDULE_REQUEST.raise();
        pic::end_of_interrupt(TIMER_VECTOR);
    }

    fn keyboard() {
        let scancode = unsafe { port::inb(keyboard::DATA_PORT) };
        keyboard::SCANCODES.record(scancode);
        pic::end_of_interrupt(KEYBOARD_VECTOR);
    }

    fn syscall(frame: &mut TrapFrame) {
        let args = frame.syscall_args();
        trace!("syscall: caller in {} mode", if frame.from_user() { "user" } else { "kernel" });
        let result = context::try_with(|kernel| {
            syscall::dispatch(kernel, args, &mut RawUserMemory, &mut SerialConsole)
        })
        .unwrap_or(libbronze::abi::ERROR);
        frame.eax = result as u32;
        pic::end_of_interrupt(SYSCALL_VECTOR);
    }

    /// Заполнить IDT, перепрограммировать PIC, загрузить IDTR и включить
    /// прерывания.
    /// Fill the IDT, reprogram the PIC, load IDTR and enable interrupts.
    pub fn install() {
        let handlers = stubs::handlers();
        unsafe {
            let idt = &mut *addr_of_mut!(IDT);
            idt.populate(&handlers);

            pic::init();

            let descriptor = IdtDescriptor {
                size:   (core::mem::size_of::<Idt>() - 1) as u16,
                offset: idt as *const Idt as u32,
            };
            core::arch::asm!("lidt [{desc}]", desc = in(reg) &descriptor);
        }
        info!("idt: {} vectors installed, pic remapped", IDT_SIZE);

        cpu::enable_interrupts();
    }
}

#[cfg(target_arch = "x86")]
pub use handlers::install;

#[cfg(test)]
mod tests {
    use super::*;

    const HANDLERS: Handlers = Handlers {
        default:      0x0010_1000,
        double_fault: 0x0010_2008,
        timer:        0x0010_3020,
        keyboard:     0x0010_4021,
        syscall:      0xC010_5080,
    };

    fn idt() -> Box<Idt> {
        let mut idt = Box::new(Idt::new());
        idt.populate(&HANDLERS);
        idt
    }

    #[test]
    fn entry_packs_handler_selector_and_attr() {
        let e = IdtEntry::new(0x1234_5678, 0x08, 0x8E);
        assert_eq!(e.low, 0x0008_5678);
        assert_eq!(e.high, 0x1234_8E00);
        assert_eq!(e.handler(), 0x1234_5678);
        assert_eq!(e.selector(), 0x08);
        assert_eq!(e.dpl(), 0);
    }

    #[test]
    fn every_vector_has_a_handler() {
        let idt = idt();
        for v in 0..=255u8 {
            let e = idt.entry(v);
            assert_eq!(e.selector(), KERNEL_CODE);
            assert_ne!(e.handler(), 0);
        }
        assert_eq!(idt.entry(0x00).handler(), HANDLERS.default);
        assert_eq!(idt.entry(0x0E).handler(), HANDLERS.default);
        assert_eq!(idt.entry(0xFF).handler(), HANDLERS.default);
    }

    #[test]
    fn named_vectors_are_overridden() {
        let idt = idt();
        assert_eq!(idt.entry(0x08).handler(), HANDLERS.double_fault);
        assert_eq!(idt.entry(0x20).handler(), HANDLERS.timer);
        assert_eq!(idt.entry(0x21).handler(), HANDLERS.keyboard);
        assert_eq!(idt.entry(0x80).handler(), HANDLERS.syscall);
    }

    #[test]
    fn only_the_syscall_gate_is_user_callable() {
        let idt = idt();
        for v in 0..=255u8 {
            let want = if v == 0x80 { USER_GATE } else { KERNEL_GATE };
            assert_eq!(idt.entry(v).type_attr(), want, "vector {:#x}", v);
        }
        assert_eq!(idt.entry(0x80).dpl(), 3);
    }

    #[test]
    fn table_and_frame_layout() {
        assert_eq!(core::mem::size_of::<IdtEntry>(), 8);
        assert_eq!(core::mem::size_of::<Idt>(), 256 * 8);
        assert_eq!(core::mem::size_of::<TrapFrame>(), 13 * 4);
    }

    #[test]
    fn frame_exposes_syscall_registers() {
        let frame = TrapFrame { eax: 6, ebx: 3, ecx: 0x2000, edx: 64, cs: 0x1B, ..Default::default() };
        let args = frame.syscall_args();
        assert_eq!((args.number, args.arg1, args.arg2, args.arg3), (6, 3, 0x2000, 64));
        assert!(frame.from_user());
        assert!(!TrapFrame { cs: 0x08, ..frame }.from_user());
    }
}
