//! PIC (8259) - ремаппинг IRQ 0–15 на векторы 0x20–0x2F.
//! PIC (8259) - remaps IRQ 0–15 to vectors 0x20–0x2F.
//!
//! По умолчанию IRQ 0–7 → векторы 0x08–0x0F - конфликт с исключениями!
//! By default IRQ 0–7 → vectors 0x08–0x0F - conflicts with exceptions!

use crate::config::{PIC1_OFFSET, PIC2_OFFSET};

pub const PIC1_CMD:  u16 = 0x20;
pub const PIC1_DATA: u16 = 0x21;
pub const PIC2_CMD:  u16 = 0xA0;
pub const PIC2_DATA: u16 = 0xA1;

pub const ICW1_INIT: u8 = 0x11;
/// Ведомый на IRQ2 / Slave on IRQ2
pub const ICW3_MASTER: u8 = 0x04;
/// Идентификатор ведомого / Slave identity
pub const ICW3_SLAVE:  u8 = 0x02;
pub const ICW4_8086:   u8 = 0x01;
pub const EOI:         u8 = 0x20;

/// Линии, которые остаются открытыми / Lines left unmasked
pub const ENABLED_IRQS: &[u8] = &[0, 1]; // Timer, Keyboard

/// Маски (master, slave): бит 1 - линия закрыта.
/// Masks (master, slave): bit set means the line is masked.
pub const fn masks(enabled: &[u8]) -> (u8, u8) {
    let mut master = 0xFFu8;
    let mut slave = 0xFFu8;
    let mut i = 0;
    while i < enabled.len() {
        let irq = enabled[i];
        if irq < 8 {
            master &= !(1 << irq);
        } else if irq < 16 {
            slave &= !(1 << (irq - 8));
        }
        i += 1;
    }
    (master, slave)
}

/// Нужен ли EOI ведомому для этого вектора / Whether the slave needs EOI for this vector
pub const fn needs_slave_eoi(vector: u8) -> bool {
    vector >= PIC2_OFFSET && vector < PIC2_OFFSET + 8
}

#[cfg(target_arch = "x86")]
mod hw {
    use super::*;
    use crate::arch::x86::port::{io_wait, outb};

    /// Инициализировать PIC.
    /// Initialize PIC.
    ///
    /// # Safety
    /// Вызывать с выключенными прерываниями / Call with interrupts disabled
    pub unsafe fn init() {
        let (master, slave) = masks(ENABLED_IRQS);
        unsafe {
            // ICW1: начало инициализации / start initialization
            outb(PIC1_CMD, ICW1_INIT);
            io_wait();
            outb(PIC2_CMD, ICW1_INIT);
            io_wait();
            // ICW2: векторные смещения / vector offsets
            outb(PIC1_DATA, PIC1_OFFSET);
            io_wait();
            outb(PIC2_DATA, PIC2_OFFSET);
            io_wait();
            // ICW3: каскадирование / cascade
            outb(PIC1_DATA, ICW3_MASTER);
            io_wait();
            outb(PIC2_DATA, ICW3_SLAVE);
            io_wait();
            // ICW4: режим 8086 / 8086 mode
            outb(PIC1_DATA, ICW4_8086);
            io_wait();
            outb(PIC2_DATA, ICW4_8086);
            io_wait();

            outb(PIC1_DATA, master);
            outb(PIC2_DATA, slave);
        }
    }

    /// Сообщить PIC об окончании обработки прерывания.
    /// Send End-Of-Interrupt to PIC.
    pub fn end_of_interrupt(vector: u8) {
        unsafe {
            if needs_slave_eoi(vector) {
                outb(PIC2_CMD, EOI);
            }
            outb(PIC1_CMD, EOI);
        }
    }
}

#[cfg(target_arch = "x86")]
pub use hw::{end_of_interrupt, init};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timer_and_keyboard_are_open() {
        assert_eq!(masks(ENABLED_IRQS), (0xFC, 0xFF));
    }

    #[test]
    fn slave_lines_clear_slave_bits() {
        assert_eq!(masks(&[2, 12]), (0xFB, 0xEF));
        assert_eq!(masks(&[]), (0xFF, 0xFF));
    }

    #[test]
    fn eoi_routing() {
        assert!(!needs_slave_eoi(0x20));
        assert!(!needs_slave_eoi(0x27));
        assert!(needs_slave_eoi(0x28));
        assert!(needs_slave_eoi(0x2F));
        assert!(!needs_slave_eoi(0x80));
    }
}
