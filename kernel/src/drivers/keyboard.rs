//! PS/2 keyboard - кольцо скан-кодов
//!
//! Обработчик IRQ1 кладёт коды нажатий (отпускания отбрасываются),
//! внешняя оболочка забирает их из главного цикла. Один писатель и один
//! читатель, без блокировок; при переполнении новые коды теряются.
//! The IRQ1 handler pushes press codes (releases are dropped), the
//! external shell takes them from the main loop. One producer and one
//! consumer, lock-free; on overflow new codes are lost.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::config::KEYBOARD_RING_SIZE;

/// Порт данных контроллера / Controller data port
pub const DATA_PORT: u16 = 0x60;

/// Порт состояния и команд контроллера 8042 / 8042 status and command port
pub const STATUS_PORT: u16 = 0x64;
pub const COMMAND_PORT: u16 = 0x64;

/// Бит отпускания клавиши / Key release bit
const RELEASE: u8 = 0x80;

/// Биты состояния / Status bits
const OUTPUT_FULL: u8 = 0x01;
const INPUT_FULL: u8 = 0x02;

/// Команды контроллера / Controller commands
const CMD_READ_CONFIG: u8 = 0x20;
const CMD_WRITE_CONFIG: u8 = 0x60;
const CMD_DISABLE_PORT2: u8 = 0xA7;
const CMD_DISABLE_PORT1: u8 = 0xAD;
const CMD_ENABLE_PORT1: u8 = 0xAE;

/// Команда устройству и его ответ / Device command and its reply
const DEV_RESET: u8 = 0xFF;
const DEV_ACK: u8 = 0xFA;

/// Сколько раз опросить статус, прежде чем сдаться / Status polls before giving up
const WAIT_SPINS: u32 = 100_000;

/// Байт конфигурации: IRQ1 включён, IRQ12 выключен.
/// Config byte: IRQ1 on, IRQ12 off.
pub const fn configure(config: u8) -> u8 {
    (config | 0x01) & !0x02
}

/// Поднять контроллер 8042 до включения прерываний.
/// Bring up the 8042 controller before interrupts are enabled.
///
/// Оба порта гасятся, буфер вывода сбрасывается, в конфигурации
/// включается IRQ1 и выключается IRQ12, затем устройство сбрасывается.
/// Без ACK ядро только предупреждает и продолжает.
/// Both ports are disabled, the output buffer is flushed, the config
/// enables IRQ1 and disables IRQ12, then the device is reset.
/// A missing ACK only produces a warning.
#[cfg(target_arch = "x86")]
pub fn init() {
    use crate::arch::x86::port::{inb, outb};
    use log::{info, warn};

    fn wait_input_empty() -> bool {
        (0..WAIT_SPINS).any(|_| unsafe { inb(STATUS_PORT) } & INPUT_FULL == 0)
    }

    fn wait_output_full() -> bool {
        (0..WAIT_SPINS).any(|_| unsafe { inb(STATUS_PORT) } & OUTPUT_FULL != 0)
    }

    fn command(cmd: u8) {
        wait_input_empty();
        // SAFETY: команда контроллеру 8042 / a command to the 8042
        unsafe { outb(COMMAND_PORT, cmd) };
    }

    fn send(byte: u8) {
        wait_input_empty();
        // SAFETY: байт в порт данных 8042 / a byte to the 8042 data port
        unsafe { outb(DATA_PORT, byte) };
    }

    fn receive() -> Option<u8> {
        // SAFETY: чтение порта данных только при полном буфере
        // the data port is read only when the buffer is full
        wait_output_full().then(|| unsafe { inb(DATA_PORT) })
    }

    command(CMD_DISABLE_PORT1);
    command(CMD_DISABLE_PORT2);
    // SAFETY: сброс остатков вывода / flush leftover output
    unsafe { inb(DATA_PORT) };
    command(CMD_ENABLE_PORT1);

    command(CMD_READ_CONFIG);
    let Some(config) = receive() else {
        warn!("keyboard: controller did not return its config");
        return;
    };
    command(CMD_WRITE_CONFIG);
    send(configure(config));

    send(DEV_RESET);
    match receive() {
        Some(DEV_ACK) => info!("keyboard: 8042 ready, config={:#04x}", configure(config)),
        Some(reply) => warn!("keyboard: reset failed, reply {:#04x}", reply),
        None => warn!("keyboard: reset failed, no reply"),
    }
}

pub struct ScancodeRing {
    buf:  [AtomicU8; KEYBOARD_RING_SIZE],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl ScancodeRing {
    pub const fn new() -> Self {
        Self {
            buf:  [const { AtomicU8::new(0) }; KEYBOARD_RING_SIZE],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Положить код нажатия; false если отпускание или кольцо полно.
    /// Push a press code; false for a release or a full ring.
    pub fn record(&self, scancode: u8) -> bool {
        if scancode & RELEASE != 0 {
            return false;
        }
        self.push(scancode)
    }

    fn push(&self, code: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= KEYBOARD_RING_SIZE {
            return false;
        }
        self.buf[head % KEYBOARD_RING_SIZE].store(code, Ordering::Relaxed);
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail == head {
            return None;
        }
        let code = self.buf[tail % KEYBOARD_RING_SIZE].load(Ordering::Relaxed);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(code)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(self.tail.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScancodeRing {
    fn default() -> Self {
        Self::new()
    }
}

pub static SCANCODES: ScancodeRing = ScancodeRing::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_enables_irq1_and_masks_irq12() {
        assert_eq!(configure(0x00), 0x01);
        assert_eq!(configure(0x02), 0x01);
        assert_eq!(configure(0x47), 0x45);
        assert_eq!(configure(0xFF), 0xFD);
    }

    #[test]
    fn releases_are_ignored() {
        let ring = ScancodeRing::new();
        assert!(ring.record(0x1E)); // 'a' нажата / 'a' pressed
        assert!(!ring.record(0x9E)); // 'a' отпущена / 'a' released
        assert_eq!(ring.pop(), Some(0x1E));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn keeps_order() {
        let ring = ScancodeRing::new();
        for code in [0x10, 0x11, 0x12] {
            ring.record(code);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.pop(), Some(0x10));
        assert_eq!(ring.pop(), Some(0x11));
        assert_eq!(ring.pop(), Some(0x12));
        assert!(ring.is_empty());
    }

    #[test]
    fn overflow_drops_new_codes() {
        let ring = ScancodeRing::new();
        for i in 0..KEYBOARD_RING_SIZE {
            assert!(ring.record((i % 0x7F) as u8));
        }
        assert!(!ring.record(0x01));
        assert_eq!(ring.len(), KEYBOARD_RING_SIZE);
        assert_eq!(ring.pop(), Some(0));
        assert!(ring.record(0x01));
    }
}
