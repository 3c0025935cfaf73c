//! UART Serial driver - COM1 (0x3F8)
//!
//! Используется для журнала и вывода syscall `write`.
//! Used for the log and for the `write` syscall output.
//!
//! Запуск / Run:
//!   qemu-system-i386 -serial stdio -kernel kernel

use core::fmt;
use spin::Mutex;

use crate::arch::x86::cpu::without_interrupts;
use crate::arch::x86::port::{inb, outb};
use crate::config::COM1;
use crate::syscall::Console;

/// Инициализировать COM1 на 115200 baud.
/// Initialize COM1 at 115200 baud.
pub fn init() {
    unsafe {
        outb(COM1 + 1, 0x00); // Отключить прерывания / Disable interrupts
        outb(COM1 + 3, 0x80); // Включить DLAB (Divisor Latch)
        outb(COM1, 0x01);     // Делитель 1 → 115200 baud
        outb(COM1 + 1, 0x00);
        outb(COM1 + 3, 0x03); // 8 бит, нет чётности, 1 стоп-бит
        outb(COM1 + 2, 0xC7); // Enable FIFO, clear, 14-byte threshold
        outb(COM1 + 4, 0x0B); // RTS/DSR
    }
}

/// Ждать пока буфер передачи свободен и отправить байт.
/// Wait for transmit buffer empty and send byte.
fn send_byte(byte: u8) {
    unsafe {
        // Ждём пока регистр пуст (бит 5 LSR) / Wait until THR empty (LSR bit 5)
        while inb(COM1 + 5) & 0x20 == 0 {}
        outb(COM1, byte);
    }
}

fn send(bytes: &[u8]) {
    for &byte in bytes {
        if byte == b'\n' {
            send_byte(b'\r');
        }
        send_byte(byte);
    }
}

// ── fmt::Write для использования с format_args! ───────────────────────────────

struct UartWriter;

impl fmt::Write for UartWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        send(s.as_bytes());
        Ok(())
    }
}

static UART_LOCK: Mutex<UartWriter> = Mutex::new(UartWriter);

/// Внутренняя функция для макроса kprint!
/// Internal function for kprint! macro
///
/// Блокировка берётся с выключенными прерываниями, чтобы обработчик
/// не ждал её вечно.
/// The lock is taken with interrupts disabled so a handler never waits
/// on it forever.
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    without_interrupts(|| {
        UART_LOCK.lock().write_fmt(args).ok();
    });
}

/// Консоль syscall `write` / Console for the `write` syscall
pub struct SerialConsole;

impl Console for SerialConsole {
    fn write_bytes(&mut self, bytes: &[u8]) {
        without_interrupts(|| {
            let _guard = UART_LOCK.lock();
            send(bytes);
        });
    }
}
