//! Kernel-space drivers
//!
//! Минимально необходимые / Minimum required:
//!   - UART/Serial  - журнал и вывод `write` / the log and `write` output
//!   - Keyboard     - кольцо скан-кодов для внешней оболочки / scancode ring for the external shell
//!   - VGA          - маркеры фатальных путей / fatal path markers

pub mod keyboard;
#[cfg(target_arch = "x86")]
pub mod uart;
#[cfg(target_arch = "x86")]
pub mod vga;

/// Макрос для отладочного вывода.
/// Debug print macro.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::drivers::uart::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kprintln {
    ()           => ($crate::kprint!("\n"));
    ($($arg:tt)*) => ($crate::kprint!("{}\n", format_args!($($arg)*)));
}
