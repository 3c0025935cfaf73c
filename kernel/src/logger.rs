//! Журнал ядра поверх COM1 / Kernel log over COM1
//!
//! Формат / Format: `[LEVEL target] message`

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::kprintln;

struct SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            kprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

/// Установить журнал; UART должен быть уже инициализирован.
/// Install the logger; the UART must already be initialized.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
