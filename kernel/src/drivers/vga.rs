//! VGA text buffer - только маркеры фатальных путей.
//! VGA text buffer - fatal path markers only.

use crate::config::VGA_BUFFER;

/// Белый на красном / White on red
const MARKER_ATTR: u16 = 0x4F00;

/// Записать символ в левую верхнюю ячейку.
/// Write a character into the top-left cell.
pub fn put_marker(c: u8) {
    let cell = VGA_BUFFER as usize as *mut u16;
    // SAFETY: буфер VGA отображён всегда / the VGA buffer is always mapped
    unsafe { cell.write_volatile(MARKER_ATTR | c as u16) };
}
