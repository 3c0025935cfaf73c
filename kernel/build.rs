fn main() {
    // Tell Cargo to rerun if the linker script changes
    println!("cargo:rerun-if-changed=linker.ld");

    // Скрипт линковки нужен только ядру на голом железе
    // The linker script is only for the bare-metal kernel
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if os == "none" {
        let dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
        println!("cargo:rustc-link-arg-bin=kernel=-T{}/linker.ld", dir);
    }
}
