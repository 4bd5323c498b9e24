//! Build script for the Snippy Tauri app.
//!
//! Only the Tauri codegen step is needed: it embeds `tauri.conf.json`,
//! the capability files and the Windows resource (icon) into the binary.
//! Screen capture and clipboard access are plain crates, no native glue.

fn main() {
    tauri_build::build();
}
