//! # Voxel Sandbox Entry Point
//!
//! Native entry point; the web build starts through `run_web()` in the library.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release
//! ```
//!
//! F1 saves the current edits and F2 loads them back.

fn main() {
    #[cfg(not(target_family = "wasm"))]
    voxel_sandbox::run();
}
