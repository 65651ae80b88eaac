//! Subject Cutout CLI Tool
//!
//! Command-line interface for removing backgrounds from photographs with the
//! bgcutout library, backed by ONNX Runtime.

#[cfg(feature = "cli")]
use bgcutout::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
