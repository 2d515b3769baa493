//! Build script rendering the `engine-bridge(1)` manual page.
//!
//! The page documents the dry-run assembly flags straight from the `clap`
//! definition in `src/cli.rs` and is written to
//! `target/generated-man/engine-bridge.1`.

use std::{fs, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = PathBuf::from("target/generated-man");
    fs::create_dir_all(&out_dir)?;

    let man = Man::new(cli::Cli::command())
        .title("ENGINE-BRIDGE")
        .section("1");
    let mut buf: Vec<u8> = Vec::new();
    man.render(&mut buf)?;
    fs::write(out_dir.join("engine-bridge.1"), buf)?;

    Ok(())
}
