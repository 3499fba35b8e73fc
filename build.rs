// build.rs

//! Renders `man/packsmith.1` from the same clap definitions the binary uses.

use clap::CommandFactory;
use clap_mangen::Man;
use std::path::PathBuf;

#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn render_man_page() -> std::io::Result<PathBuf> {
    let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| std::io::Error::other("CARGO_MANIFEST_DIR not set"))?;
    let man_dir = manifest_dir.join("man");
    std::fs::create_dir_all(&man_dir)?;

    let mut page = Vec::new();
    Man::new(cli::Cli::command()).render(&mut page)?;

    let path = man_dir.join("packsmith.1");
    std::fs::write(&path, page)?;
    Ok(path)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli.rs");

    if let Err(e) = render_man_page() {
        println!("cargo:warning=Failed to generate man page: {}", e);
    }
}
