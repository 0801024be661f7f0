//! Build script rendering the `sni-peek(1)` manual page from the `clap`
//! definition in `src/cli.rs`.
//!
//! The page is written to `target/generated-man/sni-peek.1`.

use std::{fs, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let man_dir = PathBuf::from("target/generated-man");
    fs::create_dir_all(&man_dir)?;

    let mut page = Vec::new();
    Man::new(cli::Cli::command())
        .source(concat!("sni-peek ", env!("CARGO_PKG_VERSION")))
        .render(&mut page)?;
    fs::write(man_dir.join("sni-peek.1"), page)?;

    Ok(())
}
