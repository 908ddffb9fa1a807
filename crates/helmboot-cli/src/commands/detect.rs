//! Detect command - inspect a local archive

use console::style;
use helmboot_core::{Platform, TargetDescriptor, list_entries};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{CliError, Result};

pub fn run(archive: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| CliError::Io {
        message: format!("{}: {}", archive.display(), e),
    })?;
    let (format, entries) = list_entries(BufReader::new(file))?;

    let compression = format.compression.map_or("none", |c| c.as_str());
    println!("{}: {}", style("Compression").bold(), compression);
    println!("{}: {}", style("Container").bold(), format.container.as_str());
    println!("{}: {}", style("Entries").bold(), entries.len());

    let target = TargetDescriptor::helm(&Platform::current());
    let found = entries
        .iter()
        .find(|e| !e.is_dir && target.matches_entry(&e.path));
    match found {
        Some(entry) => println!(
            "{}: {} ({} bytes)",
            style("Target").bold(),
            style(&entry.path).cyan(),
            entry.size
        ),
        None => println!(
            "{}: {} not found",
            style("Target").bold(),
            style(target.file_name()).yellow()
        ),
    }

    Ok(())
}
