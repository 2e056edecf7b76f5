//! Routines command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use graft_core::{MetadataProvider, load_dump};

pub fn run(dump_path: &Path, type_name: Option<&str>) -> Result<()> {
    let dump = load_dump(dump_path)
        .with_context(|| format!("Failed to load metadata dump {}", dump_path.display()))?;

    match type_name {
        Some(name) => {
            if !dump.type_exists(name) {
                bail!("Type not found in dump: {}", name);
            }
            let routines = dump.list_routines(name)?;
            println!("{} ({} routines)", name, routines.len());
            for routine in routines {
                println!("  {} {}", routine.token, routine.signature());
            }
        }
        None => {
            println!(
                "Dump version: {}",
                if dump.version.is_empty() {
                    "unknown"
                } else {
                    dump.version.as_str()
                }
            );
            for ty in &dump.types {
                println!("{} ({} routines)", ty.name, ty.routines.len());
            }
        }
    }

    Ok(())
}
