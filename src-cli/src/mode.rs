//! Run-mode selection when a previous export already exists.

use crate::console::Console;
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Collect from scratch, replacing the file
    Fresh,
    /// Load the file and continue with enrichment
    Resume,
    Exit,
}

const CHOICES: [&str; 3] = [
    "Start over (the existing file will be replaced)",
    "Continue with enrichment using the existing file",
    "Exit",
];

/// Decide how to run. Without an existing export the answer is always `Fresh`.
pub fn choose(console: &Console, path: &Path) -> Result<RunMode> {
    if !path.exists() {
        return Ok(RunMode::Fresh);
    }

    console.header("Existing spreadsheet found");
    console.line(&format!("File: {}", path.display()));
    match prowl_export::import_records(path) {
        Ok(imported) => console.line(&format!("Records: {}", imported.records.len())),
        Err(e) => console.warning(&format!("Could not read the file: {e}")),
    }

    let choice = console.select("What do you want to do?", &CHOICES, 0)?;
    let overwrite_confirmed = if choice == 0 {
        console.confirm("The existing file will be replaced. Continue?", true)?
    } else {
        false
    };

    Ok(mode_for(choice, overwrite_confirmed))
}

fn mode_for(choice: usize, overwrite_confirmed: bool) -> RunMode {
    match choice {
        0 if overwrite_confirmed => RunMode::Fresh,
        1 => RunMode::Resume,
        _ => RunMode::Exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_for_choices() {
        assert_eq!(mode_for(0, true), RunMode::Fresh);
        assert_eq!(mode_for(0, false), RunMode::Exit);
        assert_eq!(mode_for(1, false), RunMode::Resume);
        assert_eq!(mode_for(2, false), RunMode::Exit);
    }

    #[test]
    fn test_missing_file_means_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let console = Console::new(true);
        let mode = choose(&console, &dir.path().join("producthunt.xlsx")).unwrap();
        assert_eq!(mode, RunMode::Fresh);
    }
}
