use std::fs;
use std::io;
use std::path::PathBuf;

use engine::content::{character_folder_name, RosterWriteError};
use tracing::{info, warn};

use crate::layout::{read_character_folder, STRIPPED_TEXT_FILES};
use crate::{characters_dir, write_consolidated, CharacterFailure};

#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    pub public_root: PathBuf,
    pub count: u32,
    /// Delete the answer files first and leave the text block out.
    pub strip_text: bool,
}

#[derive(Debug)]
pub struct ConsolidateReport {
    pub records: usize,
    pub failed: Vec<CharacterFailure>,
    pub removed_files: usize,
    pub roster_path: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StripSummary {
    pub removed: usize,
    pub missing_folders: usize,
    pub errors: usize,
}

/// Removes the answer text files from every character folder in
/// `1..=count`. Folders that do not exist are counted and skipped.
pub fn strip_text_files(options: &ConsolidateOptions) -> StripSummary {
    let root = characters_dir(&options.public_root);
    let mut summary = StripSummary::default();
    for id in 1..=options.count {
        let folder = character_folder_name(id);
        let dir = root.join(&folder);
        if !dir.is_dir() {
            warn!(folder = %folder, "character_folder_missing");
            summary.missing_folders += 1;
            continue;
        }
        for file in STRIPPED_TEXT_FILES {
            match fs::remove_file(dir.join(file)) {
                Ok(()) => summary.removed += 1,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                Err(error) => {
                    warn!(folder = %folder, file, error = %error, "text_file_remove_failed");
                    summary.errors += 1;
                }
            }
        }
    }
    info!(
        removed = summary.removed,
        missing_folders = summary.missing_folders,
        errors = summary.errors,
        "text_files_stripped"
    );
    summary
}

/// Rebuilds the consolidated document from the folders already on disk.
pub fn consolidate(options: &ConsolidateOptions) -> Result<ConsolidateReport, RosterWriteError> {
    let removed_files = if options.strip_text {
        strip_text_files(options).removed
    } else {
        0
    };

    let root = characters_dir(&options.public_root);
    let mut records = Vec::new();
    let mut failed = Vec::new();
    for id in 1..=options.count {
        let folder = character_folder_name(id);
        match read_character_folder(&root.join(&folder), &folder, !options.strip_text) {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!(id, error = %error, "character_consolidate_failed");
                failed.push(CharacterFailure {
                    id,
                    reason: error.to_string(),
                });
            }
        }
    }

    let count = records.len();
    let roster_path = write_consolidated(&options.public_root, records)?;
    info!(
        characters = count,
        failed = failed.len(),
        strip_text = options.strip_text,
        path = %roster_path.display(),
        "roster_consolidated"
    );
    Ok(ConsolidateReport {
        records: count,
        failed,
        removed_files,
        roster_path,
    })
}
