use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use engine::content::{roster_path, write_roster, CharacterRecord, ConsolidatedRoster, RosterWriteError};

mod consolidate;
mod download;
mod fetch;
mod layout;

pub use consolidate::{consolidate, strip_text_files, ConsolidateOptions, ConsolidateReport, StripSummary};
pub use download::{
    download_all, download_character, DownloadError, DownloadOptions, DownloadReport,
    DEFAULT_BASE_URL, DEFAULT_CHARACTER_COUNT, DEFAULT_CONCURRENCY,
};
pub use fetch::{fetch_with_retry, FetchError, Fetcher, HttpFetcher, RetryPolicy};
pub use layout::{
    assemble_record, read_character_folder, CharacterSources, LayoutError, RawCharacterData,
    RawSpriteInfo,
};

/// A character left out of the consolidated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterFailure {
    pub id: u32,
    pub reason: String,
}

pub fn characters_dir(public_root: &Path) -> PathBuf {
    public_root.join("characters")
}

/// Writes `all-characters.json` below `public_root`, stamped with the
/// current UTC time.
pub(crate) fn write_consolidated(
    public_root: &Path,
    records: impl IntoIterator<Item = CharacterRecord>,
) -> Result<PathBuf, RosterWriteError> {
    let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let document = ConsolidatedRoster::new(generated_at, records);
    let path = roster_path(public_root);
    write_roster(&path, &document)?;
    Ok(path)
}
