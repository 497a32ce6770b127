use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::write_text_atomic;
use super::types::{character_folder_name, CharacterRecord, ConsolidatedRoster};

/// Location of the consolidated document below the public root.
pub const ROSTER_RELATIVE_PATH: &str = "characters/data/all-characters.json";

pub fn roster_path(public_root: &Path) -> PathBuf {
    ROSTER_RELATIVE_PATH
        .split('/')
        .fold(public_root.to_path_buf(), |path, segment| path.join(segment))
}

#[derive(Debug, Error)]
pub enum RosterLoadError {
    #[error("failed to read character data {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse character data {path} at `{json_path}`: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("character data {path}: entry `{key}` holds character {id}, expected key `{expected}`")]
    KeyMismatch {
        path: PathBuf,
        key: String,
        id: u32,
        expected: String,
    },
    #[error("character data {path} contains no characters")]
    Empty { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum RosterWriteError {
    #[error("failed to serialize character data: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write character data {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read-only set of characters, shared by every entity spawned from it.
#[derive(Debug, Clone)]
pub struct Roster {
    generated_at: String,
    characters: Vec<Arc<CharacterRecord>>,
}

impl Roster {
    pub fn from_document(document: ConsolidatedRoster) -> Self {
        Self {
            generated_at: document.generated_at,
            characters: document.characters.into_values().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    /// Characters in ascending id order.
    pub fn characters(&self) -> &[Arc<CharacterRecord>] {
        &self.characters
    }

    pub fn get(&self, id: u32) -> Option<&Arc<CharacterRecord>> {
        self.characters.iter().find(|record| record.id == id)
    }

    /// Up to `count` distinct characters drawn uniformly at random.
    pub fn select_random(&self, count: usize, rng: &mut impl Rng) -> Vec<Arc<CharacterRecord>> {
        let mut picked = self.characters.clone();
        picked.shuffle(rng);
        picked.truncate(count);
        picked
    }
}

pub fn load_roster(path: &Path) -> Result<Roster, RosterLoadError> {
    let json = fs::read_to_string(path).map_err(|source| RosterLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_roster(&json, path)?;
    let roster = Roster::from_document(document);
    info!(
        path = %path.display(),
        characters = roster.len(),
        generated_at = roster.generated_at(),
        "roster_loaded"
    );
    Ok(roster)
}

/// Parses and checks a consolidated document. Every key must be the folder
/// name of the id it holds, and at least one character must be present.
pub fn parse_roster(json: &str, path: &Path) -> Result<ConsolidatedRoster, RosterLoadError> {
    let deserializer = &mut serde_json::Deserializer::from_str(json);
    let document: ConsolidatedRoster =
        serde_path_to_error::deserialize(deserializer).map_err(|error| {
            RosterLoadError::Parse {
                path: path.to_path_buf(),
                json_path: error.path().to_string(),
                source: error.into_inner(),
            }
        })?;

    for (key, record) in &document.characters {
        let expected = character_folder_name(record.id);
        if *key != expected {
            return Err(RosterLoadError::KeyMismatch {
                path: path.to_path_buf(),
                key: key.clone(),
                id: record.id,
                expected,
            });
        }
    }
    if document.characters.is_empty() {
        return Err(RosterLoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    if document.total_characters != document.characters.len() {
        warn!(
            path = %path.display(),
            declared = document.total_characters,
            actual = document.characters.len(),
            "roster_count_mismatch"
        );
    }
    Ok(document)
}

pub fn write_roster(path: &Path, document: &ConsolidatedRoster) -> Result<(), RosterWriteError> {
    let json = serde_json::to_string_pretty(document).map_err(RosterWriteError::Serialize)?;
    write_text_atomic(path, &json).map_err(|source| RosterWriteError::Write {
        path: path.to_path_buf(),
        source,
    })
}
