mod atomic_io;
mod roster;
pub(crate) mod types;

pub use atomic_io::{write_bytes_atomic, write_text_atomic};
pub use roster::{
    load_roster, parse_roster, roster_path, write_roster, Roster, RosterLoadError,
    RosterWriteError, ROSTER_RELATIVE_PATH,
};
pub use types::{
    character_folder_name, sprite_url, CharacterAttributes, CharacterRecord, CharacterSprites,
    CharacterText, ConsolidatedRoster, Gender, LegType, SpriteRef, CHARACTER_FOLDER_PREFIX,
    ROSTER_FORMAT_VERSION,
};
