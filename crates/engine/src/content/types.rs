use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const ROSTER_FORMAT_VERSION: &str = "1.0";
pub const CHARACTER_FOLDER_PREFIX: &str = "character_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegType {
    Pants,
    Leggings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAttributes {
    pub skin_color: String,
    pub hair_color: String,
    pub hair_style: String,
    pub shirt_color: String,
    pub leg_color: String,
    pub leg_type: LegType,
    pub shoe_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRef {
    pub url: String,
    pub generated: String,
    #[serde(default)]
    pub layers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSprites {
    pub idle: SpriteRef,
    pub walk: SpriteRef,
    pub sit: SpriteRef,
}

/// Free-form text that ships alongside a character until it is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterText {
    pub answer: String,
    pub short_answer: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: u32,
    pub gender: Gender,
    pub description: String,
    pub attributes: CharacterAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<CharacterText>,
    pub sprites: CharacterSprites,
}

impl CharacterRecord {
    pub fn folder_name(&self) -> String {
        character_folder_name(self.id)
    }
}

/// The consolidated `all-characters.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedRoster {
    pub version: String,
    pub total_characters: usize,
    pub generated_at: String,
    pub characters: BTreeMap<String, CharacterRecord>,
}

impl ConsolidatedRoster {
    pub fn new(generated_at: String, records: impl IntoIterator<Item = CharacterRecord>) -> Self {
        let characters: BTreeMap<String, CharacterRecord> = records
            .into_iter()
            .map(|record| (record.folder_name(), record))
            .collect();
        Self {
            version: ROSTER_FORMAT_VERSION.to_string(),
            total_characters: characters.len(),
            generated_at,
            characters,
        }
    }
}

/// `character_0001` style folder and key name for a character id.
pub fn character_folder_name(id: u32) -> String {
    format!("{CHARACTER_FOLDER_PREFIX}{id:04}")
}

pub fn sprite_url(folder: &str, sprite_name: &str) -> String {
    format!("/characters/{folder}/{sprite_name}.png")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn sample_record(id: u32) -> CharacterRecord {
        let folder = character_folder_name(id);
        let sprite = |name: &str| SpriteRef {
            url: sprite_url(&folder, name),
            generated: "2024-01-01T00:00:00".to_string(),
            layers: vec!["body".to_string(), format!("hair_{id}")],
        };
        CharacterRecord {
            id,
            gender: if id % 2 == 0 { Gender::Female } else { Gender::Male },
            description: format!("villager number {id}"),
            attributes: CharacterAttributes {
                skin_color: "light".to_string(),
                hair_color: format!("shade_{}", id % 7),
                hair_style: "bob".to_string(),
                shirt_color: "blue".to_string(),
                leg_color: "black".to_string(),
                leg_type: if id % 3 == 0 {
                    LegType::Leggings
                } else {
                    LegType::Pants
                },
                shoe_color: "brown".to_string(),
            },
            text: None,
            sprites: CharacterSprites {
                idle: sprite("idle"),
                walk: sprite("walk"),
                sit: sprite("sit"),
            },
        }
    }
}
