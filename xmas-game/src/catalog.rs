//! Static reference data: challenge modifiers, their options, and titles.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub(crate) const DEFAULT_CATALOG_DATA: &str = include_str!("../data/catalog.json");

static EMBEDDED: Lazy<Catalog> = Lazy::new(Catalog::load_from_static);

/// A twist applied to a day's puzzle, e.g. "in a single file".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeModifier {
    pub id: u32,
    pub name: String,
    pub text: String,
    /// Whether a dependent `ModifierOption` must also be chosen
    #[serde(default)]
    pub has_options: bool,
    #[serde(default)]
    pub standard: bool,
    #[serde(default)]
    pub is_public: bool,
}

/// One pick from a modifier's "box", e.g. "Rust" for the C-like box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierOption {
    pub id: u32,
    pub challenge_modifier_id: u32,
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub standard: bool,
    #[serde(default)]
    pub is_public: bool,
}

/// Rank awarded to a finished game by score threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: u32,
    pub name: String,
    pub minimum_score: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },
    #[error("modifier option {option_id} references unknown challenge modifier {modifier_id}")]
    OrphanOption { option_id: u32, modifier_id: u32 },
    #[error("challenge modifier {modifier_id} has options enabled but none are defined")]
    MissingOptions { modifier_id: u32 },
}

/// Container for all reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub challenge_modifiers: Vec<ChallengeModifier>,
    #[serde(default)]
    pub modifier_options: Vec<ModifierOption>,
    #[serde(default)]
    pub titles: Vec<Title>,
}

impl Catalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load catalog data from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse the bundled catalog, falling back to an empty one.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_default()
    }

    /// Shared, lazily parsed copy of the bundled catalog.
    #[must_use]
    pub fn embedded() -> &'static Self {
        &EMBEDDED
    }

    #[must_use]
    pub fn modifier(&self, id: u32) -> Option<&ChallengeModifier> {
        self.challenge_modifiers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn option(&self, id: u32) -> Option<&ModifierOption> {
        self.modifier_options.iter().find(|o| o.id == id)
    }

    /// Options grouped under one challenge modifier, in catalog order.
    #[must_use]
    pub fn options_for(&self, modifier_id: u32) -> Vec<ModifierOption> {
        self.modifier_options
            .iter()
            .filter(|o| o.challenge_modifier_id == modifier_id)
            .cloned()
            .collect()
    }

    /// Highest title whose threshold the score reaches.
    #[must_use]
    pub fn title_for_score(&self, score: i32) -> Option<&Title> {
        self.titles
            .iter()
            .filter(|t| t.minimum_score <= score)
            .max_by_key(|t| t.minimum_score)
    }

    #[must_use]
    pub fn title(&self, id: u32) -> Option<&Title> {
        self.titles.iter().find(|t| t.id == id)
    }

    /// Check referential integrity between modifiers and options.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut modifier_ids = HashSet::new();
        for modifier in &self.challenge_modifiers {
            if !modifier_ids.insert(modifier.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "challenge modifier",
                    id: modifier.id,
                });
            }
        }

        let mut option_ids = HashSet::new();
        let mut parents_with_options = HashSet::new();
        for option in &self.modifier_options {
            if !option_ids.insert(option.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "modifier option",
                    id: option.id,
                });
            }
            if !modifier_ids.contains(&option.challenge_modifier_id) {
                return Err(CatalogError::OrphanOption {
                    option_id: option.id,
                    modifier_id: option.challenge_modifier_id,
                });
            }
            parents_with_options.insert(option.challenge_modifier_id);
        }

        if let Some(modifier) = self
            .challenge_modifiers
            .iter()
            .find(|m| m.has_options && !parents_with_options.contains(&m.id))
        {
            return Err(CatalogError::MissingOptions {
                modifier_id: modifier.id,
            });
        }

        let mut title_ids = HashSet::new();
        for title in &self.titles {
            if !title_ids.insert(title.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "title",
                    id: title.id,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_consistent() {
        let catalog = Catalog::embedded();
        assert_eq!(catalog.challenge_modifiers.len(), 33);
        assert_eq!(catalog.modifier_options.len(), 56);
        assert_eq!(catalog.titles.len(), 12);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn options_are_grouped_by_modifier() {
        let catalog = Catalog::embedded();
        let c_like = catalog
            .challenge_modifiers
            .iter()
            .find(|m| m.name == "c_like_box")
            .unwrap();
        assert!(c_like.has_options);
        let options = catalog.options_for(c_like.id);
        assert_eq!(options.len(), 8);
        assert!(options.iter().any(|o| o.text == "Rust"));
        assert!(
            options
                .iter()
                .all(|o| o.challenge_modifier_id == c_like.id)
        );
    }

    #[test]
    fn title_for_score_picks_highest_reached_threshold() {
        let catalog = Catalog::embedded();
        assert_eq!(catalog.title_for_score(0).unwrap().name, "Champion");
        assert_eq!(catalog.title_for_score(739).unwrap().name, "Righteous Champion");
        assert_eq!(catalog.title_for_score(740).unwrap().name, "Flawless Champion");
        assert_eq!(catalog.title_for_score(5000).unwrap().name, "Godlike Champion");
        assert!(catalog.title_for_score(-1).is_none());
    }

    #[test]
    fn validate_flags_orphans_and_missing_options() {
        let json = r#"{
            "challengeModifiers": [
                { "id": 1, "name": "box", "text": "box: ", "hasOptions": true }
            ],
            "modifierOptions": [
                { "id": 7, "challengeModifierId": 2, "name": "x", "text": "X" }
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::OrphanOption {
                option_id: 7,
                modifier_id: 2
            })
        );

        let catalog = Catalog {
            modifier_options: Vec::new(),
            ..catalog
        };
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::MissingOptions { modifier_id: 1 })
        );
    }
}
