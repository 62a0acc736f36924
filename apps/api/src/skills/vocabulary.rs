//! Vocabulary Store: the canonical skill vocabulary and the role catalog it is built from.
//!
//! Both are loaded once at startup and shared read-only behind `Arc` by the normalizer,
//! extractor and handlers. A failed load aborts startup: the service never runs on an
//! empty or partial vocabulary.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed vocabulary source {origin}: {message}")]
    Malformed { origin: String, message: String },

    #[error("vocabulary is empty after merging all sources")]
    Empty,

    #[error("failed to build skill matcher: {0}")]
    Automaton(#[from] aho_corasick::BuildError),
}

// ────────────────────────────────────────────────────────────────────────────
// Role catalog
// ────────────────────────────────────────────────────────────────────────────

/// A named role and its required skills, in file order. Duplicates are kept as-is.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub skills: Vec<String>,
}

/// All role definitions, in the order they appear in the source document.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: Vec<RoleDefinition>,
}

impl RoleCatalog {
    pub fn new(roles: Vec<RoleDefinition>) -> Self {
        Self { roles }
    }

    /// Loads a JSON object mapping role name → array of skill strings.
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let value = read_json(path)?;
        Self::from_value(&value, &path.display().to_string())
    }

    pub fn from_value(value: &Value, origin: &str) -> Result<Self, VocabularyError> {
        let object = value.as_object().ok_or_else(|| VocabularyError::Malformed {
            origin: origin.to_string(),
            message: "expected an object of role name → skill list".to_string(),
        })?;

        let mut roles = Vec::with_capacity(object.len());
        for (name, skills) in object {
            if name.trim().is_empty() {
                return Err(VocabularyError::Malformed {
                    origin: origin.to_string(),
                    message: "role name must not be blank".to_string(),
                });
            }
            let skills = parse_skill_list(skills, &format!("{origin} (role '{name}')"))?;
            roles.push(RoleDefinition {
                name: name.clone(),
                skills,
            });
        }

        Ok(Self { roles })
    }

    pub fn names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Every skill referenced by any role, flattened, duplicates included.
    pub fn all_skills(&self) -> impl Iterator<Item = &String> {
        self.roles.iter().flat_map(|r| r.skills.iter())
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// The canonical, deduplicated skill vocabulary.
///
/// Invariants:
/// - `skills` is sorted by codepoint and unique case-insensitively
/// - `lowercase[i] == skills[i].to_lowercase()` for every `i`
/// - `index` maps each lowercase form to its position
#[derive(Debug, Clone)]
pub struct Vocabulary {
    skills: Vec<String>,
    lowercase: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Loads the flat skills list at `skills_path` and unions it with every role skill.
    pub fn load(skills_path: &Path, roles: &RoleCatalog) -> Result<Self, VocabularyError> {
        let value = read_json(skills_path)?;
        let known = parse_skill_list(&value, &skills_path.display().to_string())?;
        Self::from_sources(known, roles)
    }

    /// Unions both sources, sorts, and collapses entries that differ only by case.
    /// When two spellings collide, the one that sorts first is kept.
    pub fn from_sources(known: Vec<String>, roles: &RoleCatalog) -> Result<Self, VocabularyError> {
        let mut merged: Vec<String> = known
            .into_iter()
            .chain(roles.all_skills().cloned())
            .collect();
        merged.sort();
        merged.dedup();

        let mut skills = Vec::with_capacity(merged.len());
        let mut lowercase = Vec::with_capacity(merged.len());
        let mut index = HashMap::with_capacity(merged.len());

        for skill in merged {
            let lower = skill.to_lowercase();
            if index.contains_key(&lower) {
                continue;
            }
            index.insert(lower.clone(), skills.len());
            skills.push(skill);
            lowercase.push(lower);
        }

        if skills.is_empty() {
            return Err(VocabularyError::Empty);
        }

        Ok(Self {
            skills,
            lowercase,
            index,
        })
    }

    /// Canonical entries in vocabulary order.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Lowercase projection, parallel to `skills()`.
    pub fn lowercase(&self) -> &[String] {
        &self.lowercase
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Case-insensitive lookup returning the canonical casing.
    pub fn canonical(&self, raw: &str) -> Option<&str> {
        self.index
            .get(&raw.to_lowercase())
            .map(|&i| self.skills[i].as_str())
    }

    /// Case-sensitive membership test.
    pub fn contains(&self, skill: &str) -> bool {
        self.skills.binary_search_by(|s| s.as_str().cmp(skill)).is_ok()
    }
}

/// Loads the role catalog and the vocabulary built from it. Any failure is fatal.
pub fn load_sources(
    skills_path: &Path,
    roles_path: &Path,
) -> Result<(Vocabulary, RoleCatalog), VocabularyError> {
    let roles = RoleCatalog::load(roles_path)?;
    let vocabulary = Vocabulary::load(skills_path, &roles)?;

    info!(
        "Loaded vocabulary: {} canonical skills, {} roles",
        vocabulary.len(),
        roles.len()
    );

    Ok((vocabulary, roles))
}

fn read_json(path: &Path) -> Result<Value, VocabularyError> {
    let raw = std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| VocabularyError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Parses an array of non-blank strings; entries are trimmed.
fn parse_skill_list(value: &Value, origin: &str) -> Result<Vec<String>, VocabularyError> {
    let malformed = |message: String| VocabularyError::Malformed {
        origin: origin.to_string(),
        message,
    };

    let items = value
        .as_array()
        .ok_or_else(|| malformed("expected an array of skill strings".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let skill = item
                .as_str()
                .ok_or_else(|| malformed(format!("entry {i} is not a string: {item}")))?
                .trim();
            if skill.is_empty() {
                return Err(malformed(format!("entry {i} is blank")));
            }
            Ok(skill.to_string())
        })
        .collect()
}
