//! Artifact association: matching free-text files to entity rows.
//!
//! Artifacts are loosely keyed by filename; we recover the entity key
//! from the path where possible and fall back to a display-name match.
//! Best-effort only: every miss is surfaced as an orphan, never hidden.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::builder::TableBuild;

/// Canonical UUID anywhere in a string; the rightmost occurrence wins.
static UUID_ANYWHERE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

/// Compact 32-hex UUID at the end of a name.
static COMPACT_UUID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)([0-9a-f]{32})$").unwrap());

/// One free-text file belonging to a table's entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
}

/// How an artifact was matched to its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// A key extracted from the path was present in the table.
    Key,
    /// The file stem equalled a row's label, case-insensitively.
    Label,
}

/// A successful artifact-to-row match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    pub path: PathBuf,
    pub row_key: String,
    pub matched_by: MatchKind,
}

/// Association output for one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssociationSet {
    pub associations: Vec<Association>,
    /// Artifacts matching no row by key or label.
    pub orphans: Vec<PathBuf>,
    /// Keys of rows no artifact matched.
    pub rows_without_artifact: Vec<String>,
}

/// Extract an entity key from an artifact path.
///
/// Probes the file stem for a canonical UUID (rightmost match), then for
/// a trailing compact 32-hex run reformatted with dashes, then repeats
/// both probes on the parent directory name.
pub fn extract_key(path: &Path) -> Option<String> {
    let stem = path.file_stem().map(|s| s.to_string_lossy());
    if let Some(stem) = &stem {
        if let Some(key) = key_from_name(stem) {
            return Some(key);
        }
    }

    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy());
    parent.and_then(|name| key_from_name(&name))
}

fn key_from_name(name: &str) -> Option<String> {
    if let Some(m) = UUID_ANYWHERE_RE.find_iter(name).last() {
        return Some(m.as_str().to_lowercase());
    }

    if let Some(m) = COMPACT_UUID_RE.captures(name).and_then(|c| c.get(1)) {
        let compact = m.as_str().to_lowercase();
        return Some(format!(
            "{}-{}-{}-{}-{}",
            &compact[0..8],
            &compact[8..12],
            &compact[12..16],
            &compact[16..20],
            &compact[20..]
        ));
    }

    None
}

/// Matches a table's artifacts against its normalized rows.
pub struct ArtifactAssociator;

impl ArtifactAssociator {
    pub fn new() -> Self {
        Self
    }

    pub fn associate(&self, artifacts: &[Artifact], build: &TableBuild) -> AssociationSet {
        let keys: HashSet<&str> = build.key_set();

        // Label lookup mirrors relation resolution: lowest key wins on
        // duplicate labels.
        let mut by_label: HashMap<String, &str> = HashMap::new();
        if let Some(label) = &build.schema.label_column {
            for row in &build.rows {
                let Some(text) = row.display_text(label) else {
                    continue;
                };
                let lower = text.trim().to_lowercase();
                if lower.is_empty() {
                    continue;
                }
                by_label
                    .entry(lower)
                    .and_modify(|existing| {
                        if row.key.as_str() < *existing {
                            *existing = row.key.as_str();
                        }
                    })
                    .or_insert(row.key.as_str());
            }
        }

        let mut set = AssociationSet::default();
        let mut matched_rows: HashSet<String> = HashSet::new();

        for artifact in artifacts {
            let extracted = extract_key(&artifact.path);

            if let Some(key) = extracted.as_deref().filter(|k| keys.contains(k)) {
                matched_rows.insert(key.to_string());
                set.associations.push(Association {
                    path: artifact.path.clone(),
                    row_key: key.to_string(),
                    matched_by: MatchKind::Key,
                });
                continue;
            }

            let stem = artifact
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().trim().to_lowercase())
                .unwrap_or_default();
            if let Some(key) = by_label.get(&stem).copied() {
                matched_rows.insert(key.to_string());
                set.associations.push(Association {
                    path: artifact.path.clone(),
                    row_key: key.to_string(),
                    matched_by: MatchKind::Label,
                });
                continue;
            }

            set.orphans.push(artifact.path.clone());
        }

        set.rows_without_artifact = build
            .rows
            .iter()
            .filter(|r| !matched_rows.contains(r.key.as_str()))
            .map(|r| r.key.clone())
            .collect();

        set
    }
}

impl Default for ArtifactAssociator {
    fn default() -> Self {
        Self::new()
    }
}
