//! Relation resolution: display names to foreign-key pairs.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::detect::Relation;
use crate::migrate::TableConversion;

/// Why a reference could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedKind {
    /// The source row's key is not in its table's valid set.
    SourceKeyInvalid,
    /// The matched target row's key is not in its table's valid set.
    TargetKeyInvalid,
    /// No target row's label matches the display name.
    DisplayNameNotFound,
}

/// One reference that produced no link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub kind: UnresolvedKind,
    /// The display name or key that failed.
    pub value: String,
}

/// A resolved foreign-key pair. Both endpoints are guaranteed members of
/// their tables' post-substitution key sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source_table: String,
    pub source_key: String,
    pub target_table: String,
    pub target_key: String,
}

/// A relation together with every link resolved for it. Relations with
/// zero links are retained so callers can tell "detected but empty"
/// from "not detected".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRelation {
    pub relation: Relation,
    pub links: Vec<Link>,
}

/// Per-table lookup state for resolution.
struct TableIndex<'a> {
    keys: HashSet<&'a str>,
    /// Lowercased label text to the chosen row key. When several rows
    /// share a label the lexicographically smallest key wins, so
    /// resolution does not depend on row order.
    by_label: HashMap<String, &'a str>,
}

impl<'a> TableIndex<'a> {
    fn build(conversion: &'a TableConversion) -> Self {
        let keys = conversion.build.key_set();

        let mut by_label: HashMap<String, &'a str> = HashMap::new();
        if let Some(label) = &conversion.build.schema.label_column {
            for row in &conversion.build.rows {
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

        Self { keys, by_label }
    }
}

/// Resolves detected relations into deduplicated link sets.
pub struct RelationResolver;

impl RelationResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every relation against the complete table state.
    ///
    /// Must only run after phase 1 finished for all tables: a single
    /// relation needs the post-substitution key sets of two tables.
    pub fn resolve(
        &self,
        relations: Vec<Relation>,
        tables: &[TableConversion],
    ) -> (Vec<ResolvedRelation>, Vec<UnresolvedReference>) {
        let by_name: HashMap<&str, &TableConversion> = tables
            .iter()
            .map(|t| (t.build.schema.name.as_str(), t))
            .collect();
        let mut indexes: HashMap<&str, TableIndex<'_>> = HashMap::new();

        let mut resolved = Vec::with_capacity(relations.len());
        let mut unresolved = Vec::new();

        for relation in relations {
            let links = match relation.target_table.as_deref() {
                Some(target) => self.resolve_one(
                    &relation,
                    target,
                    &by_name,
                    &mut indexes,
                    &mut unresolved,
                ),
                // No guessed target: the column stays opaque text.
                None => Vec::new(),
            };
            resolved.push(ResolvedRelation { relation, links });
        }

        (resolved, unresolved)
    }

    fn resolve_one<'a>(
        &self,
        relation: &Relation,
        target: &str,
        by_name: &HashMap<&str, &'a TableConversion>,
        indexes: &mut HashMap<&'a str, TableIndex<'a>>,
        unresolved: &mut Vec<UnresolvedReference>,
    ) -> Vec<Link> {
        let (Some(source_conv), Some(target_conv)) = (
            by_name.get(relation.source_table.as_str()).copied(),
            by_name.get(target).copied(),
        ) else {
            return Vec::new();
        };

        for conv in [source_conv, target_conv] {
            indexes
                .entry(conv.build.schema.name.as_str())
                .or_insert_with(|| TableIndex::build(conv));
        }

        let source_column = &relation.source_column;
        let cell_index = source_conv
            .build
            .schema
            .get_column(source_column)
            .and_then(|c| c.source_index);
        let Some(cell_index) = cell_index else {
            return Vec::new();
        };

        let mut links = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (row, cells) in source_conv.build.rows.iter().zip(&source_conv.raw.rows) {
            let raw_value = cells.get(cell_index).map(|s| s.as_str()).unwrap_or("");
            if raw_value.trim().is_empty() {
                continue;
            }

            let source_keys = &indexes[relation.source_table.as_str()].keys;
            if !source_keys.contains(row.key.as_str()) {
                unresolved.push(UnresolvedReference {
                    source_table: relation.source_table.clone(),
                    source_column: source_column.clone(),
                    target_table: target.to_string(),
                    kind: UnresolvedKind::SourceKeyInvalid,
                    value: row.key.clone(),
                });
                continue;
            }

            let target_index = &indexes[target];
            for token in raw_value.split(',') {
                let display_name = token.trim();
                if display_name.is_empty() {
                    continue;
                }

                let Some(target_key) = target_index
                    .by_label
                    .get(&display_name.to_lowercase())
                    .copied()
                else {
                    unresolved.push(UnresolvedReference {
                        source_table: relation.source_table.clone(),
                        source_column: source_column.clone(),
                        target_table: target.to_string(),
                        kind: UnresolvedKind::DisplayNameNotFound,
                        value: display_name.to_string(),
                    });
                    continue;
                };

                if !target_index.keys.contains(target_key) {
                    unresolved.push(UnresolvedReference {
                        source_table: relation.source_table.clone(),
                        source_column: source_column.clone(),
                        target_table: target.to_string(),
                        kind: UnresolvedKind::TargetKeyInvalid,
                        value: target_key.to_string(),
                    });
                    continue;
                }

                // Junctions are undirected for storage: dedup on the
                // table-name-sorted id pair.
                let pair = if relation.source_table.as_str() <= target {
                    (row.key.clone(), target_key.to_string())
                } else {
                    (target_key.to_string(), row.key.clone())
                };
                if !seen.insert(pair) {
                    continue;
                }

                links.push(Link {
                    source_table: relation.source_table.clone(),
                    source_key: row.key.clone(),
                    target_table: target.to_string(),
                    target_key: target_key.to_string(),
                });
            }
        }

        links
    }
}

impl Default for RelationResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SchemaBuilder;
    use crate::ident::IdentSet;
    use crate::input::RawTable;
    use crate::relations::RelationDetector;

    const TOLKIEN: &str = "d47ec620-2190-11ef-910c-f1df4955273f";
    const LEWIS: &str = "11111111-2222-4333-8444-555555555555";
    const HOBBIT: &str = "a1b2c3d4-0000-4abc-8000-000000000001";

    fn conversions(specs: Vec<(&str, Vec<&str>, Vec<Vec<&str>>)>) -> Vec<TableConversion> {
        let mut names = IdentSet::new();
        specs
            .into_iter()
            .map(|(name, headers, rows)| {
                let raw = RawTable::new(
                    name,
                    headers.into_iter().map(String::from).collect(),
                    rows.into_iter()
                        .map(|r| r.into_iter().map(String::from).collect())
                        .collect(),
                );
                let build = SchemaBuilder::new().build(&raw, &mut names).unwrap();
                TableConversion::new(raw, build)
            })
            .collect()
    }

    fn resolve(tables: &[TableConversion]) -> (Vec<ResolvedRelation>, Vec<UnresolvedReference>) {
        let relations = RelationDetector::new().detect(tables);
        RelationResolver::new().resolve(relations, tables)
    }

    #[test]
    fn test_two_names_resolve_to_two_links() {
        let tables = conversions(vec![
            (
                "Authors",
                vec!["Id", "Name"],
                vec![
                    vec![TOLKIEN, "J.R.R. Tolkien"],
                    vec![LEWIS, "C.S. Lewis"],
                ],
            ),
            (
                "Books",
                vec!["Id", "Name", "Authors"],
                vec![vec![HOBBIT, "The Hobbit", "J.R.R. Tolkien,C.S. Lewis"]],
            ),
        ]);

        let (resolved, unresolved) = resolve(&tables);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].links.len(), 2);
        assert!(unresolved.is_empty());

        let keys: Vec<&str> = resolved[0]
            .links
            .iter()
            .map(|l| l.target_key.as_str())
            .collect();
        assert!(keys.contains(&TOLKIEN));
        assert!(keys.contains(&LEWIS));
    }

    #[test]
    fn test_unknown_display_name_reported() {
        let narnia = "b2c3d4e5-0000-4abc-8000-000000000002";
        let tables = conversions(vec![
            (
                "Authors",
                vec!["Id", "Name"],
                vec![
                    vec![TOLKIEN, "J.R.R. Tolkien"],
                    vec![LEWIS, "C.S. Lewis"],
                ],
            ),
            (
                "Books",
                vec!["Id", "Name", "Authors"],
                vec![
                    vec![HOBBIT, "The Hobbit", "Unknown Writer"],
                    vec![narnia, "Narnia", "J.R.R. Tolkien,C.S. Lewis"],
                ],
            ),
        ]);

        let (resolved, unresolved) = resolve(&tables);
        assert_eq!(resolved[0].links.len(), 2);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].kind, UnresolvedKind::DisplayNameNotFound);
        assert_eq!(unresolved[0].value, "Unknown Writer");
    }

    #[test]
    fn test_empty_relation_retained() {
        // Detected through the column-name pattern; no row carries data.
        let tables = conversions(vec![
            ("Authors", vec!["Id", "Name"], vec![vec![TOLKIEN, "T"]]),
            (
                "Books",
                vec!["Id", "Name", "Related-Authors"],
                vec![vec![HOBBIT, "The Hobbit", ""]],
            ),
        ]);

        let (resolved, unresolved) = resolve(&tables);
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved[0].relation.target_table.as_deref(),
            Some("authors")
        );
        assert!(resolved[0].links.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_duplicate_references_deduplicated() {
        let tables = conversions(vec![
            (
                "Authors",
                vec!["Id", "Name"],
                vec![vec![TOLKIEN, "J.R.R. Tolkien"]],
            ),
            (
                "Books",
                vec!["Id", "Name", "Authors"],
                vec![vec![
                    HOBBIT,
                    "The Hobbit",
                    "J.R.R. Tolkien, J.R.R. Tolkien,j.r.r. tolkien",
                ]],
            ),
        ]);

        let (resolved, _) = resolve(&tables);
        assert_eq!(resolved[0].links.len(), 1);
    }

    #[test]
    fn test_ambiguous_label_picks_lowest_key() {
        let high = "ffffffff-aaaa-4bbb-8ccc-dddddddddddd";
        let low = "00000000-aaaa-4bbb-8ccc-dddddddddddd";

        for rows in [
            vec![vec![high, "Same Name"], vec![low, "Same Name"]],
            vec![vec![low, "Same Name"], vec![high, "Same Name"]],
        ] {
            let tables = conversions(vec![
                ("Authors", vec!["Id", "Name"], rows),
                (
                    "Books",
                    vec!["Id", "Name", "Authors"],
                    vec![vec![HOBBIT, "The Hobbit", "Same Name"]],
                ),
            ]);

            // Resolve a hand-built relation so the single-valued cell
            // does not depend on detection.
            let relation = Relation {
                source_table: "books".to_string(),
                source_column: "authors".to_string(),
                original_column: "Authors".to_string(),
                target_table: Some("authors".to_string()),
                multi_valued: false,
            };
            let (resolved, _) = RelationResolver::new().resolve(vec![relation], &tables);
            assert_eq!(resolved[0].links.len(), 1);
            assert_eq!(resolved[0].links[0].target_key, low);
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let tables = conversions(vec![
            (
                "Authors",
                vec!["Id", "Name"],
                vec![
                    vec![TOLKIEN, "J.R.R. Tolkien"],
                    vec![LEWIS, "C.S. Lewis"],
                ],
            ),
            (
                "Books",
                vec!["Id", "Name", "Authors"],
                vec![vec![HOBBIT, "The Hobbit", "C.S. Lewis,J.R.R. Tolkien"]],
            ),
        ]);

        let (first, _) = resolve(&tables);
        let (second, _) = resolve(&tables);
        assert_eq!(first[0].links, second[0].links);
    }
}
