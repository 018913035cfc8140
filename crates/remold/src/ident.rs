//! Identifier normalization for relational targets.
//!
//! Arbitrary human-entered names (table folders, CSV headers) become
//! PostgreSQL-safe identifiers: lowercase ASCII alphanumerics and
//! underscores, at most 63 characters, never a reserved keyword.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// PostgreSQL identifier length limit.
pub const MAX_IDENT_LEN: usize = 63;

/// Reserved PostgreSQL keywords. A sanitized name that lands on one of
/// these gets an underscore prefix.
static RESERVED_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
        "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
        "column", "concurrently", "constraint", "create", "cross", "current_catalog",
        "current_date", "current_role", "current_schema", "current_timestamp", "current_user",
        "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
        "fetch", "for", "foreign", "freeze", "from", "full", "grant", "group", "having",
        "ilike", "in", "initially", "inner", "intersect", "into", "is", "isnull", "join",
        "lateral", "leading", "left", "like", "limit", "localtime", "localtimestamp",
        "natural", "not", "notnull", "null", "offset", "on", "only", "or", "order", "outer",
        "overlaps", "placing", "primary", "references", "returning", "right", "select",
        "session_user", "similar", "some", "symmetric", "table", "tablesample", "then",
        "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "verbose",
        "when", "where", "window", "with",
    ]
    .into_iter()
    .collect()
});

/// Normalize a display name into a safe relational identifier.
///
/// Pure and deterministic; does not guarantee uniqueness across calls.
/// Use [`IdentSet::allocate`] when collisions between distinct source
/// names must be disambiguated.
pub fn sanitize_name(name: &str) -> String {
    // Decompose and drop combining marks, so "é" folds to "e".
    let folded: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let mut clean = String::with_capacity(folded.len());
    for ch in folded.chars() {
        let mapped = match ch {
            '\'' | '\u{2019}' | '\u{02BC}' | '`' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            '-' | '.' | '/' => Some('_'),
            '_' => Some('_'),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            _ => None,
        };
        if let Some(c) = mapped {
            // Collapse underscore runs as they are produced.
            if c == '_' && clean.ends_with('_') {
                continue;
            }
            clean.push(c);
        }
    }

    let mut clean = clean.trim_matches('_').to_string();

    if clean.is_empty() {
        clean = "unnamed".to_string();
    }
    if clean.starts_with(|c: char| c.is_ascii_digit()) {
        clean.insert(0, '_');
    }
    if RESERVED_KEYWORDS.contains(clean.as_str()) {
        clean.insert(0, '_');
    }
    if clean.len() > MAX_IDENT_LEN {
        clean.truncate(MAX_IDENT_LEN);
        // Truncation may expose a trailing underscore; trimming it keeps
        // the function idempotent.
        let trimmed_len = clean.trim_end_matches('_').len();
        if trimmed_len == 0 {
            clean = "unnamed".to_string();
        } else {
            clean.truncate(trimmed_len);
        }
    }

    clean
}

/// Collision-aware identifier allocator.
///
/// Wraps [`sanitize_name`] and guarantees that every allocated name is
/// unique within the set by suffixing `_2`, `_3`, … when two distinct
/// source names normalize identically.
#[derive(Debug, Clone, Default)]
pub struct IdentSet {
    used: HashSet<String>,
}

impl IdentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize `name` and reserve a unique identifier for it.
    pub fn allocate(&mut self, name: &str) -> String {
        let base = sanitize_name(name);
        if self.used.insert(base.clone()) {
            return base;
        }

        let mut n = 2usize;
        loop {
            let suffix = format!("_{n}");
            let mut candidate = base.clone();
            candidate.truncate(MAX_IDENT_LEN - suffix.len());
            candidate.push_str(&suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Whether an identifier has already been handed out.
    pub fn contains(&self, ident: &str) -> bool {
        self.used.contains(ident)
    }

    /// Number of identifiers allocated so far.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// True if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cleanup() {
        assert_eq!(sanitize_name("Ma-super colonne"), "ma_super_colonne");
        assert_eq!(sanitize_name("L'important"), "l_important");
        assert_eq!(sanitize_name("a.b/c"), "a_b_c");
    }

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(sanitize_name("Centres d'intérêt"), "centres_d_interet");
        assert_eq!(sanitize_name("Déjà Vu"), "deja_vu");
    }

    #[test]
    fn test_digit_prefix_and_reserved() {
        assert_eq!(sanitize_name("2nd_colonne"), "_2nd_colonne");
        assert_eq!(sanitize_name("order"), "_order");
        assert_eq!(sanitize_name("SELECT"), "_select");
    }

    #[test]
    fn test_empty_becomes_unnamed() {
        assert_eq!(sanitize_name(""), "unnamed");
        assert_eq!(sanitize_name("???"), "unnamed");
        assert_eq!(sanitize_name("---"), "unnamed");
    }

    #[test]
    fn test_idempotent() {
        for name in ["Déjà Vu", "2nd col", "order", "", "a--b__c", &"x".repeat(80)] {
            let once = sanitize_name(name);
            assert_eq!(sanitize_name(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn test_output_shape() {
        let re = regex::Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap();
        for name in ["Ma colonne", "été", "9 lives", "WHERE", "x", &"é".repeat(100)] {
            let out = sanitize_name(name);
            assert!(re.is_match(&out), "bad shape {out:?} for {name:?}");
        }
    }

    #[test]
    fn test_truncates_to_limit() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_name(&long).len(), MAX_IDENT_LEN);
    }

    #[test]
    fn test_allocate_disambiguates_collisions() {
        let mut set = IdentSet::new();
        assert_eq!(set.allocate("Statut"), "statut");
        assert_eq!(set.allocate("statut"), "statut_2");
        assert_eq!(set.allocate("Statût"), "statut_3");
    }

    #[test]
    fn test_allocate_suffix_respects_length_limit() {
        let mut set = IdentSet::new();
        let long = "b".repeat(100);
        let first = set.allocate(&long);
        let second = set.allocate(&long);
        assert_ne!(first, second);
        assert!(second.len() <= MAX_IDENT_LEN);
        assert!(second.ends_with("_2"));
    }
}
