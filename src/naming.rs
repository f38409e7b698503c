// naming.rs - Names for mutable fixture tables
//
// The naming convention is the registry: a sweep decides what to drop only by
// looking at table names in the catalog. Generation and classification share
// the prefix and suffix rules below, so every generated name classifies as
// mutable and names outside the pattern never do.
//
// Generated names look like `{prefix}{base}_{suffix}`:
//   fixture_mut_orders_k3x9q0ab

use std::sync::{Arc, Mutex};

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{FixtureError, Result};
use crate::fixtures::TableDefinition;

pub const MUTABLE_TABLE_PREFIX: &str = "fixture_mut_";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 8;

// PostgreSQL truncates identifiers longer than this.
const MAX_IDENTIFIER_LEN: usize = 63;

const FALLBACK_BASE: &str = "table";

#[derive(Debug, Clone)]
pub struct TableNameGenerator {
    prefix: String,
    rng: Arc<Mutex<StdRng>>,
}

impl TableNameGenerator {
    pub fn new() -> Self {
        Self {
            prefix: MUTABLE_TABLE_PREFIX.to_string(),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// A generator whose suffixes are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self {
            prefix: MUTABLE_TABLE_PREFIX.to_string(),
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Replaces the prefix. It must start with a lowercase letter, use only
    /// `[a-z0-9_]` and end with `_`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        self.prefix = prefix;
        Ok(self)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn generate_mutable_name(&self, definition: &TableDefinition) -> String {
        self.mutable_name_for(definition.name())
    }

    pub fn mutable_name_for(&self, base: &str) -> String {
        let budget = MAX_IDENTIFIER_LEN.saturating_sub(self.prefix.len() + 1 + SUFFIX_LEN);
        let mut base = sanitize(base);
        base.truncate(budget.max(1));
        if base.is_empty() {
            base = FALLBACK_BASE.to_string();
            base.truncate(budget.max(1));
        }
        format!("{}{}_{}", self.prefix, base, self.next_suffix())
    }

    /// True only for names this generator's convention produces.
    ///
    /// Matching ignores ASCII case: some databases report unquoted
    /// identifiers in upper case.
    pub fn is_mutable_table_name(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let Some(rest) = name.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        let Some((base, suffix)) = rest.rsplit_once('_') else {
            return false;
        };
        !base.is_empty()
            && base.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
            && suffix.len() == SUFFIX_LEN
            && suffix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    }

    fn next_suffix(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect()
    }
}

impl Default for TableNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize(base: &str) -> String {
    base.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn validate_prefix(prefix: &str) -> Result<()> {
    let valid = prefix.len() > 1
        && prefix.starts_with(|c: char| c.is_ascii_lowercase())
        && prefix.ends_with('_')
        && prefix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        && prefix.len() + 2 + SUFFIX_LEN <= MAX_IDENTIFIER_LEN;
    if valid {
        Ok(())
    } else {
        Err(FixtureError::Configuration(format!(
            "invalid mutable table prefix '{prefix}': expected [a-z][a-z0-9_]*_"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_name_has_prefix_base_and_suffix() {
        let generator = TableNameGenerator::seeded(7);
        let name = generator.mutable_name_for("Orders");
        assert!(name.starts_with("fixture_mut_orders_"), "{name}");
        assert_eq!(name.len(), "fixture_mut_orders_".len() + SUFFIX_LEN);
        assert!(generator.is_mutable_table_name(&name));
    }

    #[test]
    fn seeded_generators_repeat() {
        let a = TableNameGenerator::seeded(42);
        let b = TableNameGenerator::seeded(42);
        assert_eq!(a.mutable_name_for("t"), b.mutable_name_for("t"));
    }

    #[test]
    fn clones_share_the_suffix_stream() {
        let a = TableNameGenerator::seeded(42);
        let b = a.clone();
        assert_ne!(a.mutable_name_for("t"), b.mutable_name_for("t"));
    }

    #[test]
    fn odd_bases_are_sanitized() {
        let generator = TableNameGenerator::new();
        let name = generator.mutable_name_for("tpch.line-item");
        assert!(name.starts_with("fixture_mut_tpch_line_item_"), "{name}");
        assert!(generator.is_mutable_table_name(&name));

        let name = generator.mutable_name_for("");
        assert!(name.starts_with("fixture_mut_table_"), "{name}");
        assert!(generator.is_mutable_table_name(&name));
    }

    #[test]
    fn long_bases_fit_identifier_limit() {
        let generator = TableNameGenerator::new();
        let name = generator.mutable_name_for(&"x".repeat(200));
        assert!(name.len() <= MAX_IDENTIFIER_LEN);
        assert!(generator.is_mutable_table_name(&name));
    }

    #[test]
    fn classification_rejects_near_misses() {
        let generator = TableNameGenerator::new();
        assert!(!generator.is_mutable_table_name(""));
        assert!(!generator.is_mutable_table_name("orders"));
        assert!(!generator.is_mutable_table_name("fixture_mut_"));
        assert!(!generator.is_mutable_table_name("fixture_mut_orders"));
        assert!(!generator.is_mutable_table_name("fixture_mut__abcdefgh"));
        assert!(!generator.is_mutable_table_name("fixture_mut_orders_abc"));
        assert!(!generator.is_mutable_table_name("fixture_mut_orders_abcdefghi"));
        assert!(!generator.is_mutable_table_name("fixture_mut_orders_abcd-fgh"));
        assert!(!generator.is_mutable_table_name("my_fixture_mut_orders_abcdefgh"));
        assert!(generator.is_mutable_table_name("FIXTURE_MUT_ORDERS_ABCDEFGH"));
    }

    #[test]
    fn custom_prefix() {
        let generator = TableNameGenerator::seeded(1).with_prefix("mut_").unwrap();
        let name = generator.mutable_name_for("abc");
        assert!(name.starts_with("mut_abc_"));
        assert!(generator.is_mutable_table_name(&name));
        assert!(!TableNameGenerator::new().is_mutable_table_name(&name));
    }

    #[test]
    fn invalid_prefixes_are_rejected() {
        for prefix in ["", "_", "mut", "1mut_", "Mut_", "mut-x_"] {
            assert!(TableNameGenerator::new().with_prefix(prefix).is_err(), "{prefix}");
        }
    }
}
