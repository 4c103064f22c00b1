//! Resource name generation and validation
//!
//! Every resource created by a run gets a fixed prefix plus a random numeric
//! suffix. Azure storage account names are the most restrictive, so they are
//! validated separately.

use crate::error::{ProvisionError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Exclusive upper bound of the random suffix
pub const SUFFIX_UPPER_BOUND: u32 = 9999;

const STORAGE_ACCOUNT_MAX_LENGTH: usize = 24;
const STORAGE_ACCOUNT_MIN_LENGTH: usize = 3;
const CONTAINER_MIN_LENGTH: usize = 3;
const CONTAINER_MAX_LENGTH: usize = 63;
const WEB_APP_MAX_LENGTH: usize = 60;
const RESOURCE_GROUP_MAX_LENGTH: usize = 90;

/// Generates names that are unique for the lifetime of the generator
pub struct NameGenerator {
    rng: StdRng,
    issued: HashSet<String>,
    per_prefix: HashMap<String, usize>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            issued: HashSet::new(),
            per_prefix: HashMap::new(),
        }
    }

    /// Deterministic generator for tests and reproducible dry runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
            per_prefix: HashMap::new(),
        }
    }

    /// Produce `prefix` followed by a suffix in `[0, 9999)` not issued before
    pub fn next_name(&mut self, prefix: &str) -> Result<String> {
        let taken = self.per_prefix.get(prefix).copied().unwrap_or(0);
        if taken >= SUFFIX_UPPER_BOUND as usize {
            return Err(ProvisionError::invalid_argument(format!(
                "All suffixes for prefix '{}' are exhausted",
                prefix
            )));
        }

        loop {
            let suffix = self.rng.gen_range(0..SUFFIX_UPPER_BOUND);
            let name = format!("{}{}", prefix, suffix);
            if self.issued.insert(name.clone()) {
                *self.per_prefix.entry(prefix.to_string()).or_insert(0) += 1;
                return Ok(name);
            }
        }
    }

    pub fn issued(&self) -> &HashSet<String> {
        &self.issued
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a name is a valid Azure storage account name
pub fn is_valid_storage_account_name(name: &str) -> bool {
    if name.len() < STORAGE_ACCOUNT_MIN_LENGTH || name.len() > STORAGE_ACCOUNT_MAX_LENGTH {
        return false;
    }

    Regex::new(r"^[a-z0-9]+$")
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// Validate a storage account prefix, leaving room for the widest suffix
pub fn validate_storage_account_prefix(prefix: &str) -> Result<()> {
    let widest = format!("{}{}", prefix, SUFFIX_UPPER_BOUND - 1);
    if prefix.is_empty() || !is_valid_storage_account_name(&widest) {
        return Err(ProvisionError::config(format!(
            "Storage account prefix '{}' must be lowercase letters and digits, at most {} characters",
            prefix,
            STORAGE_ACCOUNT_MAX_LENGTH - 4
        )));
    }
    Ok(())
}

/// Check a prefix against `pattern` for both the shortest and the widest
/// name it can produce
fn check_prefix(
    kind: &str,
    prefix: &str,
    pattern: &str,
    min_length: usize,
    max_length: usize,
    rule: &str,
) -> Result<()> {
    let shortest = format!("{}0", prefix);
    let widest = format!("{}{}", prefix, SUFFIX_UPPER_BOUND - 1);
    let matches = Regex::new(pattern)?.is_match(&widest);

    if prefix.is_empty() || !matches || shortest.len() < min_length || widest.len() > max_length {
        return Err(ProvisionError::config(format!(
            "{} prefix '{}' must be {}, {} to {} characters including the 4-digit suffix",
            kind, prefix, rule, min_length, max_length
        )));
    }
    Ok(())
}

/// Blob container names: lowercase letters, digits and single hyphens,
/// starting with a letter or digit
pub fn validate_container_prefix(prefix: &str) -> Result<()> {
    check_prefix(
        "Container",
        prefix,
        r"^[a-z0-9](-?[a-z0-9])*$",
        CONTAINER_MIN_LENGTH,
        CONTAINER_MAX_LENGTH,
        "lowercase letters, digits and single hyphens",
    )
}

/// Web app and App Service plan names: letters, digits and hyphens, starting
/// with a letter or digit
pub fn validate_web_app_prefix(prefix: &str) -> Result<()> {
    check_prefix(
        "Web app",
        prefix,
        r"^[A-Za-z0-9][A-Za-z0-9-]*$",
        2,
        WEB_APP_MAX_LENGTH,
        "letters, digits and hyphens",
    )
}

pub fn validate_resource_group_prefix(prefix: &str) -> Result<()> {
    check_prefix(
        "Resource group",
        prefix,
        r"^[A-Za-z0-9_().-]+$",
        1,
        RESOURCE_GROUP_MAX_LENGTH,
        "letters, digits, underscores, periods, parentheses and hyphens",
    )
}
