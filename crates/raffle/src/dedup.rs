//! Multi-key deduplication of redemptions.
//!
//! Each redemption carries up to four identity attributes. Redemptions are
//! walked once in creation order; one that shares any key with an earlier
//! kept redemption is a duplicate. Keys of duplicates are not added to the
//! seen set, so this is a single pass and not a transitive merge.

use crate::types::RewardRedemption;
use serde::Serialize;
use std::collections::HashSet;

/// A normalised identity attribute. Different kinds never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    Profile(String),
    Fingerprint(String),
    Email(String),
    Phone(String),
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Kept redemptions, in creation order.
    pub unique: Vec<RewardRedemption>,
    pub duplicates: usize,
}

/// The present identity keys of a redemption. Blank attributes are absent.
pub fn identity_keys(redemption: &RewardRedemption) -> Vec<IdentityKey> {
    let mut keys = Vec::with_capacity(4);
    if let Some(v) = present(&redemption.profile_id) {
        keys.push(IdentityKey::Profile(v.to_string()));
    }
    if let Some(v) = present(&redemption.fingerprint) {
        keys.push(IdentityKey::Fingerprint(v.to_string()));
    }
    if let Some(v) = present(&redemption.email) {
        keys.push(IdentityKey::Email(v.to_lowercase()));
    }
    if let Some(v) = present(&redemption.phone) {
        let phone: String = v
            .chars()
            .enumerate()
            .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
            .map(|(_, c)| c)
            .collect();
        if !phone.is_empty() {
            keys.push(IdentityKey::Phone(phone));
        }
    }
    keys
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Deduplicate in creation order. Ties keep input order.
pub fn dedup(redemptions: &[RewardRedemption]) -> DedupOutcome {
    let mut ordered: Vec<&RewardRedemption> = redemptions.iter().collect();
    ordered.sort_by_key(|r| r.created_at);

    let mut seen: HashSet<IdentityKey> = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = 0;

    for redemption in ordered {
        let keys = identity_keys(redemption);
        if keys.iter().any(|k| seen.contains(k)) {
            duplicates += 1;
            continue;
        }
        seen.extend(keys);
        unique.push(redemption.clone());
    }

    DedupOutcome { unique, duplicates }
}
