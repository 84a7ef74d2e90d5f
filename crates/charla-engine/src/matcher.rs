// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted substring matcher.
//!
//! One scoring primitive, two call sites: picking the tenant for a
//! multi-tenant messaging account, and detecting the product a message is
//! about within a tenant's catalog.
//!
//! Scores are raw, not normalized across candidate sets of different sizes;
//! a larger keyword set or catalog accumulates more partial matches.

use charla_core::types::{Product, TenantConfig};

/// Weight of one trigger-keyword substring hit.
const KEYWORD_WEIGHT: i32 = 10;
/// Weight of a candidate-name substring hit.
const NAME_WEIGHT: i32 = 8;
/// Weight of a category substring hit.
const CATEGORY_WEIGHT: i32 = 5;
/// Weight of one tag substring hit.
const TAG_WEIGHT: i32 = 3;

/// A candidate the matcher can score against a message.
pub trait Matchable {
    fn trigger_keywords(&self) -> &[String];
    fn name(&self) -> Option<&str> {
        None
    }
    fn category(&self) -> Option<&str> {
        None
    }
    fn tags(&self) -> &[String] {
        &[]
    }
}

impl Matchable for TenantConfig {
    fn trigger_keywords(&self) -> &[String] {
        &self.trigger_keywords
    }
}

impl Matchable for Product {
    fn trigger_keywords(&self) -> &[String] {
        &[]
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Scores one candidate against a message.
///
/// `10×keyword hits + 8×name hit + 5×category hit + 3×tag hits`, all
/// case-insensitive substring containment. Empty keywords/tags never hit.
pub fn score<M: Matchable>(candidate: &M, message: &str) -> i32 {
    let message = message.to_lowercase();
    let mut total = 0;

    for keyword in candidate.trigger_keywords() {
        if hits(&message, keyword) {
            total += KEYWORD_WEIGHT;
        }
    }
    if candidate.name().is_some_and(|name| hits(&message, name)) {
        total += NAME_WEIGHT;
    }
    if candidate
        .category()
        .is_some_and(|category| hits(&message, category))
    {
        total += CATEGORY_WEIGHT;
    }
    for tag in candidate.tags() {
        if hits(&message, tag) {
            total += TAG_WEIGHT;
        }
    }
    total
}

fn hits(message: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    !needle.is_empty() && message.contains(&needle)
}

/// Picks the highest-scoring candidate.
///
/// Ties go to the earlier candidate (creation order); an all-zero field
/// means no match at all.
pub fn best_match<'a, M: Matchable>(candidates: &'a [M], message: &str) -> Option<(&'a M, i32)> {
    let mut best: Option<(&'a M, i32)> = None;
    for candidate in candidates {
        let s = score(candidate, message);
        if s > 0 && best.map(|(_, b)| s > b).unwrap_or(true) {
            best = Some((candidate, s));
        }
    }
    best
}
