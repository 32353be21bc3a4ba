//! Domain Services
//!
//! Pure domain logic: geo rule evaluation and promotion selection.

use rand::seq::SliceRandom;

use crate::domain::entities::{GeoFilter, Promotion};
use crate::domain::value_objects::{CountryCode, FilterType};

/// Evaluate ordered geo rules for a country.
///
/// An INCLUDE rule that does not list the country rejects; an EXCLUDE rule
/// that lists it rejects. A matching INCLUDE does not accept on its own, later
/// rules still run. No rejection means eligible.
pub fn is_eligible(rules: &[GeoFilter], country: &CountryCode) -> bool {
    for rule in rules {
        match rule.filter_type {
            FilterType::Include => {
                if !rule.contains(country) {
                    return false;
                }
            }
            FilterType::Exclude => {
                if rule.contains(country) {
                    return false;
                }
            }
        }
    }
    true
}

// ============================================================================
// Candidate ordering
// ============================================================================

/// Arranges live candidates before selection
pub trait CandidateOrder: Send + Sync {
    fn arrange(&self, candidates: &mut [Promotion]);
}

/// Uniform shuffle, used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrder;

impl CandidateOrder for RandomOrder {
    fn arrange(&self, candidates: &mut [Promotion]) {
        candidates.shuffle(&mut rand::rng());
    }
}

/// Keeps repository order
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredOrder;

impl CandidateOrder for StoredOrder {
    fn arrange(&self, _candidates: &mut [Promotion]) {}
}

// ============================================================================
// Selection policy
// ============================================================================

/// Facts about the request that drive selection
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    /// Global kill switch
    pub use_promos: bool,
    /// Consuming project opted in
    pub allow_promos: bool,
    pub gold_user: bool,
    pub gold_project: bool,
    pub country: Option<CountryCode>,
}

impl SelectionContext {
    /// Ordinary promotions are suppressed for gold users and gold projects
    pub fn show_promo(&self) -> bool {
        self.allow_promos && !(self.gold_user || self.gold_project)
    }
}

/// Promotions available to the policy
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// Live promotions for the display surface, already arranged
    pub ordinary: Vec<Promotion>,
    pub gold_user: Option<Promotion>,
    pub gold_project: Option<Promotion>,
}

/// Pick the promotion to serve, if any.
///
/// Ordinary candidates are scanned in the given order and the last one that
/// passes the geo rules wins. Without a country no ordinary candidate is
/// chosen. The gold-user and then gold-project thank-you promotions replace
/// whatever was picked when the matching fact holds.
pub fn select_promotion(candidates: Candidates, ctx: &SelectionContext) -> Option<Promotion> {
    if !ctx.use_promos {
        return None;
    }

    let mut selected = None;

    if ctx.show_promo() {
        if let Some(country) = &ctx.country {
            for promo in candidates.ordinary {
                if promo.live && promo.is_shown_in(country) {
                    selected = Some(promo);
                }
            }
        }
    }

    if ctx.gold_user {
        if let Some(promo) = candidates.gold_user.filter(|p| p.live) {
            selected = Some(promo);
        }
    }

    if ctx.gold_project {
        if let Some(promo) = candidates.gold_project.filter(|p| p.live) {
            selected = Some(promo);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    fn codes(list: &[&str]) -> Vec<CountryCode> {
        list.iter().map(|s| cc(s)).collect()
    }

    #[test]
    fn test_empty_rules_allow() {
        assert!(is_eligible(&[], &cc("US")));
    }

    #[test]
    fn test_include_then_exclude_runs_both() {
        let rules = vec![
            GeoFilter::include(codes(&["US", "CA"])),
            GeoFilter::exclude(codes(&["CA"])),
        ];
        assert!(is_eligible(&rules, &cc("US")));
        assert!(!is_eligible(&rules, &cc("CA")));
        assert!(!is_eligible(&rules, &cc("DE")));
    }

    #[test]
    fn test_show_promo_truth_table() {
        let mut ctx = SelectionContext {
            use_promos: true,
            allow_promos: true,
            ..Default::default()
        };
        assert!(ctx.show_promo());
        ctx.gold_user = true;
        assert!(!ctx.show_promo());
        ctx.gold_user = false;
        ctx.gold_project = true;
        assert!(!ctx.show_promo());
        ctx.gold_project = false;
        ctx.allow_promos = false;
        assert!(!ctx.show_promo());
    }
}
