//! Provider preference ordering.
//!
//! Eligible providers come first, best score first, ties broken by
//! identifier ascending. Ineligible providers follow in their input order.

use std::cmp::Ordering;

use crate::health::ProviderId;

/// One provider as seen by the selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: ProviderId,
    pub score: f64,
    pub eligible: bool,
}

/// Order candidates by preference. Duplicate ids keep their first position.
pub fn rank(candidates: Vec<Candidate>) -> Vec<ProviderId> {
    let mut seen = std::collections::HashSet::new();
    let (mut eligible, ineligible): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .partition(|c| c.eligible);

    eligible.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    eligible
        .into_iter()
        .chain(ineligible)
        .map(|c| c.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: &str, score: f64, eligible: bool) -> Candidate {
        Candidate {
            id: id.into(),
            score,
            eligible,
        }
    }

    fn ids(order: &[ProviderId]) -> Vec<&str> {
        order.iter().map(ProviderId::as_str).collect()
    }

    #[test]
    fn test_ineligible_ranked_last_despite_score() {
        let order = rank(vec![c("a", 0.8, true), c("b", 0.9, false)]);
        assert_eq!(ids(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_ties_break_by_identifier() {
        let order = rank(vec![
            c("zeta", 0.5, true),
            c("alpha", 0.5, true),
            c("mid", 0.7, true),
        ]);
        assert_eq!(ids(&order), vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_ineligible_keep_input_order() {
        let order = rank(vec![
            c("z-closed", 0.1, true),
            c("y-open", 0.9, false),
            c("a-open", 0.95, false),
            c("m-open", 0.2, false),
        ]);
        assert_eq!(ids(&order), vec!["z-closed", "y-open", "a-open", "m-open"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let order = rank(vec![c("a", 0.2, true), c("b", 0.4, true), c("a", 0.9, true)]);
        assert_eq!(ids(&order), vec!["b", "a"]);
    }

    #[test]
    fn test_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
