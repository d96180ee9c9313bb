//! Readback/setpoint pairing by regex transform.

use serde::Serialize;
use tracing::info;

use crate::pattern::Substitution;

/// Result of pairing a PV list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grouping {
    /// PVs left without a partner, in input order.
    pub singles: Vec<String>,
    /// `(a, b)` pairs where `b` is the transform of `a`.
    pub pairs: Vec<(String, String)>,
}

/// Pair PVs whose transformed name is also in the list.
///
/// Pairing is greedy in input order: the first PV whose transform is
/// present claims its partner, and a consumed PV is never reconsidered.
#[must_use]
pub fn group(pvs: &[String], pattern: Option<&Substitution>) -> Grouping {
    let mut singles = pvs.to_vec();
    let mut pairs = Vec::new();

    if let Some(pattern) = pattern {
        for first in pvs {
            let Some(first_index) = singles.iter().position(|pv| pv == first) else {
                continue;
            };
            let second = pattern.apply(first);
            if second.as_ref() == first.as_str() {
                continue;
            }
            let Some(second_index) = singles.iter().position(|pv| pv == second.as_ref()) else {
                continue;
            };
            let (high, low) = if first_index > second_index {
                (first_index, second_index)
            } else {
                (second_index, first_index)
            };
            singles.remove(high);
            singles.remove(low);
            pairs.push((first.clone(), second.into_owned()));
        }
    }

    info!("unclassified {}", singles.join("\n\t"));
    info!(
        "groups {}",
        pairs
            .iter()
            .map(|(a, b)| format!("({a}, {b})"))
            .collect::<Vec<_>>()
            .join("\n\t")
    );
    Grouping { singles, pairs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    fn in_out() -> Substitution {
        Substitution::new(r"(.*)_IN$", r"\1_OUT").expect("pattern")
    }

    #[test]
    fn pairs_in_and_out() {
        let grouping = group(
            &names(&["A:PV_IN", "B:SINGLE", "A:PV_OUT", "C:PV_IN"]),
            Some(&in_out()),
        );
        assert_eq!(
            grouping.pairs,
            vec![("A:PV_IN".to_string(), "A:PV_OUT".to_string())]
        );
        assert_eq!(grouping.singles, names(&["B:SINGLE", "C:PV_IN"]));
    }

    #[test]
    fn regrouping_singles_finds_nothing_new() {
        let pattern = in_out();
        let first = group(
            &names(&["X_IN", "X_OUT", "Y_IN", "Z_OUT", "W"]),
            Some(&pattern),
        );
        let second = group(&first.singles, Some(&pattern));
        assert!(second.pairs.is_empty());
        assert_eq!(second.singles, first.singles);
    }

    #[test]
    fn first_match_wins_and_consumed_pvs_are_skipped() {
        let grow = Substitution::new("^(.*)X$", r"\1XX").expect("pattern");
        let grouping = group(&names(&["AX", "AXX", "AXXX"]), Some(&grow));
        assert_eq!(grouping.pairs, vec![("AX".to_string(), "AXX".to_string())]);
        assert_eq!(grouping.singles, names(&["AXXX"]));

        let grouping = group(&names(&["AXX", "AX", "AXXX"]), Some(&grow));
        assert_eq!(
            grouping.pairs,
            vec![("AXX".to_string(), "AXXX".to_string())]
        );
        assert_eq!(grouping.singles, names(&["AX"]));
    }

    #[test]
    fn without_pattern_everything_is_single() {
        let grouping = group(&names(&["A_IN", "A_OUT"]), None);
        assert!(grouping.pairs.is_empty());
        assert_eq!(grouping.singles, names(&["A_IN", "A_OUT"]));
    }
}
