//! PV list cleanup ahead of grouping.

use regex::Regex;
use tracing::debug;

use crate::error::BuildError;
use crate::macros::{sub_macros, MacroTable};
use crate::pattern::{self, Substitution};

/// Normalize raw PV list lines.
///
/// Steps run in a fixed order: trim, optional regex substitution, macro
/// folding, then ignore filtering. Ignore patterns therefore see names with
/// macro tokens already in place.
pub fn preprocess<S: AsRef<str>>(
    raw_lines: &[S],
    substitute: Option<&Substitution>,
    macros: &MacroTable,
    ignore: &[Regex],
) -> Vec<String> {
    let mut pvs = raw_lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .map(|pv| match substitute {
            Some(substitution) => substitution.apply(pv).into_owned(),
            None => pv.to_string(),
        })
        .map(|pv| sub_macros(&pv, macros))
        .collect::<Vec<_>>();

    for pattern in ignore {
        let before = pvs.len();
        pvs.retain(|pv| !pattern.is_match(pv));
        let dropped = before - pvs.len();
        if dropped > 0 {
            debug!(pattern = pattern.as_str(), dropped, "ignored PVs");
        }
    }
    pvs
}

/// Compile a list of ignore patterns.
pub fn compile_ignore<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, BuildError> {
    patterns
        .iter()
        .map(|pattern| pattern::compile(pattern.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::parse_macro_string;

    #[test]
    fn ignore_pattern_drops_matches_anywhere() {
        let lines = [
            "  ANC300:AX1:PV_IN ",
            "ANC300:AX2:PV_IN",
            "ANC300:AX2:PV_OUT",
            "XAX2Y",
            "ANC300:AX3:PV_IN",
        ];
        let ignore = compile_ignore(&["AX2"]).expect("ignore");
        let pvs = preprocess(&lines, None, &MacroTable::new(), &ignore);
        assert_eq!(pvs, vec!["ANC300:AX1:PV_IN", "ANC300:AX3:PV_IN"]);
    }

    #[test]
    fn substitution_runs_before_macros() {
        let lines = ["ANC300:AX1:PV_IN", "ANC300:AX1:PV_OUT", ""];
        let substitute = Substitution::new("(AX1:)", "AX$(AX):").expect("substitute");
        let macros = parse_macro_string("DEV=ANC300:,AX=1").expect("macros");
        let pvs = preprocess(&lines, Some(&substitute), &macros, &[]);
        assert_eq!(pvs, vec!["$(DEV)AX$(AX):PV_IN", "$(DEV)AX$(AX):PV_OUT"]);
    }

    #[test]
    fn ignore_sees_macro_tokens() {
        let lines = ["DEV:AX1:A", "DEV:AX2:A"];
        let macros = parse_macro_string("AX=1").expect("macros");
        let ignore = compile_ignore(&[r"AX\$\(AX\)"]).expect("ignore");
        let pvs = preprocess(&lines, None, &macros, &ignore);
        assert_eq!(pvs, vec!["DEV:AX2:A"]);
    }

    #[test]
    fn duplicate_entries_are_all_removed() {
        let lines = ["A:X", "B:Y", "A:X"];
        let ignore = compile_ignore(&["^A:", "^A:X$"]).expect("ignore");
        let pvs = preprocess(&lines, None, &MacroTable::new(), &ignore);
        assert_eq!(pvs, vec!["B:Y"]);
    }
}
