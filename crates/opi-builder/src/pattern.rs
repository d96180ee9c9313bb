//! Regex substitutions written with backslash group references.
//!
//! Pair and substitution patterns are given as `(.*)_IN` / `\1_OUT`, and a
//! replacement may contain macro tokens such as `AX$(AX):`. Both are
//! translated into `regex` replacement syntax here so `$` stays literal.

use std::borrow::Cow;

use regex::Regex;

use crate::error::BuildError;

/// Compile `pattern`, mapping failures into [`BuildError::InvalidPattern`].
pub fn compile(pattern: &str) -> Result<Regex, BuildError> {
    Regex::new(pattern).map_err(|err| BuildError::InvalidPattern {
        pattern: pattern.into(),
        reason: err.to_string().into(),
    })
}

/// Compiled pattern/replacement pair applied with replace-all semantics.
#[derive(Debug, Clone)]
pub struct Substitution {
    regex: Regex,
    replacement: String,
}

impl Substitution {
    /// Compile `pattern` and translate `replacement`.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, BuildError> {
        Ok(Self {
            regex: compile(pattern)?,
            replacement: translate_replacement(replacement),
        })
    }

    /// Source of the compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex.replace_all(text, self.replacement.as_str())
    }
}

/// Convert `\1`, `\g<1>` and `\g<name>` references into `${..}` form and
/// escape literal `$`.
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut chars = replacement.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(digit) if digit.is_ascii_digit() => {
                    let mut group = String::new();
                    while group.len() < 2 {
                        match chars.peek() {
                            Some(next) if next.is_ascii_digit() => {
                                group.push(*next);
                                chars.next();
                            }
                            _ => break,
                        }
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|next| *next != '>').collect();
                        out.push_str(&format!("${{{name}}}"));
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslash_groups_are_translated() {
        let sub = Substitution::new(r"(.*)_IN$", r"\1_OUT").expect("pattern");
        assert_eq!(sub.apply("A:PV_IN"), "A:PV_OUT");
        assert_eq!(sub.apply("A:PV_OUT"), "A:PV_OUT");
        let sub = Substitution::new(r"(?P<base>.*)-I$", r"\g<base>-SP").expect("pattern");
        assert_eq!(sub.apply("Mtr:Pos-I"), "Mtr:Pos-SP");
    }

    #[test]
    fn dollar_in_replacement_is_literal() {
        let sub = Substitution::new("(AX1:)", "AX$(AX):").expect("pattern");
        assert_eq!(sub.apply("ANC300:AX1:PV_IN"), "ANC300:AX$(AX):PV_IN");
    }

    #[test]
    fn group_followed_by_digit_text() {
        let sub = Substitution::new(r"^(\w)(\w)", r"\2\1").expect("pattern");
        assert_eq!(sub.apply("ab9"), "ba9");
        assert_eq!(translate_replacement(r"\1x\\y"), "${1}x\\y");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = compile("(unclosed").expect_err("must fail");
        assert!(matches!(err, BuildError::InvalidPattern { .. }));
    }
}
