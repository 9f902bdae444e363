//! The default rule set
//!
//! Rule ids follow the built-in namespace: T for title rules, B for body
//! rules, M for meta rules, I for configuration (ignore) rules.

pub mod body;
pub mod configuration;
pub mod meta;
pub mod title;

use gitlint_core::{Rule, RuleViolation};
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s$").expect("static regex"));
static LEADING_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s").expect("static regex"));

/// Shared check behind the title/body max-length rules
pub(crate) fn check_max_length(rule: &Rule, line: &str, label: &str) -> Vec<RuleViolation> {
    let max_length = rule.int_option("line-length").unwrap_or(80);
    let actual = line.chars().count() as i64;
    if actual > max_length {
        let message = format!("{label} exceeds max length ({actual}>{max_length})");
        return vec![RuleViolation::new(&rule.id, message, Some(line.to_string()))];
    }
    Vec::new()
}

pub(crate) fn check_trailing_whitespace(
    rule: &Rule,
    line: &str,
    message: &str,
) -> Vec<RuleViolation> {
    if TRAILING_WHITESPACE.is_match(line) {
        return vec![RuleViolation::new(&rule.id, message, Some(line.to_string()))];
    }
    Vec::new()
}

pub(crate) fn check_leading_whitespace(
    rule: &Rule,
    line: &str,
    message: &str,
) -> Vec<RuleViolation> {
    if LEADING_WHITESPACE.is_match(line) {
        return vec![RuleViolation::new(&rule.id, message, Some(line.to_string()))];
    }
    Vec::new()
}

pub(crate) fn check_hard_tab(rule: &Rule, line: &str, message: &str) -> Vec<RuleViolation> {
    if line.contains('\t') {
        return vec![RuleViolation::new(&rule.id, message, Some(line.to_string()))];
    }
    Vec::new()
}

/// Words from the rule's `words` option that occur in `line` as whole words,
/// case-insensitively. "WIPING" does not match the word "WIP".
pub(crate) fn forbidden_words_in(rule: &Rule, line: &str) -> Vec<String> {
    let lowered = line.to_lowercase();
    rule.list_option("words")
        .unwrap_or(&[])
        .iter()
        .filter(|word| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&word.to_lowercase())))
                .map(|regex| regex.is_match(&lowered))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
