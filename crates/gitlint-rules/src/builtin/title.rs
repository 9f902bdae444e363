//! Title rules T1-T8

use gitlint_core::{
    GitCommit, LineRuleTarget, LintContext, Rule, RuleClass, RuleOption, RuleResult,
    RuleViolation,
};

use super::{
    check_hard_tab, check_leading_whitespace, check_max_length, check_trailing_whitespace,
    forbidden_words_in,
};

const TRAILING_PUNCTUATION_MARKS: &str = "?:!.,;";

/// T1: title must not exceed a maximum length
pub fn title_max_length() -> RuleClass {
    RuleClass::line(
        "T1",
        "title-max-length",
        LineRuleTarget::CommitMessageTitle,
        validate_max_length,
    )
    .with_options(vec![RuleOption::int("line-length", 72, "Max line length")])
}

fn validate_max_length(rule: &Rule, title: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    Ok(check_max_length(rule, title, "Title"))
}

/// T2: title must not have trailing whitespace
pub fn title_trailing_whitespace() -> RuleClass {
    RuleClass::line(
        "T2",
        "title-trailing-whitespace",
        LineRuleTarget::CommitMessageTitle,
        validate_trailing_whitespace,
    )
}

fn validate_trailing_whitespace(
    rule: &Rule,
    title: &str,
    _commit: &GitCommit,
    _ctx: &LintContext,
) -> RuleResult {
    Ok(check_trailing_whitespace(rule, title, "Title has trailing whitespace"))
}

/// T3: title must not end with punctuation
pub fn title_trailing_punctuation() -> RuleClass {
    RuleClass::line(
        "T3",
        "title-trailing-punctuation",
        LineRuleTarget::CommitMessageTitle,
        validate_trailing_punctuation,
    )
}

fn validate_trailing_punctuation(
    rule: &Rule,
    title: &str,
    _commit: &GitCommit,
    _ctx: &LintContext,
) -> RuleResult {
    for mark in TRAILING_PUNCTUATION_MARKS.chars() {
        if title.ends_with(mark) {
            return Ok(vec![RuleViolation::new(
                &rule.id,
                format!("Title has trailing punctuation ({mark})"),
                Some(title.to_string()),
            )]);
        }
    }
    Ok(Vec::new())
}

/// T4: title must not contain hard tabs
pub fn title_hard_tab() -> RuleClass {
    RuleClass::line(
        "T4",
        "title-hard-tab",
        LineRuleTarget::CommitMessageTitle,
        validate_hard_tab,
    )
}

fn validate_hard_tab(rule: &Rule, title: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    Ok(check_hard_tab(rule, title, "Title contains hard tab characters (\\t)"))
}

/// T5: title must not contain certain words (whole-word, case-insensitive)
pub fn title_must_not_contain_word() -> RuleClass {
    RuleClass::line(
        "T5",
        "title-must-not-contain-word",
        LineRuleTarget::CommitMessageTitle,
        validate_must_not_contain_word,
    )
    .with_options(vec![RuleOption::list("words", &["WIP"], "Must not contain word")])
}

fn validate_must_not_contain_word(
    rule: &Rule,
    title: &str,
    _commit: &GitCommit,
    _ctx: &LintContext,
) -> RuleResult {
    Ok(forbidden_words_in(rule, title)
        .into_iter()
        .map(|word| {
            RuleViolation::new(
                &rule.id,
                format!("Title contains the word '{word}' (case-insensitive)"),
                Some(title.to_string()),
            )
        })
        .collect())
}

/// T6: title must not have leading whitespace
pub fn title_leading_whitespace() -> RuleClass {
    RuleClass::line(
        "T6",
        "title-leading-whitespace",
        LineRuleTarget::CommitMessageTitle,
        validate_leading_whitespace,
    )
}

fn validate_leading_whitespace(
    rule: &Rule,
    title: &str,
    _commit: &GitCommit,
    _ctx: &LintContext,
) -> RuleResult {
    Ok(check_leading_whitespace(rule, title, "Title has leading whitespace"))
}

/// T7: title must match a configured regex (pass-through when unset)
pub fn title_match_regex() -> RuleClass {
    RuleClass::line(
        "T7",
        "title-match-regex",
        LineRuleTarget::CommitMessageTitle,
        validate_match_regex,
    )
    .with_options(vec![RuleOption::regex("regex", None, "Regex the title should match")])
}

fn validate_match_regex(rule: &Rule, title: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(Vec::new());
    };
    if !regex.is_match(title) {
        return Ok(vec![RuleViolation::new(
            &rule.id,
            format!("Title does not match regex ({})", regex.as_str()),
            Some(title.to_string()),
        )]);
    }
    Ok(Vec::new())
}

/// T8: title must reach a minimum length
pub fn title_min_length() -> RuleClass {
    RuleClass::line(
        "T8",
        "title-min-length",
        LineRuleTarget::CommitMessageTitle,
        validate_min_length,
    )
    .with_options(vec![RuleOption::int("min-length", 5, "Minimum required title length")])
}

fn validate_min_length(rule: &Rule, title: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let min_length = rule.int_option("min-length").unwrap_or(5);
    let actual = title.chars().count() as i64;
    if actual < min_length {
        return Ok(vec![RuleViolation::new(
            &rule.id,
            format!("Title is too short ({actual}<{min_length})"),
            Some(title.to_string()),
        )]);
    }
    Ok(Vec::new())
}
