//! Built-in and contrib rule classes for gitlint, plus convenience
//! constructors for a fully wired default configuration.
//!
//! Rule registration order is significant: configuration rules run before
//! everything else, and violation output mirrors registration order for
//! rules on the same line.

pub mod builtin;
pub mod contrib;

use gitlint_core::{LintConfig, LintConfigBuilder, RuleClass};

/// All built-in rule classes, in canonical registration order.
pub fn default_rule_classes() -> Vec<RuleClass> {
    vec![
        builtin::configuration::ignore_by_title(),
        builtin::configuration::ignore_by_body(),
        builtin::configuration::ignore_body_lines(),
        builtin::configuration::ignore_by_author_name(),
        builtin::title::title_max_length(),
        builtin::title::title_trailing_whitespace(),
        builtin::title::title_leading_whitespace(),
        builtin::title::title_trailing_punctuation(),
        builtin::title::title_hard_tab(),
        builtin::title::title_must_not_contain_word(),
        builtin::title::title_match_regex(),
        builtin::title::title_min_length(),
        builtin::body::body_max_line_length(),
        builtin::body::body_min_length(),
        builtin::body::body_is_missing(),
        builtin::body::body_trailing_whitespace(),
        builtin::body::body_hard_tab(),
        builtin::body::body_first_line_empty(),
        builtin::body::body_changed_file_mention(),
        builtin::body::body_match_regex(),
        builtin::meta::author_valid_email(),
    ]
}

/// Contrib rule classes, available through the general `contrib` option.
pub fn contrib_rule_classes() -> Vec<RuleClass> {
    vec![
        contrib::conventional_commit::conventional_commit(),
        contrib::signedoff_by::signedoff_by(),
        contrib::disallow_cleanup_commits::disallow_cleanup_commits(),
        contrib::allowed_authors::allowed_authors(),
    ]
}

/// A configuration with all default rules registered and default options.
pub fn default_config() -> LintConfig {
    LintConfig::new(&default_rule_classes(), contrib_rule_classes())
}

/// A builder seeded with the default and contrib rule classes.
pub fn config_builder() -> LintConfigBuilder {
    LintConfigBuilder::new(default_rule_classes(), contrib_rule_classes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_order() {
        let ids: Vec<String> = default_rule_classes()
            .iter()
            .map(|class| class.id.clone())
            .collect();
        assert_eq!(
            ids,
            [
                "I1", "I2", "I3", "I4", "T1", "T2", "T6", "T3", "T4", "T5", "T7", "T8", "B1",
                "B5", "B6", "B2", "B3", "B4", "B7", "B8", "M1"
            ]
        );
    }

    #[test]
    fn test_default_config_registers_all_rules() {
        let config = default_config();
        assert_eq!(config.rules().len(), 21);
        assert!(config.rules().find_rule("title-max-length").is_some());
        assert!(config.rules().find_rule("M1").is_some());
    }

    #[test]
    fn test_contrib_rules_not_enabled_by_default() {
        let config = default_config();
        assert!(config.rules().find_rule("CT1").is_none());
    }
}
