//! Lint configuration: general options plus the active rule collection
//!
//! Constructed with a fixed default rule set. General options are stored as
//! typed [`RuleOption`] values so external raw strings go through the same
//! validation as rule options. Setting `extra-path` or `contrib` swaps the
//! corresponding subset of the rule collection.

use std::path::{Path, PathBuf};

use crate::collection::{RuleAttrs, RuleCollection};
use crate::discovery;
use crate::error::LintConfigError;
use crate::options::{PathKind, RuleOption};
use crate::rule::{LintContext, RuleClass};

/// The active lint configuration
#[derive(Debug, Clone)]
pub struct LintConfig {
    rules: RuleCollection,
    /// Available (not necessarily enabled) contrib rule classes, consulted
    /// when the `contrib` option is set
    contrib_classes: Vec<RuleClass>,
    verbosity: RuleOption,
    ignore_merge_commits: RuleOption,
    ignore_fixup_commits: RuleOption,
    ignore_fixup_amend_commits: RuleOption,
    ignore_squash_commits: RuleOption,
    ignore_revert_commits: RuleOption,
    debug: RuleOption,
    target: RuleOption,
    ignore: RuleOption,
    contrib: RuleOption,
    extra_path: RuleOption,
    ignore_stdin: RuleOption,
    staged: RuleOption,
    fail_without_commits: RuleOption,
    regex_style_search: RuleOption,
}

impl LintConfig {
    /// Create a configuration with `default_classes` registered in order.
    /// `contrib_classes` are kept aside until enabled via the `contrib`
    /// option.
    pub fn new(default_classes: &[RuleClass], contrib_classes: Vec<RuleClass>) -> Self {
        let mut rules = RuleCollection::new();
        for class in default_classes {
            rules.add_instance(class.instantiate_default());
        }
        Self {
            rules,
            contrib_classes,
            verbosity: RuleOption::int("verbosity", 3, "Verbosity"),
            ignore_merge_commits: RuleOption::bool(
                "ignore-merge-commits",
                true,
                "Ignore merge commits",
            ),
            ignore_fixup_commits: RuleOption::bool(
                "ignore-fixup-commits",
                true,
                "Ignore fixup commits",
            ),
            ignore_fixup_amend_commits: RuleOption::bool(
                "ignore-fixup-amend-commits",
                true,
                "Ignore fixup amend commits",
            ),
            ignore_squash_commits: RuleOption::bool(
                "ignore-squash-commits",
                true,
                "Ignore squash commits",
            ),
            ignore_revert_commits: RuleOption::bool(
                "ignore-revert-commits",
                true,
                "Ignore revert commits",
            ),
            debug: RuleOption::bool("debug", false, "Enable debug mode"),
            target: RuleOption::path(
                "target",
                PathKind::Dir,
                "Path of the target git repository",
            ),
            ignore: RuleOption::list("ignore", &[], "List of rule-ids to ignore"),
            contrib: RuleOption::list("contrib", &[], "List of contrib-rules to enable"),
            extra_path: RuleOption::path(
                "extra-path",
                PathKind::Both,
                "Path to a directory or file with extra user-defined rules",
            ),
            ignore_stdin: RuleOption::bool(
                "ignore-stdin",
                false,
                "Ignore any stdin data. Useful for running in CI server.",
            ),
            staged: RuleOption::bool(
                "staged",
                false,
                "Read staged commit meta-info from the local repository.",
            ),
            fail_without_commits: RuleOption::bool(
                "fail-without-commits",
                false,
                "Hard fail when the target commit range is empty",
            ),
            regex_style_search: RuleOption::bool(
                "regex-style-search",
                false,
                "Use `search` instead of `match` semantics for regex rules",
            ),
        }
    }

    pub fn rules(&self) -> &RuleCollection {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleCollection {
        &mut self.rules
    }

    pub fn verbosity(&self) -> i64 {
        self.verbosity.as_int().unwrap_or(3)
    }

    pub fn ignore_merge_commits(&self) -> bool {
        self.ignore_merge_commits.as_bool().unwrap_or(true)
    }

    pub fn ignore_fixup_commits(&self) -> bool {
        self.ignore_fixup_commits.as_bool().unwrap_or(true)
    }

    pub fn ignore_fixup_amend_commits(&self) -> bool {
        self.ignore_fixup_amend_commits.as_bool().unwrap_or(true)
    }

    pub fn ignore_squash_commits(&self) -> bool {
        self.ignore_squash_commits.as_bool().unwrap_or(true)
    }

    pub fn ignore_revert_commits(&self) -> bool {
        self.ignore_revert_commits.as_bool().unwrap_or(true)
    }

    pub fn debug(&self) -> bool {
        self.debug.as_bool().unwrap_or(false)
    }

    pub fn ignore(&self) -> &[String] {
        self.ignore.as_list().unwrap_or(&[])
    }

    pub fn contrib(&self) -> &[String] {
        self.contrib.as_list().unwrap_or(&[])
    }

    pub fn target(&self) -> PathBuf {
        self.target
            .as_path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn extra_path(&self) -> Option<&Path> {
        self.extra_path.as_path()
    }

    pub fn ignore_stdin(&self) -> bool {
        self.ignore_stdin.as_bool().unwrap_or(false)
    }

    pub fn staged(&self) -> bool {
        self.staged.as_bool().unwrap_or(false)
    }

    pub fn fail_without_commits(&self) -> bool {
        self.fail_without_commits.as_bool().unwrap_or(false)
    }

    pub fn regex_style_search(&self) -> bool {
        self.regex_style_search.as_bool().unwrap_or(false)
    }

    /// The per-rule validation context derived from this configuration
    pub fn lint_context(&self) -> LintContext {
        LintContext {
            regex_style_search: self.regex_style_search(),
        }
    }

    /// True when `id_or_name` matches the id or name of a rule on the
    /// ignore list
    pub fn is_rule_ignored(&self, id: &str, name: &str) -> bool {
        self.ignore()
            .iter()
            .any(|entry| entry == id || entry == name)
    }

    /// Set the ignore list. The literal value `all` (any case, surrounding
    /// whitespace allowed) expands to every currently registered rule id.
    /// List parsing cannot fail, so this is infallible and usable from
    /// configuration rules.
    pub fn set_ignore(&mut self, value: &str) {
        if value.trim().eq_ignore_ascii_case("all") {
            let all_ids: Vec<String> = self.rules.ids().map(str::to_string).collect();
            let _ = self.ignore.set_list(all_ids);
        } else {
            let _ = self.ignore.set(Some(value));
        }
    }

    /// Append rule references to the ignore list, used by configuration
    /// rules
    pub fn extend_ignore(&mut self, extra: impl IntoIterator<Item = String>) {
        let mut current: Vec<String> = self.ignore().to_vec();
        current.extend(extra);
        // Values built programmatically bypass raw-string validation
        let _ = self.ignore.set_list(current);
    }

    pub fn set_verbosity(&mut self, value: &str) -> Result<(), LintConfigError> {
        self.verbosity.set(Some(value))?;
        if !(0..=3).contains(&self.verbosity()) {
            return Err(LintConfigError::InvalidVerbosity);
        }
        Ok(())
    }

    /// Point the configuration at a directory or file with user-defined
    /// rules: previously loaded user rules are unloaded, then every rule
    /// discovered at the new location is registered.
    pub fn set_extra_path(&mut self, value: &str) -> Result<(), LintConfigError> {
        self.extra_path.set(Some(value))?;
        let path = self
            .extra_path
            .as_path()
            .ok_or_else(|| LintConfigError::InvalidFilePath {
                path: value.to_string(),
            })?
            .to_path_buf();

        self.rules.delete_rules_by(|rule| rule.is_user_defined);
        let classes = discovery::discover_rule_classes(&path)?;
        for class in &classes {
            self.rules
                .add_rule(class, &Default::default(), RuleAttrs::user_defined())?;
        }
        Ok(())
    }

    /// Enable a set of contrib rules by id or name. Previously enabled
    /// contrib rules are unloaded first; an unmatched reference fails.
    pub fn set_contrib(&mut self, value: &str) -> Result<(), LintConfigError> {
        self.contrib.set(Some(value))?;
        self.rules.delete_rules_by(|rule| rule.is_contrib);

        let requested: Vec<String> = self.contrib().to_vec();
        for reference in requested {
            let class = self
                .contrib_classes
                .iter()
                .find(|class| reference == class.id || reference == class.name)
                .ok_or_else(|| LintConfigError::UnknownContribRule {
                    rule: reference.clone(),
                })?;
            let class = class.clone();
            self.rules
                .add_rule(&class, &Default::default(), RuleAttrs::contrib())?;
        }
        Ok(())
    }

    /// Current value of a rule option, rendered as a string
    pub fn get_rule_option(
        &self,
        rule_ref: &str,
        option_name: &str,
    ) -> Result<String, LintConfigError> {
        let rule = self
            .rules
            .find_rule(rule_ref)
            .ok_or_else(|| LintConfigError::UnknownRule {
                rule: rule_ref.to_string(),
            })?;
        let option = rule
            .option(option_name)
            .ok_or_else(|| LintConfigError::UnknownOption {
                rule: rule_ref.to_string(),
                option: option_name.to_string(),
            })?;
        Ok(option.value_repr())
    }

    /// Set a rule option from a raw string, wrapping validation failures in
    /// an error naming the rule and option
    pub fn set_rule_option(
        &mut self,
        rule_ref: &str,
        option_name: &str,
        value: &str,
    ) -> Result<(), LintConfigError> {
        let rule = self
            .rules
            .find_rule_mut(rule_ref)
            .ok_or_else(|| LintConfigError::UnknownRule {
                rule: rule_ref.to_string(),
            })?;
        let option =
            rule.options
                .get_mut(option_name)
                .ok_or_else(|| LintConfigError::UnknownOption {
                    rule: rule_ref.to_string(),
                    option: option_name.to_string(),
                })?;
        option
            .set(Some(value))
            .map_err(|source| LintConfigError::InvalidRuleOption {
                value: value.to_string(),
                rule: rule_ref.to_string(),
                option: option_name.to_string(),
                source,
            })
    }

    /// Set a general option by its external hyphenated name
    pub fn set_general_option(&mut self, name: &str, value: &str) -> Result<(), LintConfigError> {
        match name {
            "verbosity" => self.set_verbosity(value),
            "ignore-merge-commits" => Ok(self.ignore_merge_commits.set(Some(value))?),
            "ignore-fixup-commits" => Ok(self.ignore_fixup_commits.set(Some(value))?),
            "ignore-fixup-amend-commits" => Ok(self.ignore_fixup_amend_commits.set(Some(value))?),
            "ignore-squash-commits" => Ok(self.ignore_squash_commits.set(Some(value))?),
            "ignore-revert-commits" => Ok(self.ignore_revert_commits.set(Some(value))?),
            "debug" => Ok(self.debug.set(Some(value))?),
            "target" => Ok(self.target.set(Some(value))?),
            "ignore" => {
                self.set_ignore(value);
                Ok(())
            }
            "contrib" => self.set_contrib(value),
            "extra-path" => self.set_extra_path(value),
            "ignore-stdin" => Ok(self.ignore_stdin.set(Some(value))?),
            "staged" => Ok(self.staged.set(Some(value))?),
            "fail-without-commits" => Ok(self.fail_without_commits.set(Some(value))?),
            "regex-style-search" => Ok(self.regex_style_search.set(Some(value))?),
            _ => Err(LintConfigError::UnknownGeneralOption {
                option: name.to_string(),
            }),
        }
    }
}

impl PartialEq for LintConfig {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
            && self.verbosity == other.verbosity
            && self.ignore_merge_commits == other.ignore_merge_commits
            && self.ignore_fixup_commits == other.ignore_fixup_commits
            && self.ignore_fixup_amend_commits == other.ignore_fixup_amend_commits
            && self.ignore_squash_commits == other.ignore_squash_commits
            && self.ignore_revert_commits == other.ignore_revert_commits
            && self.debug == other.debug
            && self.target == other.target
            && self.ignore == other.ignore
            && self.contrib == other.contrib
            && self.extra_path == other.extra_path
            && self.ignore_stdin == other.ignore_stdin
            && self.staged == other.staged
            && self.fail_without_commits == other.fail_without_commits
            && self.regex_style_search == other.regex_style_search
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitCommit;
    use crate::options::RuleOption;
    use crate::rule::{LineRuleTarget, Rule, RuleResult};

    fn noop(_r: &Rule, _l: &str, _c: &GitCommit, _ctx: &crate::rule::LintContext) -> RuleResult {
        Ok(Vec::new())
    }

    fn default_classes() -> Vec<RuleClass> {
        vec![
            RuleClass::line("T1", "title-max-length", LineRuleTarget::CommitMessageTitle, noop)
                .with_options(vec![RuleOption::int("line-length", 72, "Max line length")]),
            RuleClass::line("B1", "body-max-line-length", LineRuleTarget::CommitMessageBody, noop)
                .with_options(vec![RuleOption::int("line-length", 80, "Max line length")]),
        ]
    }

    fn contrib_classes() -> Vec<RuleClass> {
        vec![RuleClass::line(
            "CT1",
            "contrib-title-conventional-commits",
            LineRuleTarget::CommitMessageTitle,
            noop,
        )]
    }

    fn config() -> LintConfig {
        LintConfig::new(&default_classes(), contrib_classes())
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.verbosity(), 3);
        assert!(config.ignore_merge_commits());
        assert!(!config.debug());
        assert!(config.ignore().is_empty());
        assert!(!config.regex_style_search());
        assert_eq!(config.rules().len(), 2);
    }

    #[test]
    fn test_set_verbosity_bounds() {
        let mut config = config();
        config.set_verbosity("2").unwrap();
        assert_eq!(config.verbosity(), 2);

        let err = config.set_verbosity("4").unwrap_err();
        assert!(matches!(err, LintConfigError::InvalidVerbosity));
    }

    #[test]
    fn test_set_ignore_all_expands() {
        let mut config = config();
        config.set_ignore(" ALL ");
        assert_eq!(config.ignore(), &["T1".to_string(), "B1".to_string()]);

        config.set_ignore("T1, title-max-length");
        assert!(config.is_rule_ignored("T1", "title-max-length"));
        assert!(!config.is_rule_ignored("B1", "body-max-line-length"));
    }

    #[test]
    fn test_set_rule_option() {
        let mut config = config();
        config.set_rule_option("T1", "line-length", "120").unwrap();
        assert_eq!(config.get_rule_option("T1", "line-length").unwrap(), "120");

        // By name too
        config
            .set_rule_option("title-max-length", "line-length", "50")
            .unwrap();
        assert_eq!(config.get_rule_option("T1", "line-length").unwrap(), "50");
    }

    #[test]
    fn test_set_rule_option_errors() {
        let mut config = config();
        let err = config.set_rule_option("X1", "line-length", "1").unwrap_err();
        assert_eq!(err.to_string(), "No such rule 'X1'");

        let err = config.set_rule_option("T1", "nope", "1").unwrap_err();
        assert_eq!(err.to_string(), "Rule 'T1' has no option 'nope'");

        let err = config.set_rule_option("T1", "line-length", "foo").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'foo' is not a valid value for option 'T1.line-length'. \
             Option 'line-length' must be a positive integer (current value: 'foo')."
        );
    }

    #[test]
    fn test_set_general_option_unknown() {
        let mut config = config();
        let err = config.set_general_option("nonexistent", "1").unwrap_err();
        assert_eq!(err.to_string(), "'nonexistent' is not a valid gitlint option");
    }

    #[test]
    fn test_set_contrib() {
        let mut config = config();
        config
            .set_general_option("contrib", "contrib-title-conventional-commits")
            .unwrap();
        let rule = config.rules().find_rule("CT1").unwrap();
        assert!(rule.is_contrib);

        // Re-setting replaces rather than duplicates
        config.set_contrib("CT1").unwrap();
        assert_eq!(config.rules().iter().filter(|r| r.is_contrib).count(), 1);

        let err = config.set_contrib("CT99").unwrap_err();
        assert_eq!(
            err.to_string(),
            "No contrib rule with id or name 'CT99' found."
        );
    }

    #[test]
    fn test_config_equality() {
        let a = config();
        let b = config();
        assert_eq!(a, b);

        let mut c = config();
        c.set_rule_option("T1", "line-length", "10").unwrap();
        assert_ne!(a, c);
    }
}
