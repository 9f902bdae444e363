//! Rule model: capability contracts, rule prototypes and rule instances
//!
//! A [`RuleClass`] is the prototype of a rule: id, name, target, option
//! specification and behavior. Registering a class in a
//! [`RuleCollection`](crate::collection::RuleCollection) instantiates it into
//! a [`Rule`] carrying its own option values, so the same class can be
//! registered multiple times under different ids (named rules, contrib
//! rules). Behavior comes in three capability variants: line rules validate a
//! single line, commit rules validate the whole commit, configuration rules
//! mutate the active configuration and/or the commit before any other rule
//! runs.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use regex::Regex;

use crate::config::LintConfig;
use crate::error::{GitContextError, RuleOptionError};
use crate::git::GitCommit;
use crate::options::RuleOption;

/// Result of a rule's validate call
pub type RuleResult = Result<Vec<RuleViolation>, GitContextError>;

/// Where a line rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRuleTarget {
    CommitMessageTitle,
    CommitMessageBody,
}

/// A reported rule failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub rule_id: String,
    pub message: String,
    pub content: Option<String>,
    /// 1-based line number, assigned by the linter for line-rule results
    pub line_nr: Option<u64>,
}

impl RuleViolation {
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        content: Option<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            message: message.into(),
            content,
            line_nr: None,
        }
    }

    pub fn with_line_nr(mut self, line_nr: u64) -> Self {
        self.line_nr = Some(line_nr);
        self
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line_nr = match self.line_nr {
            Some(nr) => nr.to_string(),
            None => "-".to_string(),
        };
        let content = self.content.as_deref().unwrap_or("");
        write!(
            f,
            "{}: {} {}: \"{}\"",
            line_nr, self.rule_id, self.message, content
        )
    }
}

/// Narrow capability handed to every validate call, derived from the active
/// configuration. Replaces process-wide state that rules would otherwise
/// have to consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct LintContext {
    /// Use `search` (match anywhere) instead of legacy `match` (match at
    /// start) semantics for regex rules
    pub regex_style_search: bool,
}

impl LintContext {
    /// Match `text` against `regex` using the configured regex style.
    ///
    /// Legacy `match` semantics anchor at the start of the text; rules on
    /// that path get a deprecation warning telling users to set
    /// `general.regex-style-search=true`.
    pub fn regex_matches(&self, rule: &Rule, regex: &Regex, text: &str) -> bool {
        if self.regex_style_search {
            return regex.is_match(text);
        }
        tracing::warn!(
            "{} - {}: gitlint will be switching from regex 'match' (match beginning) to \
             'search' (match anywhere) semantics. Please review your {}.regex option \
             accordingly. To remove this warning, set general.regex-style-search=true.",
            rule.id,
            rule.name,
            rule.name
        );
        regex.find(text).is_some_and(|m| m.start() == 0)
    }
}

/// Capability contract for rules that validate one line at a time
pub trait LineCheck {
    fn validate(&self, rule: &Rule, line: &str, commit: &GitCommit, ctx: &LintContext)
    -> RuleResult;
}

impl<F> LineCheck for F
where
    F: Fn(&Rule, &str, &GitCommit, &LintContext) -> RuleResult,
{
    fn validate(
        &self,
        rule: &Rule,
        line: &str,
        commit: &GitCommit,
        ctx: &LintContext,
    ) -> RuleResult {
        self(rule, line, commit, ctx)
    }
}

/// Capability contract for rules that validate the whole commit
pub trait CommitCheck {
    fn validate(&self, rule: &Rule, commit: &GitCommit, ctx: &LintContext) -> RuleResult;
}

impl<F> CommitCheck for F
where
    F: Fn(&Rule, &GitCommit, &LintContext) -> RuleResult,
{
    fn validate(&self, rule: &Rule, commit: &GitCommit, ctx: &LintContext) -> RuleResult {
        self(rule, commit, ctx)
    }
}

/// Capability contract for rules that mutate the configuration and/or the
/// commit under inspection. These run once per commit, before all other
/// rules, in registration order.
pub trait ConfigCheck {
    fn apply(
        &self,
        rule: &Rule,
        config: &mut LintConfig,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError>;
}

impl<F> ConfigCheck for F
where
    F: Fn(&Rule, &mut LintConfig, &mut GitCommit) -> Result<(), GitContextError>,
{
    fn apply(
        &self,
        rule: &Rule,
        config: &mut LintConfig,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError> {
        self(rule, config, commit)
    }
}

/// The behavior of a rule, one of the three capability variants
#[derive(Clone)]
pub enum RuleBehavior {
    Line(Rc<dyn LineCheck>),
    Commit(Rc<dyn CommitCheck>),
    Configuration(Rc<dyn ConfigCheck>),
}

impl fmt::Debug for RuleBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleBehavior::Line(_) => write!(f, "RuleBehavior::Line"),
            RuleBehavior::Commit(_) => write!(f, "RuleBehavior::Commit"),
            RuleBehavior::Configuration(_) => write!(f, "RuleBehavior::Configuration"),
        }
    }
}

/// Rule prototype: everything needed to instantiate a [`Rule`]
///
/// This is the registration entry point for compiled-in plugins as well:
/// embedders construct `RuleClass` values and add them to a
/// [`RuleCollection`](crate::collection::RuleCollection) or pass them to the
/// config builder.
#[derive(Debug, Clone)]
pub struct RuleClass {
    pub id: String,
    pub name: String,
    pub target: Option<LineRuleTarget>,
    pub options_spec: Vec<RuleOption>,
    pub behavior: RuleBehavior,
}

impl RuleClass {
    /// Create a line rule class
    pub fn line(
        id: &str,
        name: &str,
        target: LineRuleTarget,
        check: impl LineCheck + 'static,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target: Some(target),
            options_spec: Vec::new(),
            behavior: RuleBehavior::Line(Rc::new(check)),
        }
    }

    /// Create a commit rule class
    pub fn commit(id: &str, name: &str, check: impl CommitCheck + 'static) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target: None,
            options_spec: Vec::new(),
            behavior: RuleBehavior::Commit(Rc::new(check)),
        }
    }

    /// Create a configuration rule class
    pub fn configuration(id: &str, name: &str, check: impl ConfigCheck + 'static) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target: None,
            options_spec: Vec::new(),
            behavior: RuleBehavior::Configuration(Rc::new(check)),
        }
    }

    /// Attach the ordered option specification
    pub fn with_options(mut self, options_spec: Vec<RuleOption>) -> Self {
        self.options_spec = options_spec;
        self
    }

    /// Instantiate this class, validating and applying raw option overrides.
    ///
    /// Every option in the spec is independently cloned; a validation
    /// failure for any override aborts construction.
    pub fn instantiate(
        &self,
        raw_options: &HashMap<String, String>,
    ) -> Result<Rule, RuleOptionError> {
        let mut options = IndexMap::new();
        for spec in &self.options_spec {
            let mut option = spec.clone();
            if let Some(raw) = raw_options.get(&spec.name) {
                option.set(Some(raw))?;
            }
            options.insert(option.name.clone(), option);
        }
        Ok(Rule {
            id: self.id.clone(),
            name: self.name.clone(),
            options,
            class: self.clone(),
            is_contrib: false,
            is_user_defined: false,
            is_named: false,
        })
    }

    /// Instantiate this class with default option values
    pub fn instantiate_default(&self) -> Rule {
        let mut options = IndexMap::new();
        for spec in &self.options_spec {
            options.insert(spec.name.clone(), spec.clone());
        }
        Rule {
            id: self.id.clone(),
            name: self.name.clone(),
            options,
            class: self.clone(),
            is_contrib: false,
            is_user_defined: false,
            is_named: false,
        }
    }
}

/// A registered rule instance
///
/// `id` and `name` may differ from the class when the rule was registered as
/// a named rule. The auxiliary flags record how the rule got registered;
/// they are excluded from equality.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub options: IndexMap<String, RuleOption>,
    /// The prototype this instance was created from; kept so named rules can
    /// re-instantiate the parent class with default option values
    pub class: RuleClass,
    pub is_contrib: bool,
    pub is_user_defined: bool,
    pub is_named: bool,
}

impl Rule {
    pub fn target(&self) -> Option<LineRuleTarget> {
        self.class.target
    }

    pub fn behavior(&self) -> &RuleBehavior {
        &self.class.behavior
    }

    pub fn is_line_rule(&self) -> bool {
        matches!(self.class.behavior, RuleBehavior::Line(_))
    }

    pub fn is_commit_rule(&self) -> bool {
        matches!(self.class.behavior, RuleBehavior::Commit(_))
    }

    pub fn is_configuration_rule(&self) -> bool {
        matches!(self.class.behavior, RuleBehavior::Configuration(_))
    }

    pub fn option(&self, name: &str) -> Option<&RuleOption> {
        self.options.get(name)
    }

    pub fn int_option(&self, name: &str) -> Option<i64> {
        self.options.get(name).and_then(RuleOption::as_int)
    }

    pub fn bool_option(&self, name: &str) -> Option<bool> {
        self.options.get(name).and_then(RuleOption::as_bool)
    }

    pub fn str_option(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(RuleOption::as_str)
    }

    pub fn list_option(&self, name: &str) -> Option<&[String]> {
        self.options.get(name).and_then(RuleOption::as_list)
    }

    pub fn regex_option(&self, name: &str) -> Option<&Regex> {
        self.options.get(name).and_then(RuleOption::as_regex)
    }
}

impl PartialEq for Rule {
    /// Equality covers id, name, options and target; auxiliary flags and
    /// behavior are excluded.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.options == other.options
            && self.target() == other.target()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}
