//! Gitlint Core
//!
//! Core engine for linting git commit messages: the typed option system,
//! the rule model and registry, the multi-source configuration builder,
//! the commit metadata model and the linter itself. Rule implementations
//! live in the `gitlint-rules` crate; this crate provides the machinery
//! they plug into.

pub mod builder;
pub mod collection;
pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod linter;
pub mod options;
pub mod rule;
pub mod shell;

// Re-export commonly used types
pub use builder::{LintConfigBuilder, RULE_QUALIFIER_SYMBOL};
pub use collection::{RuleAttrs, RuleCollection};
pub use config::LintConfig;
pub use discovery::discover_rule_classes;
pub use error::{GitContextError, LintConfigError, RuleOptionError, UserRuleError};
pub use git::{GitChangedFileStats, GitCommit, GitCommitMessage, GitContext, Repository};
pub use linter::Linter;
pub use options::{OptionValue, PathKind, RuleOption};
pub use rule::{
    CommitCheck, ConfigCheck, LineCheck, LineRuleTarget, LintContext, Rule, RuleBehavior,
    RuleClass, RuleResult, RuleViolation,
};
pub use shell::{Git, GitOutput, NativeGit};
