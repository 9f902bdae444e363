//! Error types for commit message linting operations

use std::path::PathBuf;
use thiserror::Error;

/// Error raised when a raw value fails validation for a typed rule option
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleOptionError {
    #[error("Option '{name}' must be a positive integer (current value: '{value}')")]
    PositiveInt { name: String, value: String },

    #[error("Option '{name}' must be an integer (current value: '{value}')")]
    Int { name: String, value: String },

    #[error("Option '{name}' must be either 'true' or 'false'")]
    Bool { name: String },

    #[error("Option {name} must be an existing directory (current value: '{value}')")]
    Directory { name: String, value: String },

    #[error("Option {name} must be an existing file (current value: '{value}')")]
    File { name: String, value: String },

    #[error("Option {name} must be either an existing directory or file (current value: '{value}')")]
    DirectoryOrFile { name: String, value: String },

    #[error("Invalid regular expression: '{error}'")]
    Regex { name: String, error: String },

    #[error("Option '{name}' does not accept a list value")]
    NotAList { name: String },
}

/// Error raised while loading or validating user-defined rules from an extra path
#[derive(Debug, Error)]
pub enum UserRuleError {
    #[error("Invalid extra-path: {path}")]
    InvalidExtraPath { path: String },

    #[error("Error while loading extra-path module '{module}': {message}")]
    ModuleLoad { module: String, message: String },

    #[error("User-defined rule '{rule}' must have an 'id' attribute")]
    MissingId { rule: String },

    #[error("User-defined rule '{rule}' must have a 'name' attribute")]
    MissingName { rule: String },

    #[error("The id '{id}' of '{rule}' is invalid. Gitlint reserves ids starting with R,T,B,M,I")]
    ReservedId { rule: String, id: String },

    #[error("The target of the user-defined line rule '{rule}' must be either 'title' or 'body'")]
    MissingTarget { rule: String },

    #[error("Invalid check for user-defined rule '{rule}': {message}")]
    InvalidCheck { rule: String, message: String },

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error raised while building or mutating a lint configuration
#[derive(Debug, Error)]
pub enum LintConfigError {
    #[error(transparent)]
    Option(#[from] RuleOptionError),

    #[error("'{value}' is not a valid value for option '{rule}.{option}'. {source}.")]
    InvalidRuleOption {
        value: String,
        rule: String,
        option: String,
        source: RuleOptionError,
    },

    #[error("No such rule '{rule}'")]
    UnknownRule { rule: String },

    #[error("Rule '{rule}' has no option '{option}'")]
    UnknownOption { rule: String, option: String },

    #[error("'{option}' is not a valid gitlint option")]
    UnknownGeneralOption { option: String },

    #[error("Option 'verbosity' must be set between 0 and 3")]
    InvalidVerbosity,

    #[error("The rule-name part in '{qualifier}' cannot contain whitespace, colons or be empty")]
    InvalidNamedRule { qualifier: String },

    #[error("No such rule '{parent}' (named rule: '{qualifier}')")]
    UnknownParentRule { parent: String, qualifier: String },

    #[error("Invalid file path: {path}")]
    InvalidFilePath { path: String },

    #[error("Invalid config file: {message}")]
    InvalidConfigFile { message: String },

    #[error("'{option}' is an invalid configuration option. Use '<rule>.<option>=<value>'")]
    InvalidOptionString { option: String },

    #[error("No contrib rule with id or name '{rule}' found.")]
    UnknownContribRule { rule: String },

    #[error(transparent)]
    UserRule(#[from] UserRuleError),
}

/// Error raised while retrieving metadata from a git repository
#[derive(Debug, Error)]
pub enum GitContextError {
    #[error(
        "'git' command not found. You need to install git to use gitlint on a local repository."
    )]
    GitNotInstalled,

    #[error("{path} is not a git repository.")]
    NotARepository { path: String },

    #[error("Current branch has no commits. Gitlint requires at least one commit to function.")]
    NoCommits,

    #[error("An error occurred while executing '{command}': {stderr}")]
    ExitCode { command: String, stderr: String },

    #[error("Missing git configuration: please set {key}")]
    MissingGitConfig { key: String },

    #[error("Unexpected git output: {message}")]
    InvalidOutput { message: String },

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GitContextError {
    /// Create an invalid-output error
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
