//! Typed, self-validating rule options
//!
//! Every configurable part of a rule (e.g. the max length of the
//! `title-max-length` rule) is a [`RuleOption`]: a named value that validates
//! raw string input on assignment and keeps its previous value when
//! validation fails.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::RuleOptionError;

/// What a path option is allowed to point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Dir,
    File,
    Both,
}

/// The typed value held by a [`RuleOption`]
///
/// Every variant except `Bool` can be unset: assigning a null raw value
/// clears the option. Booleans must always be either `true` or `false`.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Int {
        value: Option<i64>,
        allow_negative: bool,
    },
    Bool {
        value: bool,
    },
    Str {
        value: Option<String>,
    },
    List {
        value: Option<Vec<String>>,
    },
    Path {
        value: Option<PathBuf>,
        kind: PathKind,
    },
    Regex {
        value: Option<Regex>,
    },
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                OptionValue::Int {
                    value: a,
                    allow_negative: an,
                },
                OptionValue::Int {
                    value: b,
                    allow_negative: bn,
                },
            ) => a == b && an == bn,
            (OptionValue::Bool { value: a }, OptionValue::Bool { value: b }) => a == b,
            (OptionValue::Str { value: a }, OptionValue::Str { value: b }) => a == b,
            (OptionValue::List { value: a }, OptionValue::List { value: b }) => a == b,
            (
                OptionValue::Path { value: a, kind: ak },
                OptionValue::Path { value: b, kind: bk },
            ) => a == b && ak == bk,
            (OptionValue::Regex { value: a }, OptionValue::Regex { value: b }) => {
                // Compiled regexes compare by pattern
                a.as_ref().map(Regex::as_str) == b.as_ref().map(Regex::as_str)
            }
            _ => false,
        }
    }
}

/// A named, described, typed option of a rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOption {
    pub name: String,
    pub description: String,
    pub value: OptionValue,
}

impl RuleOption {
    /// Create a non-negative integer option
    pub fn int(name: &str, default: impl Into<Option<i64>>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::Int {
                value: default.into(),
                allow_negative: false,
            },
        }
    }

    /// Create an integer option that also accepts negative values
    pub fn int_allow_negative(
        name: &str,
        default: impl Into<Option<i64>>,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::Int {
                value: default.into(),
                allow_negative: true,
            },
        }
    }

    /// Create a boolean option
    pub fn bool(name: &str, default: bool, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::Bool { value: default },
        }
    }

    /// Create a string option
    pub fn str(name: &str, default: impl Into<Option<String>>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::Str {
                value: default.into(),
            },
        }
    }

    /// Create a list-of-strings option
    pub fn list(name: &str, default: &[&str], description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::List {
                value: Some(default.iter().map(|s| s.to_string()).collect()),
            },
        }
    }

    /// Create a filesystem path option
    pub fn path(name: &str, kind: PathKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::Path { value: None, kind },
        }
    }

    /// Create a regular expression option
    ///
    /// `default` must be a valid pattern; invalid defaults leave the option
    /// unset (rule authors control defaults, so this only trips in tests).
    pub fn regex(name: &str, default: Option<&str>, description: &str) -> Self {
        let compiled = default.and_then(|pattern| {
            let regex = Regex::new(pattern);
            debug_assert!(regex.is_ok(), "invalid default regex for option {name}");
            regex.ok()
        });
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: OptionValue::Regex { value: compiled },
        }
    }

    /// Validate and assign a raw value
    ///
    /// A `None` raw value unsets the option, except for booleans which must
    /// always hold a value. On failure the previous value is retained.
    pub fn set(&mut self, raw: Option<&str>) -> Result<(), RuleOptionError> {
        match &mut self.value {
            OptionValue::Int {
                value,
                allow_negative,
            } => {
                let Some(raw) = raw else {
                    *value = None;
                    return Ok(());
                };
                let parsed: i64 = raw.trim().parse().map_err(|_| {
                    int_error(&self.name, raw, *allow_negative)
                })?;
                if !*allow_negative && parsed < 0 {
                    return Err(int_error(&self.name, raw, *allow_negative));
                }
                *value = Some(parsed);
            }
            OptionValue::Bool { value } => {
                // Booleans cannot be unset
                let Some(raw) = raw else {
                    return Err(RuleOptionError::Bool {
                        name: self.name.clone(),
                    });
                };
                match raw.trim().to_lowercase().as_str() {
                    "true" => *value = true,
                    "false" => *value = false,
                    _ => {
                        return Err(RuleOptionError::Bool {
                            name: self.name.clone(),
                        });
                    }
                }
            }
            OptionValue::Str { value } => {
                *value = raw.map(|r| r.to_string());
            }
            OptionValue::List { value } => {
                *value = raw.map(split_list);
            }
            OptionValue::Path { value, kind } => {
                let Some(raw) = raw else {
                    *value = None;
                    return Ok(());
                };
                let path = Path::new(raw);
                let valid = match kind {
                    PathKind::Dir => path.is_dir(),
                    PathKind::File => path.is_file(),
                    PathKind::Both => path.is_dir() || path.is_file(),
                };
                if !valid {
                    return Err(path_error(&self.name, raw, *kind));
                }
                let canonical = std::fs::canonicalize(path)
                    .map_err(|_| path_error(&self.name, raw, *kind))?;
                *value = Some(canonical);
            }
            OptionValue::Regex { value } => {
                let Some(raw) = raw else {
                    *value = None;
                    return Ok(());
                };
                let compiled = Regex::new(raw).map_err(|e| RuleOptionError::Regex {
                    name: self.name.clone(),
                    error: e.to_string(),
                })?;
                *value = Some(compiled);
            }
        }
        Ok(())
    }

    /// Assign an already-structured list of items to a list option
    pub fn set_list(&mut self, items: Vec<String>) -> Result<(), RuleOptionError> {
        match &mut self.value {
            OptionValue::List { value } => {
                *value = Some(
                    items
                        .into_iter()
                        .map(|item| item.trim().to_string())
                        .filter(|item| !item.is_empty())
                        .collect(),
                );
                Ok(())
            }
            _ => Err(RuleOptionError::NotAList {
                name: self.name.clone(),
            }),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match &self.value {
            OptionValue::Int { value, .. } => *value,
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            OptionValue::Bool { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            OptionValue::Str { value } => value.as_deref(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match &self.value {
            OptionValue::List { value } => value.as_deref(),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match &self.value {
            OptionValue::Path { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match &self.value {
            OptionValue::Regex { value } => value.as_ref(),
            _ => None,
        }
    }

    /// Human-readable rendering of the current value
    pub fn value_repr(&self) -> String {
        match &self.value {
            OptionValue::Int { value, .. } => opt_repr(value.map(|v| v.to_string())),
            OptionValue::Bool { value } => value.to_string(),
            OptionValue::Str { value } => opt_repr(value.clone()),
            OptionValue::List { value } => opt_repr(value.as_ref().map(|v| v.join(","))),
            OptionValue::Path { value, .. } => {
                opt_repr(value.as_ref().map(|p| p.display().to_string()))
            }
            OptionValue::Regex { value } => {
                opt_repr(value.as_ref().map(|r| r.as_str().to_string()))
            }
        }
    }
}

impl fmt::Display for RuleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}: {} ({}))", self.name, self.value_repr(), self.description)
    }
}

/// Split a comma-separated raw value, trimming items and dropping empty ones
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn int_error(name: &str, value: &str, allow_negative: bool) -> RuleOptionError {
    if allow_negative {
        RuleOptionError::Int {
            name: name.to_string(),
            value: value.to_string(),
        }
    } else {
        RuleOptionError::PositiveInt {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

fn path_error(name: &str, value: &str, kind: PathKind) -> RuleOptionError {
    match kind {
        PathKind::Dir => RuleOptionError::Directory {
            name: name.to_string(),
            value: value.to_string(),
        },
        PathKind::File => RuleOptionError::File {
            name: name.to_string(),
            value: value.to_string(),
        },
        PathKind::Both => RuleOptionError::DirectoryOrFile {
            name: name.to_string(),
            value: value.to_string(),
        },
    }
}

fn opt_repr(value: Option<String>) -> String {
    value.unwrap_or_else(|| "None".to_string())
}
