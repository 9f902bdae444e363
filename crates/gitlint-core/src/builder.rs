//! Multi-source configuration builder
//!
//! Accumulates raw option values in a section -> option -> value blueprint.
//! Sources (config file, `-c` style strings, commit-embedded directives,
//! direct sets) all funnel into the same blueprint with last-write-wins per
//! key, so callers encode precedence by invocation order. Normalization and
//! validation happen only at [`LintConfigBuilder::build`] time.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::collection::RuleAttrs;
use crate::config::LintConfig;
use crate::error::{GitContextError, LintConfigError};
use crate::git::GitCommit;
use crate::rule::RuleClass;

/// Separates the parent-rule reference from the instance name in a named
/// rule qualifier ("T7:my-instance")
pub const RULE_QUALIFIER_SYMBOL: char = ':';

static COMMIT_IGNORE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^gitlint-ignore:\s*(.*)").expect("static regex"));

/// Builds [`LintConfig`] values from accumulated raw configuration
#[derive(Debug, Clone)]
pub struct LintConfigBuilder {
    blueprint: IndexMap<String, IndexMap<String, String>>,
    config_path: Option<PathBuf>,
    default_classes: Vec<RuleClass>,
    contrib_classes: Vec<RuleClass>,
}

impl LintConfigBuilder {
    pub fn new(default_classes: Vec<RuleClass>, contrib_classes: Vec<RuleClass>) -> Self {
        Self {
            blueprint: IndexMap::new(),
            config_path: None,
            default_classes,
            contrib_classes,
        }
    }

    /// Path of the last loaded config file, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Record a raw option value. Later writes to the same (section, option)
    /// overwrite earlier ones.
    pub fn set_option(&mut self, section: &str, option: &str, value: &str) {
        self.blueprint
            .entry(section.to_string())
            .or_default()
            .insert(option.to_string(), value.to_string());
    }

    /// Apply configuration embedded in the commit message body: the first
    /// body line matching `gitlint-ignore: <value>` sets the general ignore
    /// list.
    pub fn set_config_from_commit(&mut self, commit: &GitCommit) -> Result<(), GitContextError> {
        for line in &commit.message()?.body {
            if let Some(captures) = COMMIT_IGNORE_DIRECTIVE.captures(line) {
                let value = captures.get(1).map_or("", |m| m.as_str()).to_string();
                self.set_option("general", "ignore", &value);
                break;
            }
        }
        Ok(())
    }

    /// Apply a list of `<rule>.<option>=<value>` strings
    pub fn set_config_from_string_list(
        &mut self,
        config_options: &[String],
    ) -> Result<(), LintConfigError> {
        for config_option in config_options {
            let invalid = || LintConfigError::InvalidOptionString {
                option: config_option.clone(),
            };
            let (name, value) = config_option.split_once('=').ok_or_else(invalid)?;
            if value.is_empty() {
                return Err(invalid());
            }
            let (section, option) = name.split_once('.').ok_or_else(invalid)?;
            self.set_option(section, option, value);
        }
        Ok(())
    }

    /// Load raw options from an ini-style config file
    pub fn set_from_config_file(&mut self, path: &Path) -> Result<(), LintConfigError> {
        if !path.exists() {
            return Err(LintConfigError::InvalidFilePath {
                path: path.display().to_string(),
            });
        }
        let canonical =
            fs::canonicalize(path).map_err(|_| LintConfigError::InvalidFilePath {
                path: path.display().to_string(),
            })?;
        let content =
            fs::read_to_string(&canonical).map_err(|err| LintConfigError::InvalidConfigFile {
                message: format!("{}: {err}", canonical.display()),
            })?;
        self.config_path = Some(canonical);
        self.parse_ini(&content)
    }

    /// Parse `[section]` / `key = value` content into the blueprint.
    /// `#` and `;` start comment lines.
    fn parse_ini(&mut self, content: &str) -> Result<(), LintConfigError> {
        let mut section: Option<String> = None;
        for (line_nr, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') {
                let name = line.strip_prefix('[').and_then(|l| l.strip_suffix(']'));
                match name {
                    Some(name) if !name.trim().is_empty() => {
                        section = Some(name.trim().to_string());
                        continue;
                    }
                    _ => {
                        return Err(LintConfigError::InvalidConfigFile {
                            message: format!("invalid section header on line {}", line_nr + 1),
                        });
                    }
                }
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(LintConfigError::InvalidConfigFile {
                    message: format!("expected 'option = value' on line {}", line_nr + 1),
                });
            };
            let Some(section) = section.as_deref() else {
                return Err(LintConfigError::InvalidConfigFile {
                    message: format!("option outside of a section on line {}", line_nr + 1),
                });
            };
            self.set_option(section, key.trim(), value.trim());
        }
        Ok(())
    }

    /// Register a named rule for `qualifier` ("<parent-ref>:<instance>") if
    /// its canonical id isn't registered yet, and return that canonical id
    fn add_named_rule(
        config: &mut LintConfig,
        qualifier: &str,
    ) -> Result<String, LintConfigError> {
        let (parent_ref, instance_name) = qualifier
            .split_once(RULE_QUALIFIER_SYMBOL)
            .unwrap_or((qualifier, ""));
        let parent_ref = parent_ref.trim();
        let instance_name = instance_name.trim();

        if instance_name.is_empty()
            || instance_name
                .chars()
                .any(|c| c.is_whitespace() || c == RULE_QUALIFIER_SYMBOL)
        {
            return Err(LintConfigError::InvalidNamedRule {
                qualifier: qualifier.to_string(),
            });
        }

        let parent_class = config
            .rules()
            .find_rule(parent_ref)
            .map(|parent| parent.class.clone())
            .ok_or_else(|| LintConfigError::UnknownParentRule {
                parent: parent_ref.to_string(),
                qualifier: qualifier.to_string(),
            })?;

        // The canonical id/name derive from the parent class, so looking up
        // a named rule by "<parent-id>:<x>" or "<parent-name>:<x>" resolves
        // to the same instance
        let canonical_id = format!("{}{}{}", parent_class.id, RULE_QUALIFIER_SYMBOL, instance_name);
        let canonical_name =
            format!("{}{}{}", parent_class.name, RULE_QUALIFIER_SYMBOL, instance_name);

        if config.rules().get(&canonical_id).is_none() {
            let mut rule = parent_class.instantiate_default();
            rule.id = canonical_id.clone();
            rule.name = canonical_name;
            rule.is_named = true;
            config.rules_mut().add_instance(rule);
        }
        Ok(canonical_id)
    }

    /// Normalize and validate the blueprint into a [`LintConfig`].
    ///
    /// General options apply first since they can change which rules (and
    /// therefore which rule options) exist. Passing `existing` mutates that
    /// configuration instead of starting from the default rule set.
    pub fn build(&self, existing: Option<LintConfig>) -> Result<LintConfig, LintConfigError> {
        let mut config = existing
            .unwrap_or_else(|| LintConfig::new(&self.default_classes, self.contrib_classes.clone()));

        if let Some(general) = self.blueprint.get("general") {
            for (option, value) in general {
                config.set_general_option(option, value)?;
            }
        }

        for (section, options) in &self.blueprint {
            if section == "general" {
                continue;
            }
            for (option, value) in options {
                let rule_ref = if section.contains(RULE_QUALIFIER_SYMBOL) {
                    Self::add_named_rule(&mut config, section)?
                } else {
                    section.clone()
                };
                config.set_rule_option(&rule_ref, option, value)?;
            }
        }
        Ok(config)
    }
}
