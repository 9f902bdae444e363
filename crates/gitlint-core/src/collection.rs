//! Ordered rule registry
//!
//! Rules are stored in registration order, which determines execution order
//! during linting. Lookup works by id or by name.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::error::RuleOptionError;
use crate::rule::{Rule, RuleClass};

/// Flags recording how a rule got registered
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleAttrs {
    pub is_contrib: bool,
    pub is_user_defined: bool,
    pub is_named: bool,
}

impl RuleAttrs {
    pub fn contrib() -> Self {
        Self {
            is_contrib: true,
            ..Self::default()
        }
    }

    pub fn user_defined() -> Self {
        Self {
            is_user_defined: true,
            ..Self::default()
        }
    }

    pub fn named() -> Self {
        Self {
            is_named: true,
            ..Self::default()
        }
    }
}

/// Insertion-ordered collection of rule instances, keyed by rule id
#[derive(Debug, Clone, Default)]
pub struct RuleCollection {
    rules: IndexMap<String, Rule>,
}

impl RuleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate `class` with `raw_options` applied and register it.
    ///
    /// Re-registering an id replaces the previous instance but keeps its
    /// position in the order.
    pub fn add_rule(
        &mut self,
        class: &RuleClass,
        raw_options: &HashMap<String, String>,
        attrs: RuleAttrs,
    ) -> Result<(), RuleOptionError> {
        let mut rule = class.instantiate(raw_options)?;
        rule.is_contrib = attrs.is_contrib;
        rule.is_user_defined = attrs.is_user_defined;
        rule.is_named = attrs.is_named;
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    /// Register multiple classes in order with shared attrs
    pub fn add_rules(
        &mut self,
        classes: &[RuleClass],
        raw_options: &HashMap<String, String>,
        attrs: RuleAttrs,
    ) -> Result<(), RuleOptionError> {
        for class in classes {
            self.add_rule(class, raw_options, attrs)?;
        }
        Ok(())
    }

    /// Register an already-instantiated rule
    pub fn add_instance(&mut self, rule: Rule) {
        self.rules.insert(rule.id.clone(), rule);
    }

    /// Look up a rule by id or by name
    pub fn find_rule(&self, id_or_name: &str) -> Option<&Rule> {
        self.rules
            .get(id_or_name)
            .or_else(|| self.rules.values().find(|r| r.name == id_or_name))
    }

    pub fn find_rule_mut(&mut self, id_or_name: &str) -> Option<&mut Rule> {
        if self.rules.contains_key(id_or_name) {
            return self.rules.get_mut(id_or_name);
        }
        self.rules.values_mut().find(|r| r.name == id_or_name)
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Remove all rules matching the predicate, preserving the relative
    /// order of the remaining rules
    pub fn delete_rules_by(&mut self, mut predicate: impl FnMut(&Rule) -> bool) {
        self.rules.retain(|_, rule| !predicate(rule));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.rules.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl PartialEq for RuleCollection {
    /// Equal when both collections hold equal rules in the same order
    fn eq(&self, other: &Self) -> bool {
        self.rules.len() == other.rules.len()
            && self
                .rules
                .values()
                .zip(other.rules.values())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for RuleCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in self.rules.values() {
            writeln!(f, "  {} {}", rule.id, rule.name)?;
        }
        Ok(())
    }
}
