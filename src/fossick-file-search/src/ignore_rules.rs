//! Gitignore-style rule sets and the hierarchical matcher built on them.
//!
//! A rule set is an ordered, immutable sequence of rules with standard
//! ignore-file precedence: the last matching rule wins, and a negated rule
//! un-ignores a path an earlier rule excluded. Rule sets are serializable
//! so a crawl request can carry them across the worker boundary unchanged.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One parsed ignore rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    /// The pattern text, without negation marker or trailing slash.
    pub pattern: String,

    /// True when the rule un-ignores matching paths (`!pattern`).
    pub negated: bool,

    /// True when the pattern is anchored to the rule file's directory
    /// (contains a non-trailing slash).
    pub anchored: bool,

    /// True when the rule only matches directories (`pattern/`).
    pub dir_only: bool,
}

impl IgnoreRule {
    /// Renders the rule back into ignore-file line syntax.
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        if self.negated {
            line.push('!');
        }
        line.push_str(&self.pattern);
        if self.dir_only {
            line.push('/');
        }
        line
    }
}

/// An ordered, immutable sequence of ignore rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRuleSet {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRuleSet {
    /// Parses ignore-file source text into a rule set.
    ///
    /// Blank lines and comments are skipped. Fails with
    /// [`Error::MalformedRule`] only on structurally invalid patterns,
    /// never on semantically unusual but syntactically valid ones.
    pub fn parse(source: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for raw in source.lines() {
            let line = raw.trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let (negated, rest) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let (dir_only, pattern) = match rest.strip_suffix('/') {
                Some(rest) => (true, rest),
                None => (false, rest),
            };
            if pattern.is_empty() {
                continue;
            }

            // A slash anywhere but the (already stripped) end anchors the
            // pattern to the rule file's directory.
            let anchored = pattern.contains('/');

            // Validate structure eagerly so a malformed rule fails at parse
            // time rather than deep inside a crawl.
            let mut probe = GitignoreBuilder::new("");
            probe
                .add_line(None, line)
                .map_err(|e| Error::malformed_rule(line, e.to_string()))?;

            rules.push(IgnoreRule {
                pattern: pattern.to_string(),
                negated,
                anchored,
                dir_only,
            });
        }
        Ok(Self { rules })
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Returns whether the set contains no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Encodes the rule set for transfer across a worker boundary.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a rule set previously encoded with [`Self::to_json`].
    pub fn from_json(encoded: &str) -> Result<Self> {
        Ok(serde_json::from_str(encoded)?)
    }
}

/// A compiled rule set that answers ignore queries for paths under an
/// anchor directory.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: IgnoreRuleSet,
    compiled: Gitignore,
}

impl IgnoreMatcher {
    /// Compiles a rule set anchored at the directory its rules are relative
    /// to.
    pub fn compile(rules: IgnoreRuleSet, anchor: &Path) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(anchor);
        for rule in rules.rules() {
            let line = rule.to_line();
            builder
                .add_line(None, &line)
                .map_err(|e| Error::malformed_rule(line, e.to_string()))?;
        }
        let compiled = builder
            .build()
            .map_err(|e| Error::malformed_rule("<rule set>", e.to_string()))?;
        Ok(Self { rules, compiled })
    }

    /// Returns the rule set this matcher was compiled from.
    pub fn rules(&self) -> &IgnoreRuleSet {
        &self.rules
    }

    /// Evaluates the rules in order against a path; the last matching rule
    /// wins. Directory-only rules match only when `is_dir` is true.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.decide(path, is_dir).unwrap_or(false)
    }

    /// Like [`Self::is_ignored`], but distinguishes "whitelisted" from "no
    /// rule matched" so matchers can be stacked hierarchically.
    pub fn decide(&self, path: &Path, is_dir: bool) -> Option<bool> {
        match self.compiled.matched(path, is_dir) {
            ignore::Match::Ignore(_) => Some(true),
            ignore::Match::Whitelist(_) => Some(false),
            ignore::Match::None => None,
        }
    }
}

/// Stack of matchers gathered while descending a tree: the rule set handed
/// in with the crawl request at the bottom, nested ignore files above it.
/// The deepest matcher with an opinion wins.
#[derive(Debug, Default)]
pub(crate) struct IgnoreStack {
    layers: Vec<Layer>,
}

#[derive(Debug)]
struct Layer {
    dir_depth: usize,
    matcher: IgnoreMatcher,
}

impl IgnoreStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pushes a matcher discovered in a directory at the given walk depth.
    pub(crate) fn push(&mut self, matcher: IgnoreMatcher, dir_depth: usize) {
        self.layers.push(Layer { dir_depth, matcher });
    }

    /// Drops layers whose directory is not an ancestor of an entry at the
    /// given depth. Relies on depth-first visit order.
    pub(crate) fn pop_to(&mut self, entry_depth: usize) {
        while self
            .layers
            .last()
            .is_some_and(|layer| layer.dir_depth >= entry_depth)
        {
            self.layers.pop();
        }
    }

    pub(crate) fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        for layer in self.layers.iter().rev() {
            if let Some(decision) = layer.matcher.decide(path, is_dir) {
                return decision;
            }
        }
        false
    }
}
