//! Resource pattern templating engine.
//!
//! Repository layouts are described by small templates: `[attr]` is a
//! mandatory substitution placeholder, and `(...)` wraps a sub-expression
//! that is dropped entirely when the placeholder inside it has no value.
//! The engine runs the template in both directions: `fill` substitutes
//! attributes into the template, and `PatternMatcher` recovers attributes
//! from a concrete URL.

pub mod parse;

use dashmap::DashMap;
use gradlock_core::error::LockError;
use gradlock_core::types::Repository;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

use crate::RegistryResult;

/// The default Maven repository layout.
pub const M2_PATTERN: &str =
    "[organisation]/[module]/[revision]/[artifact]-[revision](-[classifier])(.[ext])";

/// Template attribute values keyed by attribute name.
pub type Attributes = HashMap<String, String>;

/// Matches either an `[attr]` token or an `(optional)` group. Optional
/// groups do not nest, matching the build tool's own pattern grammar.
static PART_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?P<attr>[^\]]+)\]|\((?P<optional>[^)]+)\)").unwrap());

static ATTR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Fill a template from attribute values.
///
/// Optional groups are resolved first: a group whose placeholder has a
/// blank or missing value is dropped. Remaining `[attr]` tokens are then
/// substituted. Returns `None` when any placeholder is left unresolved,
/// since a partially templated location must never be emitted.
pub fn fill(template: &str, attributes: &Attributes) -> Option<String> {
    let resolved = PART_REGEX.replace_all(template, |caps: &regex::Captures| {
        match caps.name("optional") {
            Some(optional) => {
                let content = optional.as_str();
                match ATTR_REGEX.captures(content) {
                    Some(attr_caps) => {
                        let attr = &attr_caps[1];
                        match attributes.get(attr).filter(|v| !v.trim().is_empty()) {
                            Some(value) => content.replace(&format!("[{attr}]"), value),
                            None => String::new(),
                        }
                    }
                    None => String::new(),
                }
            }
            None => caps[0].to_string(),
        }
    });

    let mut location = resolved.into_owned();
    for (attr, value) in attributes {
        location = location.replace(&format!("[{attr}]"), value);
    }

    if location.contains('[') || location.contains(']') {
        None
    } else {
        Some(location)
    }
}

/// Substitute known attributes into a template, leaving unknown tokens and
/// unaffected optional groups intact. The result is still a template; this
/// is the inverse-direction helper used when a matched URL narrows a
/// pattern down to one component.
pub fn substitute(template: &str, attributes: &Attributes) -> String {
    PART_REGEX
        .replace_all(template, |caps: &regex::Captures| {
            if let Some(optional) = caps.name("optional") {
                let replaced = substitute(optional.as_str(), attributes);
                if replaced != optional.as_str() {
                    replaced
                } else {
                    caps[0].to_string()
                }
            } else if let Some(attr) = caps.name("attr") {
                attributes
                    .get(attr.as_str())
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// A compiled matcher recovering template attributes from a concrete URL.
#[derive(Debug)]
pub struct PatternMatcher {
    regex: Regex,
    /// Capture group name to attribute name. An attribute appearing more
    /// than once in the template gets one group per occurrence; `matches`
    /// requires all occurrences to agree, which is the backreference
    /// semantics of the original matcher expressed without backreferences.
    groups: Vec<(String, String)>,
}

impl PatternMatcher {
    /// Compile a matcher for a generic (Ivy-style) pattern.
    pub fn compile(pattern: &str) -> RegistryResult<Self> {
        let mut source = String::from("^");
        let mut groups = Vec::new();
        append_pattern(&mut source, pattern, false, &mut groups);
        source.push('$');
        Self::build(pattern, source, groups)
    }

    /// Compile a matcher for the default Maven layout.
    ///
    /// Maven allows arbitrary artifact/classifier/extension combinations
    /// within the version directory, so the trailing filename segment is
    /// matched as an unconstrained tail and the organisation may span
    /// multiple path segments.
    pub fn compile_maven(pattern: &str) -> RegistryResult<Self> {
        let directory = match pattern.rfind('/') {
            Some(i) => &pattern[..=i],
            None => pattern,
        };
        let mut source = String::from("^");
        let mut groups = Vec::new();
        append_pattern(&mut source, directory, true, &mut groups);
        source.push_str("[^/]+$");
        Self::build(pattern, source, groups)
    }

    fn build(
        pattern: &str,
        source: String,
        groups: Vec<(String, String)>,
    ) -> RegistryResult<Self> {
        let regex = Regex::new(&source).map_err(|e| LockError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { regex, groups })
    }

    /// Match a URL, returning the recovered attributes, or `None` when the
    /// URL does not fit the pattern or repeat occurrences of an attribute
    /// disagree.
    pub fn matches(&self, url: &str) -> Option<Attributes> {
        let caps = self.regex.captures(url)?;
        let mut attributes = Attributes::new();
        for (group, attr) in &self.groups {
            if let Some(m) = caps.name(group) {
                match attributes.get(attr.as_str()) {
                    Some(existing) if existing != m.as_str() => return None,
                    Some(_) => {}
                    None => {
                        attributes.insert(attr.clone(), m.as_str().to_string());
                    }
                }
            }
        }
        Some(attributes)
    }
}

/// Translate a template into regex source, one synthetic capture group per
/// `[attr]` occurrence.
fn append_pattern(
    out: &mut String,
    input: &str,
    maven_organisation: bool,
    groups: &mut Vec<(String, String)>,
) {
    let mut literal_start = 0;
    for caps in PART_REGEX.captures_iter(input) {
        let m = caps.get(0).unwrap();
        let literal = &input[literal_start..m.start()];
        if !literal.is_empty() {
            out.push_str(&regex::escape(literal));
        }
        literal_start = m.end();

        if let Some(optional) = caps.name("optional") {
            out.push_str("(?:");
            append_pattern(out, optional.as_str(), maven_organisation, groups);
            out.push_str(")?");
        } else if let Some(attr) = caps.name("attr") {
            let attr = attr.as_str();
            let group = format!("a{}", groups.len());
            let capture = if maven_organisation && attr == "organisation" {
                ".+"
            } else {
                "[^/]+"
            };
            let _ = write!(out, "(?P<{group}>{capture})");
            groups.push((group, attr.to_string()));
        }
    }
    let tail = &input[literal_start..];
    if !tail.is_empty() {
        out.push_str(&regex::escape(tail));
    }
}

/// Memoizing compilation cache for pattern matchers, owned by a merge run
/// and shared read-mostly across fetch workers.
#[derive(Debug, Default)]
pub struct MatcherCache {
    inner: DashMap<String, Arc<PatternMatcher>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled matcher for a pattern, choosing the Maven variant for
    /// patterns that end in the default Maven layout. Returns `None` (with
    /// a warning) for a pattern that fails to compile.
    pub fn matcher(&self, pattern: &str) -> Option<Arc<PatternMatcher>> {
        if let Some(matcher) = self.inner.get(pattern) {
            return Some(matcher.clone());
        }
        let compiled = if pattern.ends_with(M2_PATTERN) {
            PatternMatcher::compile_maven(pattern)
        } else {
            PatternMatcher::compile(pattern)
        };
        match compiled {
            Ok(matcher) => {
                let matcher = Arc::new(matcher);
                self.inner.insert(pattern.to_string(), matcher.clone());
                Some(matcher)
            }
            Err(e) => {
                warn!("{e}; pattern skipped");
                None
            }
        }
    }
}

/// Deduplicated metadata-then-artifact pattern list for a repository,
/// preserving declaration order.
pub fn repository_patterns(repository: &Repository) -> Vec<&str> {
    let mut patterns: Vec<&str> = Vec::new();
    for pattern in repository
        .metadata_resources
        .iter()
        .chain(repository.artifact_resources.iter())
    {
        if !patterns.contains(&pattern.as_str()) {
            patterns.push(pattern);
        }
    }
    patterns
}
