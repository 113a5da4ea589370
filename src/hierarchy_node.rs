//! Slash-Delimited Hierarchy Nodes
//!
//! This module provides immutable nodes naming a position in a slash-delimited
//! namespace tree, single-level wildcard support, and ancestor-or-self matching
//! against arbitrary path strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Wildcard token used when no configuration is given
pub const DEFAULT_WILDCARD: &str = "+";

/// Settings shared by every node of one tree
///
/// Supplied once at the root and copied into each child at construction.
///
/// ```json
/// { "wildcard": "*" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Segment value matching any single segment at its level
    wildcard: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            wildcard: DEFAULT_WILDCARD.to_string(),
        }
    }
}

impl HierarchyConfig {
    /// Create a configuration with a custom wildcard token
    /// Returns error if the token is empty
    pub fn new(wildcard: &str) -> Result<Self, HierarchyError> {
        let config = Self {
            wildcard: wildcard.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(s: &str) -> Result<Self, HierarchyError> {
        let config: HierarchyConfig =
            serde_json::from_str(s).map_err(|e| HierarchyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    fn validate(&self) -> Result<(), HierarchyError> {
        if self.wildcard.is_empty() {
            return Err(HierarchyError::EmptyWildcard);
        }
        Ok(())
    }
}

/// A node in a slash-delimited hierarchy
///
/// Examples:
/// - `/` (root, level 0)
/// - `/root/domain_1/` (level 2)
/// - `/root/+/` (level 2, matches any segment at level 2)
///
/// A node owns a copy of its parent's path, never a reference to the parent,
/// and no field changes after construction.
///
/// Nodes are equal when path, level, local segment and wildcard token all
/// match. A local segment containing `/` is not round-trip safe: its path
/// parses back into more than one level.
#[derive(Clone)]
pub struct HierarchyNode {
    local_segment: String,
    parent_path: String,
    level: usize,
    full_path: String,
    segments: Vec<String>,
    config: HierarchyConfig,
}

impl HierarchyNode {
    /// Create the root node (`/`) with the default configuration
    pub fn root() -> Self {
        Self::root_with_config(HierarchyConfig::default())
    }

    /// Create the root node (`/`) carrying the given configuration down to its descendants
    pub fn root_with_config(config: HierarchyConfig) -> Self {
        Self {
            local_segment: String::new(),
            parent_path: String::new(),
            level: 0,
            full_path: "/".to_string(),
            segments: Vec::new(),
            config,
        }
    }

    /// Create a child one level below `parent`
    ///
    /// The segment is appended verbatim: `parent.get_path() + segment + "/"`.
    pub fn child(parent: &HierarchyNode, local_segment: impl Into<String>) -> Self {
        let local_segment = local_segment.into();
        if local_segment.contains('/') {
            debug!(
                parent = %parent.full_path,
                segment = %local_segment,
                "segment contains '/', path will not split back into one segment per level"
            );
        }

        let parent_path = parent.full_path.clone();
        let full_path = format!("{}{}/", parent_path, local_segment);
        let segments = Self::path_to_segments(&full_path);
        trace!(path = %full_path, level = parent.level + 1, "created hierarchy node");

        Self {
            local_segment,
            parent_path,
            level: parent.level + 1,
            full_path,
            segments,
            config: parent.config.clone(),
        }
    }

    /// Create a child from a dynamically typed segment
    ///
    /// Only JSON strings are accepted; any other kind fails with
    /// [`HierarchyError::TypeKind`] and is never coerced.
    pub fn try_child(
        parent: &HierarchyNode,
        local_segment: &Value,
    ) -> Result<Self, HierarchyError> {
        match local_segment {
            Value::String(s) => Ok(Self::child(parent, s.as_str())),
            other => Err(HierarchyError::TypeKind {
                found: json_kind(other).to_string(),
            }),
        }
    }

    /// Rebuild the node whose full path is `path`, using the default configuration
    ///
    /// The path must start and end with `/`. `"/"` yields the root.
    pub fn from_path(path: &str) -> Result<Self, HierarchyError> {
        Self::from_path_with_config(path, HierarchyConfig::default())
    }

    pub fn from_path_with_config(
        path: &str,
        config: HierarchyConfig,
    ) -> Result<Self, HierarchyError> {
        if !path.starts_with('/') || !path.ends_with('/') {
            return Err(HierarchyError::InvalidPath(path.to_string()));
        }

        let root = Self::root_with_config(config);
        Ok(Self::path_to_segments(path)
            .into_iter()
            .fold(root, |node, segment| Self::child(&node, segment)))
    }

    /// Split a path into its segments
    ///
    /// Strips exactly one leading and one trailing `/`, then splits on `/`.
    /// Only the root path `"/"` parses to `[]`; any other empty remainder
    /// is a single empty segment, so `"//"` parses to `[""]`.
    ///
    /// E.g. `"/root/domain_1/"` → `["root", "domain_1"]`
    pub fn path_to_segments(path: &str) -> Vec<String> {
        if path == "/" {
            return Vec::new();
        }
        let stripped = path.strip_prefix('/').unwrap_or(path);
        let stripped = stripped.strip_suffix('/').unwrap_or(stripped);
        stripped.split('/').map(str::to_string).collect()
    }

    /// Get the full path of this node, always starting and ending with `/`
    pub fn get_path(&self) -> &str {
        &self.full_path
    }

    /// Get the depth of this node; the root is level 0
    pub fn get_level(&self) -> usize {
        self.level
    }

    /// Get the full path of the parent, empty for the root
    pub fn get_parent_path(&self) -> &str {
        &self.parent_path
    }

    pub fn get_local_segment(&self) -> &str {
        &self.local_segment
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn wildcard(&self) -> &str {
        &self.config.wildcard
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    /// Check whether any of this node's own segments is the wildcard token
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| *s == self.config.wildcard)
    }

    /// Number of concrete (non-wildcard) segments; higher is more specific
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| **s != self.config.wildcard)
            .count()
    }

    /// Rebuild the parent node value from the stored parent path
    ///
    /// Returns `None` for the root.
    pub fn parent(&self) -> Option<HierarchyNode> {
        if self.is_root() {
            return None;
        }
        let root = Self::root_with_config(self.config.clone());
        Some(
            Self::path_to_segments(&self.parent_path)
                .into_iter()
                .fold(root, |node, segment| Self::child(&node, segment)),
        )
    }

    /// Check whether this node is an ancestor of, or equal to, `candidate_path`
    ///
    /// Check rule, with node `/root/domain_1/`:
    /// | Candidate                  | Result | Reason |
    /// |----------------------------|--------|--------|
    /// | `/root/domain_1/`          | true   | self |
    /// | `/root/domain_1/domain_2/` | true   | descendant |
    /// | `/root/domain_2/`          | false  | different branch |
    /// | `/root/`                   | false  | candidate is shallower |
    ///
    /// A wildcard segment in this node matches any single segment of the
    /// candidate at that level. Wildcards in the candidate are plain text.
    /// The root accepts every input. Malformed input never errors, it just
    /// fails to match.
    #[instrument(level = "trace", skip(self), fields(node = %self.full_path))]
    pub fn is_ancestor_or_self(&self, candidate_path: &str) -> bool {
        if self.level == 0 {
            return true;
        }

        let candidate = Self::path_to_segments(candidate_path);
        if candidate.len() < self.segments.len() {
            trace!(depth = candidate.len(), "candidate is shallower");
            return false;
        }

        for (level, segment) in self.segments.iter().enumerate() {
            if *segment == self.config.wildcard {
                continue;
            }
            let actual = &candidate[level];
            if segment != actual {
                trace!(level, expected = %segment, actual = %actual, "segment mismatch");
                return false;
            }
        }
        true
    }

    /// Same as [`is_ancestor_or_self`](Self::is_ancestor_or_self) against another node's path
    pub fn is_ancestor_or_self_of(&self, other: &HierarchyNode) -> bool {
        self.is_ancestor_or_self(&other.full_path)
    }

    pub fn to_debug_string(&self) -> String {
        format!(
            "HierarchyNode(path={}, parent_path={}, local_segment={}, level={})",
            self.full_path, self.parent_path, self.local_segment, self.level
        )
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PartialEq for HierarchyNode {
    fn eq(&self, other: &Self) -> bool {
        self.full_path == other.full_path
            && self.level == other.level
            && self.local_segment == other.local_segment
            && self.config.wildcard == other.config.wildcard
    }
}

impl Eq for HierarchyNode {}

impl Hash for HierarchyNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_path.hash(state);
        self.level.hash(state);
        self.local_segment.hash(state);
        self.config.wildcard.hash(state);
    }
}

/// Errors that can occur when constructing hierarchy nodes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HierarchyError {
    /// Local segment was given as something other than a string
    #[error("local segment must be a string, got {found}")]
    TypeKind { found: String },

    #[error("wildcard token cannot be empty")]
    EmptyWildcard,

    /// Path does not start and end with '/'
    #[error("path must start and end with '/': '{0}'")]
    InvalidPath(String),

    #[error("invalid hierarchy configuration: {0}")]
    Config(String),
}

impl FromStr for HierarchyNode {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HierarchyNode::from_path(s)
    }
}

impl fmt::Display for HierarchyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path)
    }
}

impl fmt::Debug for HierarchyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}

// Serde serialization support
impl Serialize for HierarchyNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.full_path)
    }
}

impl<'de> Deserialize<'de> for HierarchyNode {
    fn deserialize<D>(deserializer: D) -> Result<HierarchyNode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HierarchyNode::from_path(&s).map_err(serde::de::Error::custom)
    }
}

/// Node matching and selection utilities
pub struct NodeMatcher;

impl NodeMatcher {
    /// Find the most specific node that is ancestor-or-self of `candidate_path`.
    /// Ranked by concrete segment count, then by level; the first of equals wins.
    pub fn find_best_match<'a>(
        nodes: &'a [HierarchyNode],
        candidate_path: &str,
    ) -> Option<&'a HierarchyNode> {
        let mut best: Option<&HierarchyNode> = None;
        let mut best_rank = (0, 0);

        for node in nodes {
            if node.is_ancestor_or_self(candidate_path) {
                let rank = (node.specificity(), node.level);
                if best.is_none() || rank > best_rank {
                    best = Some(node);
                    best_rank = rank;
                }
            }
        }

        best
    }

    /// Find all nodes that are ancestor-or-self of `candidate_path`, most specific first
    pub fn find_all_matches<'a>(
        nodes: &'a [HierarchyNode],
        candidate_path: &str,
    ) -> Vec<&'a HierarchyNode> {
        let mut results: Vec<&HierarchyNode> = nodes
            .iter()
            .filter(|node| node.is_ancestor_or_self(candidate_path))
            .collect();

        results.sort_by_key(|node| std::cmp::Reverse((node.specificity(), node.level)));
        results
    }
}

/// Builder for creating hierarchy nodes from runtime data
///
/// ```
/// use domain_hierarchy::HierarchyBuilder;
///
/// let node = HierarchyBuilder::new()
///     .segment("root")
///     .segment("domain_1")
///     .build();
/// assert_eq!(node.get_path(), "/root/domain_1/");
/// ```
pub struct HierarchyBuilder {
    config: HierarchyConfig,
    segments: Vec<String>,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::with_config(HierarchyConfig::default())
    }

    pub fn with_config(config: HierarchyConfig) -> Self {
        Self {
            config,
            segments: Vec::new(),
        }
    }

    /// Append the next level's local segment
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a wildcard segment at the next level
    pub fn wildcard_segment(mut self) -> Self {
        let wildcard = self.config.wildcard.clone();
        self.segments.push(wildcard);
        self
    }

    /// Append a dynamically typed segment
    /// Returns error if the value is not a string
    pub fn try_segment(mut self, segment: &Value) -> Result<Self, HierarchyError> {
        match segment {
            Value::String(s) => {
                self.segments.push(s.clone());
                Ok(self)
            }
            other => Err(HierarchyError::TypeKind {
                found: json_kind(other).to_string(),
            }),
        }
    }

    /// Build the deepest node
    pub fn build(self) -> HierarchyNode {
        let root = HierarchyNode::root_with_config(self.config);
        self.segments
            .into_iter()
            .fold(root, |node, segment| HierarchyNode::child(&node, segment))
    }

    /// Build every node from the root down to the deepest, in order
    pub fn build_chain(self) -> Vec<HierarchyNode> {
        let mut chain = Vec::with_capacity(self.segments.len() + 1);
        chain.push(HierarchyNode::root_with_config(self.config));
        for segment in self.segments {
            let next = HierarchyNode::child(&chain[chain.len() - 1], segment);
            chain.push(next);
        }
        chain
    }
}
