//! Node labels.

use std::fmt;

/// Label of a circuit node, as written in the netlist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeLabel(String);

impl NodeLabel {
    /// Label of the reference node.
    pub const GROUND: &'static str = "0";

    /// Create a node label.
    pub fn new(label: impl Into<String>) -> Self {
        NodeLabel(label.into())
    }

    /// The ground node, `"0"`.
    pub fn ground() -> Self {
        NodeLabel(Self::GROUND.to_string())
    }

    /// Get the label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        self.0 == Self::GROUND
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeLabel {
    fn from(label: &str) -> Self {
        NodeLabel::new(label)
    }
}

impl From<String> for NodeLabel {
    fn from(label: String) -> Self {
        NodeLabel(label)
    }
}
