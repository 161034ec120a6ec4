//! Identifier types for translation units and AST nodes.
//!
//! Symbols and AST nodes refer to each other through these handles rather
//! than through owning pointers, so the symbol table and the per-unit AST
//! arenas can be borrowed independently.

use std::fmt;

/// Identifies a translation unit within a parse session.
///
/// # Example
///
/// ```
/// use cxxfront_core::UnitId;
///
/// let unit = UnitId::new(0);
/// assert_eq!(unit.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Create a new unit ID with the given index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit_{}", self.0)
    }
}

impl From<u32> for UnitId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<UnitId> for u32 {
    fn from(id: UnitId) -> Self {
        id.0
    }
}

/// Index of a node inside one unit's AST arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// A node handle qualified by the unit whose arena holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub unit: UnitId,
    pub node: NodeId,
}

impl NodeRef {
    pub const fn new(unit: UnitId, node: NodeId) -> Self {
        Self { unit, node }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.unit, self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_creation() {
        let unit = UnitId::new(42);
        assert_eq!(unit.index(), 42);
    }

    #[test]
    fn unit_id_display() {
        let unit = UnitId::new(5);
        assert_eq!(format!("{}", unit), "unit_5");
    }

    #[test]
    fn unit_id_conversions() {
        let unit: UnitId = 10.into();
        assert_eq!(unit.index(), 10);
        let raw: u32 = unit.into();
        assert_eq!(raw, 10);
    }

    #[test]
    fn node_ref_display() {
        let node = NodeRef::new(UnitId::new(1), NodeId::new(7));
        assert_eq!(node.to_string(), "unit_1/node_7");
        assert_eq!(node.node.index(), 7);
    }
}
