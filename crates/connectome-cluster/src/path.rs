//! Branch-decision paths identifying tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sequence of binary branch decisions from the root (`0` = first child).
///
/// The root is the empty path. Displayed as digits joined by `-`
/// (`"0-1-1"`), with the root shown as `root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchPath(Vec<u8>);

impl BranchPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_digits(digits: Vec<u8>) -> Self {
        Self(digits)
    }

    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of child `branch` of this node.
    pub fn child(&self, branch: u8) -> Self {
        let mut digits = Vec::with_capacity(self.0.len() + 1);
        digits.extend_from_slice(&self.0);
        digits.push(branch);
        Self(digits)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// First `depth` decisions; the whole path if it is shallower.
    pub fn prefix(&self, depth: usize) -> Self {
        Self(self.0[..depth.min(self.0.len())].to_vec())
    }

    pub fn starts_with(&self, other: &BranchPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for BranchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("root");
        }
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Per-depth label columns for a set of leaf labels.
///
/// Column `d - 1` holds every label truncated to depth `d`, for
/// `d in 1..=depth`. Labels shallower than `d` keep their full path, so a
/// leaf that stopped splitting early repeats across the deeper columns.
pub fn level_labels(labels: &[BranchPath], depth: usize) -> Vec<Vec<BranchPath>> {
    (1..=depth)
        .map(|d| labels.iter().map(|l| l.prefix(d)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(d: &[u8]) -> BranchPath {
        BranchPath::from_digits(d.to_vec())
    }

    #[test]
    fn display_joins_digits() {
        assert_eq!(BranchPath::root().to_string(), "root");
        assert_eq!(p(&[0]).to_string(), "0");
        assert_eq!(p(&[0, 1, 1]).to_string(), "0-1-1");
    }

    #[test]
    fn child_parent_prefix() {
        let c = BranchPath::root().child(1).child(0);
        assert_eq!(c, p(&[1, 0]));
        assert_eq!(c.depth(), 2);
        assert_eq!(c.parent(), Some(p(&[1])));
        assert_eq!(BranchPath::root().parent(), None);
        assert_eq!(c.prefix(1), p(&[1]));
        assert_eq!(c.prefix(5), c);
        assert!(c.starts_with(&p(&[1])));
        assert!(!c.starts_with(&p(&[0])));
    }

    #[test]
    fn level_columns_keep_shallow_leaves() {
        let labels = vec![p(&[0]), p(&[1, 0]), p(&[1, 1])];
        let cols = level_labels(&labels, 2);

        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], vec![p(&[0]), p(&[1]), p(&[1])]);
        assert_eq!(cols[1], vec![p(&[0]), p(&[1, 0]), p(&[1, 1])]);
    }
}
