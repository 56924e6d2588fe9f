//! Tableau nodes

use super::branch::BranchId;
use super::rules::Rule;
use crate::logic::Formula;
use serde::Serialize;
use std::collections::BTreeSet;

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub formula: Formula,
    pub rule: Rule,
    /// Nodes the rule was applied to
    pub from_nodes: Vec<NodeId>,
    /// Tree step at which the node was added
    pub step: usize,
    /// Branches whose closure depends on this node
    pub used: BTreeSet<BranchId>,
}

impl Node {
    pub fn is_used(&self) -> bool {
        !self.used.is_empty()
    }
}
