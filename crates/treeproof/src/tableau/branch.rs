//! Branches: node lists over the tree's arena plus their pending tasks

use super::node::{Node, NodeId};
use super::rules::{Rule, Task, TaskTarget};
use crate::logic::{Formula, Substitution, SymbolId, Term};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BranchId(pub(crate) u32);

impl BranchId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchStatus {
    Open,
    Closed,
    /// Pruned because another branch's closure covers it
    Removed,
}

#[derive(Debug, Clone)]
pub struct Branch {
    pub(crate) id: BranchId,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) literals: Vec<NodeId>,
    literal_index: HashMap<Formula, NodeId>,
    /// Pending tasks sorted by `(priority, seq)`
    pub(crate) todo: Vec<Task>,
    pub(crate) free_variables: Vec<SymbolId>,
    /// Worlds mentioned in accessibility literals, in order of appearance
    pub(crate) worlds: IndexSet<Term>,
    /// Modal gamma nodes already instantiated at a world
    pub(crate) modal_instances: HashSet<(NodeId, Term)>,
    pub(crate) status: BranchStatus,
    /// Nodes that closed the branch, or that will close it once the current expansion ends
    pub(crate) closed_by: Option<Vec<NodeId>>,
}

impl Branch {
    pub(crate) fn new(id: BranchId) -> Self {
        Branch {
            id,
            nodes: Vec::new(),
            literals: Vec::new(),
            literal_index: HashMap::new(),
            todo: Vec::new(),
            free_variables: Vec::new(),
            worlds: IndexSet::new(),
            modal_instances: HashSet::new(),
            status: BranchStatus::Open,
            closed_by: None,
        }
    }

    /// Copy for the other side of a beta expansion
    pub(crate) fn fork(&self, id: BranchId) -> Branch {
        let mut copy = self.clone();
        copy.id = id;
        copy
    }

    pub fn id(&self) -> BranchId {
        self.id
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn literals(&self) -> &[NodeId] {
        &self.literals
    }

    pub fn status(&self) -> BranchStatus {
        self.status
    }

    pub fn closed_by(&self) -> Option<&[NodeId]> {
        self.closed_by.as_deref()
    }

    pub fn free_variables(&self) -> &[SymbolId] {
        &self.free_variables
    }

    pub fn pending_tasks(&self) -> &[Task] {
        &self.todo
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub(crate) fn has_literal(&self, formula: &Formula) -> bool {
        self.literal_index.contains_key(formula)
    }

    pub(crate) fn literal_node(&self, formula: &Formula) -> Option<NodeId> {
        self.literal_index.get(formula).copied()
    }

    pub(crate) fn add_literal(&mut self, id: NodeId, formula: Formula) {
        self.literals.push(id);
        self.literal_index.entry(formula).or_insert(id);
    }

    /// Insert keeping the queue sorted; equal keys keep insertion order
    pub(crate) fn push_task(&mut self, task: Task) {
        let key = task.sort_key();
        let at = self.todo.partition_point(|t| t.sort_key() <= key);
        self.todo.insert(at, task);
    }

    pub(crate) fn has_task(&self, rule: Rule, target: &TaskTarget) -> bool {
        self.todo.iter().any(|t| t.rule == rule && t.target == *target)
    }

    pub(crate) fn pop_task(&mut self) -> Option<Task> {
        if self.todo.is_empty() {
            None
        } else {
            Some(self.todo.remove(0))
        }
    }

    /// Worlds `x` with `ℛ(world, x)` on the branch, with the literal's node
    pub(crate) fn successors(&self, arena: &[Node], world: &Term) -> Vec<(NodeId, Term)> {
        self.literals
            .iter()
            .filter_map(|&id| {
                let (from, to) = arena[id.index()].formula.accessibility_pair()?;
                (from == world).then(|| (id, to.clone()))
            })
            .collect()
    }

    /// Worlds `x` with `ℛ(x, world)` on the branch, with the literal's node
    pub(crate) fn predecessors(&self, arena: &[Node], world: &Term) -> Vec<(NodeId, Term)> {
        self.literals
            .iter()
            .filter_map(|&id| {
                let (from, to) = arena[id.index()].formula.accessibility_pair()?;
                (to == world).then(|| (id, from.clone()))
            })
            .collect()
    }

    /// Complementary pair, or a literal `¬(t=t)`, involving `id`
    pub(crate) fn find_complement(&self, id: NodeId, formula: &Formula) -> Option<Vec<NodeId>> {
        if let Some((s, t)) = formula.disequation() {
            if s == t {
                return Some(vec![id]);
            }
        }
        self.literal_node(&formula.negate())
            .filter(|&other| other != id)
            .map(|other| vec![other, id])
    }

    /// Re-key the literal index and world bookkeeping after node formulas changed
    pub(crate) fn apply_substitution(&mut self, arena: &[Node], subst: &Substitution) {
        self.literal_index.clear();
        for &id in &self.literals {
            self.literal_index
                .entry(arena[id.index()].formula.clone())
                .or_insert(id);
        }
        self.free_variables.retain(|v| subst.get(*v).is_none());
        self.worlds = self.worlds.iter().map(|w| subst.apply(w)).collect();
        self.modal_instances = self
            .modal_instances
            .iter()
            .map(|(n, w)| (*n, subst.apply(w)))
            .collect();
        for task in &mut self.todo {
            if let TaskTarget::World(w) = &task.target {
                task.target = TaskTarget::World(subst.apply(w));
            }
        }
    }

    /// Any complementary pair among the literals, or a literal `¬(t=t)`
    pub(crate) fn find_any_complement(&self, arena: &[Node]) -> Option<Vec<NodeId>> {
        self.literals
            .iter()
            .find_map(|&id| self.find_complement(id, &arena[id.index()].formula))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(priority: u8, seq: u64) -> Task {
        Task {
            rule: Rule::Alpha,
            target: TaskTarget::Node(NodeId(seq as u32)),
            priority,
            gamma_origin: None,
            seq,
        }
    }

    #[test]
    fn tasks_pop_by_priority_then_insertion() {
        let mut branch = Branch::new(BranchId(0));
        branch.push_task(task(5, 0));
        branch.push_task(task(1, 1));
        branch.push_task(task(5, 2));
        branch.push_task(task(0, 3));

        let order: Vec<u64> = std::iter::from_fn(|| branch.pop_task())
            .map(|t| t.seq)
            .collect();
        assert_eq!(order, vec![3, 1, 0, 2]);
    }

    #[test]
    fn forked_branch_shares_nodes() {
        let mut branch = Branch::new(BranchId(0));
        branch.nodes.push(NodeId(0));
        branch.push_task(task(1, 0));
        let fork = branch.fork(BranchId(1));
        assert_eq!(fork.nodes(), branch.nodes());
        assert_eq!(fork.pending_tasks().len(), 1);
        assert_ne!(fork.id(), branch.id());
    }
}
