//! Free-variable tableau trees
//!
//! A `Tree` owns an arena of nodes. Branches are lists of node ids into the
//! arena, so forking a branch copies the id list and the task queue but
//! shares the nodes above the split. Copying a whole tree (to keep an
//! alternative closing substitution around) clones the arena; formulas are
//! reference counted and are not duplicated.
//!
//! Each step pops the highest-priority task of the leftmost open branch and
//! applies it. Literal tasks look for substitutions that close the branch.
//! A closure under the empty substitution is applied in place; otherwise
//! the step returns one copy of the tree per closing substitution and the
//! unchanged tree stays available as the alternative where none was chosen.

use super::branch::{Branch, BranchId, BranchStatus};
use super::node::{Node, NodeId};
use super::rules::{Rule, Task, TaskTarget, PRIORITY_REPEAT};
use crate::config::ProverConfig;
use crate::equality::{EqualityProblem, EqualityReasoner};
use crate::error::{ProverError, Result};
use crate::logic::{
    unify, unify_lists, AccessibilityProperty, Formula, Signature, Sort, Substitution, Term,
    UnificationResult,
};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// A substitution under which the listed nodes close the current branch
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureOption {
    pub substitution: Substitution,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug)]
pub enum StepOutcome {
    Expanded,
    /// Copies of the tree in which the current branch was closed under a
    /// non-empty substitution
    Alternatives(Vec<Tree>),
    /// No open branches remain
    Closed,
    /// The current branch has no pending tasks
    Saturated,
}

#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) open: Vec<Branch>,
    closed: Vec<Branch>,
    removed: Vec<Branch>,
    pub(crate) accessibility: Vec<AccessibilityProperty>,
    pub(crate) priority: usize,
    pub(crate) step: usize,
    next_branch: u32,
    next_seq: u64,
}

impl Tree {
    /// A single branch holding `formulas`.
    ///
    /// `initial_world` is the world the formulas are evaluated at when the
    /// input is modal; accessibility tasks for it are queued immediately.
    pub fn new(
        formulas: &[Formula],
        accessibility: &[AccessibilityProperty],
        initial_world: Option<Term>,
    ) -> Result<Tree> {
        let mut tree = Tree {
            nodes: Vec::new(),
            open: Vec::new(),
            closed: Vec::new(),
            removed: Vec::new(),
            accessibility: accessibility.to_vec(),
            priority: 0,
            step: 0,
            next_branch: 0,
            next_seq: 0,
        };
        let id = tree.fresh_branch_id();
        tree.open.push(Branch::new(id));
        if let Some(world) = initial_world {
            tree.register_world(0, world);
        }
        for formula in formulas {
            tree.add_node(0, formula.clone(), Rule::Initial, Vec::new(), None);
        }
        tree.settle()?;
        Ok(tree)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn open_branches(&self) -> &[Branch] {
        &self.open
    }

    pub fn closed_branches(&self) -> &[Branch] {
        &self.closed
    }

    pub fn removed_branches(&self) -> &[Branch] {
        &self.removed
    }

    /// The leftmost open branch, which the next step works on
    pub fn current_branch(&self) -> Option<&Branch> {
        self.open.first()
    }

    pub fn is_closed(&self) -> bool {
        self.open.is_empty()
    }

    /// Search depth score: free variables introduced plus branches closed by substitutions
    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn steps(&self) -> usize {
        self.step
    }

    /// Formula sequences of the open branches
    pub fn open_sequences(&self) -> Vec<Vec<&Formula>> {
        self.open
            .iter()
            .map(|b| b.nodes.iter().map(|id| &self.nodes[id.index()].formula).collect())
            .collect()
    }

    // =========================================================================
    // Building
    // =========================================================================

    fn fresh_branch_id(&mut self) -> BranchId {
        let id = BranchId(self.next_branch);
        self.next_branch += 1;
        id
    }

    pub(crate) fn uses(&self, property: AccessibilityProperty) -> bool {
        !self
            .accessibility
            .contains(&AccessibilityProperty::Universality)
            && self.accessibility.contains(&property)
    }

    pub(crate) fn enqueue(
        &mut self,
        branch: usize,
        rule: Rule,
        target: TaskTarget,
        priority: u8,
        gamma_origin: Option<NodeId>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.open[branch].push_task(Task {
            rule,
            target,
            priority,
            gamma_origin,
            seq,
        });
    }

    /// Add a node to an open branch and queue its expansion.
    ///
    /// Returns `None` without adding anything when the branch is about to
    /// close or already holds the literal.
    pub(crate) fn add_node(
        &mut self,
        branch: usize,
        formula: Formula,
        rule: Rule,
        from_nodes: Vec<NodeId>,
        gamma_origin: Option<NodeId>,
    ) -> Option<NodeId> {
        let target = &self.open[branch];
        if target.closed_by.is_some() || (formula.is_literal() && target.has_literal(&formula)) {
            return None;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            formula: formula.clone(),
            rule,
            from_nodes,
            step: self.step,
            used: BTreeSet::new(),
        });
        self.open[branch].nodes.push(id);

        let (task_rule, priority) = Rule::for_formula(&formula);
        self.enqueue(branch, task_rule, TaskTarget::Node(id), priority, gamma_origin);
        if task_rule == Rule::ModalGamma {
            self.note_modal_gamma(branch, &formula);
        }

        if formula.is_literal() {
            self.open[branch].add_literal(id, formula.clone());
            if let Some((from, to)) = formula.accessibility_pair() {
                self.on_accessibility(branch, id, from.clone(), to.clone());
            }
            if let Some(nodes) = self.open[branch].find_complement(id, &formula) {
                self.open[branch].closed_by = Some(nodes);
            }
        }
        Some(id)
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    pub fn step(&mut self, signature: &mut Signature, config: &ProverConfig) -> Result<StepOutcome> {
        if self.open.is_empty() {
            return Ok(StepOutcome::Closed);
        }
        let task = match self.open[0].pop_task() {
            Some(task) => task,
            None => return Ok(StepOutcome::Saturated),
        };
        self.step += 1;
        trace!(
            step = self.step,
            rule = %task.rule,
            target = ?task.target,
            branch = self.open[0].id.as_u32(),
            "task"
        );

        let branches_before = self.open.len();
        let mut options = Vec::new();
        match task.rule {
            Rule::Literal => {
                if let Some(n) = task.node() {
                    options = self.closure_options(n, signature, config);
                    if let Some(direct) = options.iter().find(|o| o.substitution.is_empty()) {
                        self.open[0].closed_by = Some(direct.nodes.clone());
                        options.clear();
                    }
                }
            }
            Rule::Alpha => self.expand_alpha(&task),
            Rule::Beta => self.expand_beta(&task),
            Rule::Gamma => self.expand_gamma(&task, signature),
            Rule::Delta => self.expand_delta(&task, signature),
            Rule::ModalGamma => self.expand_modal_gamma(&task),
            Rule::ModalDelta => self.expand_modal_delta(&task, signature),
            Rule::Reflexivity
            | Rule::Symmetry
            | Rule::Transitivity
            | Rule::Euclidity
            | Rule::Seriality => self.expand_accessibility(&task, signature),
            Rule::Initial => {}
        }

        // The instance of a gamma formula has been expanded: the formula may be instantiated again
        if task.rule != Rule::Gamma {
            if let Some(origin) = task.gamma_origin {
                let affected = 1 + self.open.len() - branches_before;
                for b in 0..affected {
                    if self.open[b].closed_by.is_none() {
                        self.enqueue(b, Rule::Gamma, TaskTarget::Node(origin), PRIORITY_REPEAT, None);
                    }
                }
            }
        }

        self.settle()?;

        if !options.is_empty() {
            let mut alternatives = Vec::with_capacity(options.len());
            for option in options {
                let mut alternative = self.clone();
                alternative.close_with(option)?;
                alternatives.push(alternative);
            }
            return Ok(StepOutcome::Alternatives(alternatives));
        }
        if self.open.is_empty() {
            Ok(StepOutcome::Closed)
        } else {
            Ok(StepOutcome::Expanded)
        }
    }

    fn expand_alpha(&mut self, task: &Task) {
        let Some(n) = task.node() else { return };
        let formula = self.nodes[n.index()].formula.clone();
        for component in formula.alpha_components() {
            self.add_node(0, component, Rule::Alpha, vec![n], None);
        }
    }

    /// The component with fewer connectives stays on the current branch
    fn expand_beta(&mut self, task: &Task) {
        let Some(n) = task.node() else { return };
        let formula = self.nodes[n.index()].formula.clone();
        let Some([first, second]) = formula.beta_components() else {
            return;
        };
        let cost = |fs: &[Formula]| fs.iter().map(Formula::connectives).sum::<usize>();
        let (here, there) = if cost(&second) < cost(&first) {
            (second, first)
        } else {
            (first, second)
        };
        let id = self.fresh_branch_id();
        let fork = self.open[0].fork(id);
        self.open.insert(1, fork);
        for component in here {
            self.add_node(0, component, Rule::Beta, vec![n], None);
        }
        for component in there {
            self.add_node(1, component, Rule::Beta, vec![n], None);
        }
    }

    fn expand_gamma(&mut self, task: &Task, signature: &mut Signature) {
        let Some(n) = task.node() else { return };
        let formula = self.nodes[n.index()].formula.clone();
        let Some(parts) = formula.quantifier_parts() else {
            return;
        };
        let var = signature.fresh_free_variable(parts.sort);
        let instance = parts
            .body
            .substitute(&Term::Var(parts.variable), &Term::Free(var), false);
        self.open[0].free_variables.push(var);
        self.priority += 1;
        let origin = task.gamma_origin.or(Some(n));
        self.add_node(0, instance, Rule::Gamma, vec![n], origin);
    }

    /// Skolem term over the branch's free variables
    fn expand_delta(&mut self, task: &Task, signature: &mut Signature) {
        let Some(n) = task.node() else { return };
        let formula = self.nodes[n.index()].formula.clone();
        let Some(parts) = formula.quantifier_parts() else {
            return;
        };
        let witness = self.skolem_term(signature, parts.sort);
        let instance = parts
            .body
            .substitute(&Term::Var(parts.variable), &witness, false);
        self.add_node(0, instance, Rule::Delta, vec![n], None);
    }

    pub(crate) fn skolem_term(&self, signature: &mut Signature, sort: Sort) -> Term {
        let args: Vec<Term> = self.open[0]
            .free_variables
            .iter()
            .map(|v| Term::Free(*v))
            .collect();
        let symbol = signature.fresh_skolem(args.len(), sort);
        Term::app(symbol, args)
    }

    // =========================================================================
    // Closing
    // =========================================================================

    /// Ways to close the current branch with literal `n`, at most
    /// `max_closure_options` of them, without duplicate substitutions
    pub fn closure_options(
        &self,
        n: NodeId,
        signature: &Signature,
        config: &ProverConfig,
    ) -> Vec<ClosureOption> {
        let limit = config.max_closure_options.max(1);
        let branch = &self.open[0];
        let formula = &self.nodes[n.index()].formula;
        let mut options = Vec::new();

        if let Some((s, t)) = formula.disequation() {
            if let Ok(sigma) = unify(s, t) {
                offer(&mut options, limit, sigma, vec![n]);
            }
        }
        for &m in &branch.literals {
            if m == n {
                continue;
            }
            let other = &self.nodes[m.index()].formula;
            if let Ok(sigma) = formula.unify_complementary(other) {
                offer(&mut options, limit, sigma, vec![m, n]);
            }
            if let Some(Ok(sigma)) = swapped_identity(formula, other) {
                offer(&mut options, limit, sigma, vec![m, n]);
            }
        }

        let equations: Vec<(NodeId, (Term, Term))> = branch
            .literals
            .iter()
            .filter_map(|&m| {
                let (s, t) = self.nodes[m.index()].formula.equation()?;
                Some((m, (s.clone(), t.clone())))
            })
            .collect();
        if equations.is_empty() || options.len() >= limit {
            return options;
        }

        let (equation_nodes, equation_terms): (Vec<NodeId>, Vec<(Term, Term)>) =
            equations.into_iter().unzip();
        let reasoner = EqualityReasoner::new(signature, config.equality_max_problems);
        for (goal_nodes, terms1, terms2) in self.equality_goals(n, formula) {
            if options.len() >= limit {
                break;
            }
            trace!(goal = ?goal_nodes, equations = equation_terms.len(), "equality reasoner");
            let problem = EqualityProblem::new(equation_terms.clone(), terms1, terms2);
            if let Some(solution) = reasoner.solve(problem) {
                for sigma in solution.constraint.substitutions() {
                    let mut nodes = goal_nodes.clone();
                    nodes.extend(equation_nodes.iter().filter(|e| !goal_nodes.contains(e)));
                    offer(&mut options, limit, sigma.clone(), nodes);
                }
            }
        }
        options
    }

    /// Goals for the equality reasoner raised by literal `n`.
    ///
    /// A disequation is a goal of its own. A new equation may help with
    /// every goal already on the branch. Any other literal pairs with its
    /// potential complements.
    fn equality_goals(&self, n: NodeId, formula: &Formula) -> Vec<(Vec<NodeId>, Vec<Term>, Vec<Term>)> {
        let branch = &self.open[0];
        let mut goals = Vec::new();
        if let Some((s, t)) = formula.disequation() {
            goals.push((vec![n], vec![s.clone()], vec![t.clone()]));
            return goals;
        }
        if formula.equation().is_some() {
            for &m in &branch.literals {
                if let Some((s, t)) = self.nodes[m.index()].formula.disequation() {
                    goals.push((vec![m], vec![s.clone()], vec![t.clone()]));
                }
            }
            for (i, &m1) in branch.literals.iter().enumerate() {
                for &m2 in &branch.literals[i + 1..] {
                    let pair = complementary_arguments(
                        &self.nodes[m1.index()].formula,
                        &self.nodes[m2.index()].formula,
                    );
                    if let Some((a, b)) = pair {
                        goals.push((vec![m1, m2], a, b));
                    }
                }
            }
            return goals;
        }
        for &m in &branch.literals {
            if m == n {
                continue;
            }
            if let Some((a, b)) = complementary_arguments(formula, &self.nodes[m.index()].formula) {
                goals.push((vec![m, n], a, b));
            }
        }
        goals
    }

    /// Apply a closing option to this tree: instantiate, close the current
    /// branch and every branch the substitution closes as well
    pub fn close_with(&mut self, option: ClosureOption) -> Result<()> {
        self.apply_substitution(&option.substitution);
        self.close_branch(0, option.nodes)?;
        let closed = 1 + self.close_closable_branches()?;
        self.priority += closed;
        debug!(
            closed,
            bindings = option.substitution.len(),
            priority = self.priority,
            "closed under substitution"
        );
        Ok(())
    }

    pub(crate) fn apply_substitution(&mut self, subst: &Substitution) {
        if subst.is_empty() {
            return;
        }
        for node in &mut self.nodes {
            node.formula = node.formula.apply(subst);
        }
        for branch in self
            .open
            .iter_mut()
            .chain(self.closed.iter_mut())
            .chain(self.removed.iter_mut())
        {
            branch.apply_substitution(&self.nodes, subst);
        }
    }

    /// Close the open branches marked during the last expansion
    fn settle(&mut self) -> Result<()> {
        while let Some(index) = self.open.iter().position(|b| b.closed_by.is_some()) {
            let nodes = self.open[index].closed_by.take().unwrap_or_default();
            self.close_branch(index, nodes)?;
        }
        Ok(())
    }

    fn close_closable_branches(&mut self) -> Result<usize> {
        let mut count = 0;
        loop {
            let found = self
                .open
                .iter()
                .enumerate()
                .find_map(|(i, b)| b.find_any_complement(&self.nodes).map(|nodes| (i, nodes)));
            match found {
                Some((index, nodes)) => {
                    self.close_branch(index, nodes)?;
                    count += 1;
                }
                None => return Ok(count),
            }
        }
    }

    pub(crate) fn close_branch(&mut self, index: usize, nodes: Vec<NodeId>) -> Result<()> {
        let branch = &self.open[index];
        if let Some(missing) = nodes
            .iter()
            .find(|n| n.index() >= self.nodes.len() || !branch.contains(**n))
        {
            return Err(ProverError::Invariant(format!(
                "closing node {} is not on branch {}",
                missing.as_u32(),
                branch.id.as_u32()
            )));
        }
        let mut branch = self.open.remove(index);
        self.mark_used(branch.id, &nodes)?;
        debug!(
            branch = branch.id.as_u32(),
            nodes = ?nodes.iter().map(|n| n.as_u32()).collect::<Vec<_>>(),
            "branch closed"
        );
        branch.status = BranchStatus::Closed;
        branch.closed_by = Some(nodes);
        self.prune_siblings(&branch);
        self.closed.push(branch);
        Ok(())
    }

    /// Mark the closing nodes and everything they were derived from
    fn mark_used(&mut self, branch: BranchId, nodes: &[NodeId]) -> Result<()> {
        let mut stack = nodes.to_vec();
        while let Some(id) = stack.pop() {
            let node = self.nodes.get_mut(id.index()).ok_or_else(|| {
                ProverError::Invariant(format!("provenance refers to missing node {}", id.as_u32()))
            })?;
            if node.used.insert(branch) {
                stack.extend(node.from_nodes.iter().copied());
            }
        }
        Ok(())
    }

    /// Remove the open branches on the other side of every beta split below
    /// the closing nodes: they hold the same closing nodes
    fn prune_siblings(&mut self, closed: &Branch) {
        let Some(closing) = closed.closed_by.as_deref() else {
            return;
        };
        let last = closing
            .iter()
            .filter_map(|n| closed.nodes.iter().position(|m| m == n))
            .max()
            .unwrap_or(0);
        for (k, &node) in closed.nodes.iter().enumerate().skip(last + 1) {
            if self.nodes[node.index()].rule != Rule::Beta {
                continue;
            }
            let prefix = &closed.nodes[..k];
            let mut i = 0;
            while i < self.open.len() {
                let candidate = &self.open[i];
                if candidate.nodes.starts_with(prefix) && candidate.nodes.get(k) != Some(&node) {
                    let mut sibling = self.open.remove(i);
                    debug!(
                        branch = sibling.id.as_u32(),
                        closed = closed.id.as_u32(),
                        "redundant branch removed"
                    );
                    sibling.status = BranchStatus::Removed;
                    self.removed.push(sibling);
                } else {
                    i += 1;
                }
            }
        }
    }
}

impl AsRef<Tree> for Tree {
    fn as_ref(&self) -> &Tree {
        self
    }
}

fn offer(options: &mut Vec<ClosureOption>, limit: usize, substitution: Substitution, nodes: Vec<NodeId>) {
    if options.len() < limit && !options.iter().any(|o| o.substitution == substitution) {
        options.push(ClosureOption {
            substitution,
            nodes,
        });
    }
}

/// `s=t` against `¬(t'=s')`: identity is symmetric
fn swapped_identity(a: &Formula, b: &Formula) -> Option<UnificationResult> {
    let (pa, pred_a, args_a) = a.literal_parts()?;
    let (pb, pred_b, args_b) = b.literal_parts()?;
    if pa == pb || pred_a != Signature::EQUALITY || pred_b != Signature::EQUALITY || args_b.len() != 2 {
        return None;
    }
    Some(unify_lists(args_a, &[args_b[1].clone(), args_b[0].clone()]))
}

/// Arguments of `P(s̄)` and `¬P(t̄)` for a predicate other than identity
fn complementary_arguments(a: &Formula, b: &Formula) -> Option<(Vec<Term>, Vec<Term>)> {
    let (pa, pred_a, args_a) = a.literal_parts()?;
    let (pb, pred_b, args_b) = b.literal_parts()?;
    if pa == pb || pred_a != pred_b || pred_a == Signature::EQUALITY {
        return None;
    }
    Some((args_a.to_vec(), args_b.to_vec()))
}
