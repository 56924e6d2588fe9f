//! Modal expansions and the frame-condition rules on ℛ literals

use super::node::NodeId;
use super::rules::{Rule, Task, TaskTarget, PRIORITY_ACCESSIBILITY, PRIORITY_MODAL_GAMMA, PRIORITY_SERIALITY};
use super::tree::Tree;
use crate::logic::{AccessibilityProperty, Formula, Signature, Sort, Term};

impl Tree {
    /// Queue a seriality task for a world when the first modal gamma
    /// formula at it appears and it has no successor yet
    pub(crate) fn note_modal_gamma(&mut self, branch: usize, formula: &Formula) {
        if !self.uses(AccessibilityProperty::Seriality) {
            return;
        }
        let Some(parts) = formula.modal_parts() else {
            return;
        };
        let has_successor = !self.open[branch]
            .successors(&self.nodes, &parts.world)
            .is_empty();
        let target = TaskTarget::World(parts.world);
        if !has_successor && !self.open[branch].has_task(Rule::Seriality, &target) {
            self.enqueue(branch, Rule::Seriality, target, PRIORITY_SERIALITY, None);
        }
    }

    pub(crate) fn register_world(&mut self, branch: usize, world: Term) {
        if !self.open[branch].worlds.insert(world.clone()) {
            return;
        }
        if self.uses(AccessibilityProperty::Reflexivity) {
            self.enqueue(
                branch,
                Rule::Reflexivity,
                TaskTarget::World(world),
                PRIORITY_ACCESSIBILITY,
                None,
            );
        }
    }

    /// A new literal `ℛ(from, to)` was added to `branch`
    pub(crate) fn on_accessibility(&mut self, branch: usize, id: NodeId, from: Term, to: Term) {
        self.register_world(branch, from.clone());
        self.register_world(branch, to);

        for (property, rule) in [
            (AccessibilityProperty::Symmetry, Rule::Symmetry),
            (AccessibilityProperty::Transitivity, Rule::Transitivity),
            (AccessibilityProperty::Euclidity, Rule::Euclidity),
        ] {
            if self.uses(property) {
                self.enqueue(branch, rule, TaskTarget::Node(id), PRIORITY_ACCESSIBILITY, None);
            }
        }

        // modal gammas at `from` have a new world to look at
        let waiting: Vec<NodeId> = self.open[branch]
            .nodes
            .iter()
            .copied()
            .filter(|n| {
                let formula = &self.nodes[n.index()].formula;
                Rule::for_formula(formula).0 == Rule::ModalGamma
                    && formula.modal_parts().map_or(false, |parts| parts.world == from)
            })
            .collect();
        for n in waiting {
            let target = TaskTarget::Node(n);
            if !self.open[branch].has_task(Rule::ModalGamma, &target) {
                self.enqueue(branch, Rule::ModalGamma, target, PRIORITY_MODAL_GAMMA, None);
            }
        }
    }

    /// Instantiate `□A` at `u` for every successor of `u` not yet used
    pub(crate) fn expand_modal_gamma(&mut self, task: &Task) {
        let Some(n) = task.node() else { return };
        let formula = self.nodes[n.index()].formula.clone();
        let Some(parts) = formula.modal_parts() else {
            return;
        };
        for (access, world) in self.open[0].successors(&self.nodes, &parts.world) {
            if !self.open[0].modal_instances.insert((n, world.clone())) {
                continue;
            }
            let instance = parts
                .body
                .substitute(&Term::Var(parts.variable), &world, true);
            self.add_node(0, instance, Rule::ModalGamma, vec![n, access], None);
        }
    }

    /// `◇A` at `u`: a new world `x` with `ℛ(u,x)` and `A` at `x`
    pub(crate) fn expand_modal_delta(&mut self, task: &Task, signature: &mut Signature) {
        let Some(n) = task.node() else { return };
        let formula = self.nodes[n.index()].formula.clone();
        let Some(parts) = formula.modal_parts() else {
            return;
        };
        let witness = self.skolem_term(signature, Sort::World);
        let instance = parts
            .body
            .substitute(&Term::Var(parts.variable), &witness, true);
        let access = Formula::accessibility(parts.world, witness);
        self.add_node(0, access, Rule::ModalDelta, vec![n], None);
        self.add_node(0, instance, Rule::ModalDelta, vec![n], None);
    }

    pub(crate) fn expand_accessibility(&mut self, task: &Task, signature: &mut Signature) {
        match (&task.target, task.rule) {
            (TaskTarget::World(world), Rule::Reflexivity) => {
                let access = Formula::accessibility(world.clone(), world.clone());
                self.add_node(0, access, Rule::Reflexivity, Vec::new(), None);
            }
            (TaskTarget::World(world), Rule::Seriality) => {
                if self.open[0].successors(&self.nodes, world).is_empty() {
                    let next = self.skolem_term(signature, Sort::World);
                    let access = Formula::accessibility(world.clone(), next);
                    self.add_node(0, access, Rule::Seriality, Vec::new(), None);
                }
            }
            (TaskTarget::Node(n), rule) => {
                let n = *n;
                let formula = self.nodes[n.index()].formula.clone();
                let Some((u, v)) = formula.accessibility_pair() else {
                    return;
                };
                let mut derived: Vec<(Term, Term, Vec<NodeId>)> = Vec::new();
                match rule {
                    Rule::Symmetry => derived.push((v.clone(), u.clone(), vec![n])),
                    Rule::Transitivity => {
                        for (m, t) in self.open[0].successors(&self.nodes, v) {
                            derived.push((u.clone(), t, vec![n, m]));
                        }
                        for (m, t) in self.open[0].predecessors(&self.nodes, u) {
                            derived.push((t, v.clone(), vec![m, n]));
                        }
                    }
                    Rule::Euclidity => {
                        for (m, t) in self.open[0].successors(&self.nodes, u) {
                            derived.push((v.clone(), t.clone(), vec![n, m]));
                            derived.push((t, v.clone(), vec![m, n]));
                        }
                    }
                    _ => {}
                }
                for (from, to, sources) in derived {
                    self.add_node(0, Formula::accessibility(from, to), rule, sources, None);
                }
            }
            _ => {}
        }
    }
}
