//! Prover: drives the tableau and the model finder in lock-step.
//!
//! The `Prover` keeps a queue of alternative trees. The front tree is
//! expanded one task per step; when a literal check finds closing
//! substitutions the closed copies are queued and the front switches to
//! the first of them. Trees whose priority exceeds the depth limit rotate
//! to the back, and the limit grows once every alternative exceeds it.
//!
//! Use `run()` to search to completion, or `step()` for incremental
//! execution from a caller-owned loop.

use crate::config::ProverConfig;
use crate::error::Result;
use crate::logic::{translate_from_modal, Formula, Signature, Term};
use crate::model::{FinderStatus, Model, ModelFinder};
use crate::parser::Problem;
use crate::tableau::{prune_alternatives, StepOutcome, Tree};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of one prover step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Continue,
    /// Every branch of a tree closed
    Closed,
    /// The model finder satisfied every constraint
    ModelFound,
    /// The cancel flag was set; the search can resume
    Stopped,
    /// Step or time limit reached, or both searches gave up
    LimitReached,
}

impl Status {
    pub fn is_final(self) -> bool {
        !matches!(self, Status::Continue | Status::Stopped)
    }
}

/// Progress snapshot passed to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub step: usize,
    pub alternatives: usize,
    pub open_branches: usize,
    pub depth_limit: usize,
    pub individuals: usize,
    pub worlds: usize,
}

/// Callbacks fired between steps
pub trait ProofObserver {
    fn on_status(&mut self, _report: &StatusReport) {}

    fn on_finished(&mut self, _status: Status) {}
}

/// Observer that ignores every callback
pub struct NoObserver;

impl ProofObserver for NoObserver {}

/// A stored tree with the prover step at which it was queued
#[derive(Debug, Clone)]
struct Alternative {
    tree: Tree,
    queued_at: usize,
}

impl AsRef<Tree> for Alternative {
    fn as_ref(&self) -> &Tree {
        &self.tree
    }
}

pub struct Prover {
    pub config: ProverConfig,
    signature: Signature,
    modal: bool,
    alternatives: VecDeque<Alternative>,
    /// The tree that closed, once one has
    closed_tree: Option<Tree>,
    finder: Option<ModelFinder>,
    observer: Box<dyn ProofObserver>,
    depth_limit: usize,
    steps: usize,
    start_time: Option<Instant>,
    /// The current tree has a saturated open branch
    tableau_done: bool,
    result: Option<Status>,
    /// Cancellation flag: set to `true` to stop at the next step
    pub cancel: Arc<AtomicBool>,
}

impl Prover {
    /// Start a search on `formulas`, which are tested for joint satisfiability.
    ///
    /// Modal formulas are translated to first-order form at the initial world.
    pub fn new(formulas: Vec<Formula>, signature: Signature, config: ProverConfig) -> Result<Self> {
        let mut signature = signature;
        let modal = formulas.iter().any(Formula::contains_modal);
        let (formulas, initial_world) = if modal {
            let world = Term::Const(signature.initial_world());
            let universal = config.universal_accessibility();
            let translated = formulas
                .iter()
                .map(|f| translate_from_modal(f, &world, &mut signature, universal))
                .collect();
            (translated, Some(world))
        } else {
            (formulas, None)
        };

        let tree = Tree::new(&formulas, &config.accessibility, initial_world)?;
        let finder = config
            .model_finder
            .then(|| ModelFinder::new(&formulas, &signature, &config, modal));
        debug!(
            formulas = formulas.len(),
            modal,
            model_finder = finder.is_some(),
            "prover initialised"
        );

        Ok(Prover {
            depth_limit: config.initial_depth_limit,
            config,
            signature,
            modal,
            alternatives: VecDeque::from(vec![Alternative {
                tree,
                queued_at: 0,
            }]),
            closed_tree: None,
            finder,
            observer: Box::new(NoObserver),
            steps: 0,
            start_time: None,
            tableau_done: false,
            result: None,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Premises together with the negated conclusion
    pub fn from_problem(problem: &Problem, config: ProverConfig) -> Result<Self> {
        Prover::new(problem.initial_formulas(), problem.signature.clone(), config)
    }

    pub fn with_observer(mut self, observer: Box<dyn ProofObserver>) -> Self {
        self.observer = observer;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    /// The closed tree once the proof is found, otherwise the tree being expanded
    pub fn current_tree(&self) -> Option<&Tree> {
        self.closed_tree
            .as_ref()
            .or_else(|| self.alternatives.front().map(|a| &a.tree))
    }

    pub fn alternatives(&self) -> usize {
        self.alternatives.len()
    }

    pub fn model(&self) -> Option<&Model> {
        self.finder.as_ref().and_then(ModelFinder::model)
    }

    pub fn model_finder(&self) -> Option<&ModelFinder> {
        self.finder.as_ref()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// The terminal status, once reached
    pub fn result(&self) -> Option<Status> {
        self.result
    }

    pub fn report(&self) -> StatusReport {
        let sizes = self.finder.as_ref().map(ModelFinder::sizes);
        StatusReport {
            step: self.steps,
            alternatives: self.alternatives.len(),
            open_branches: self
                .current_tree()
                .map_or(0, |t| t.open_branches().len()),
            depth_limit: self.depth_limit,
            individuals: sizes.map_or(0, |s| s.individuals),
            worlds: sizes.map_or(0, |s| s.worlds),
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.cancel.store(false, Ordering::Relaxed);
    }

    /// Step until the search finishes or is stopped
    pub fn run(&mut self) -> Result<Status> {
        loop {
            let status = self.step()?;
            if status != Status::Continue {
                return Ok(status);
            }
        }
    }

    /// One tableau task plus `model_steps_per_step` model-finder steps
    pub fn step(&mut self) -> Result<Status> {
        if let Some(status) = self.result {
            return Ok(status);
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Ok(Status::Stopped);
        }
        let start = *self.start_time.get_or_insert_with(Instant::now);
        let out_of_steps = self.config.max_steps > 0 && self.steps >= self.config.max_steps;
        let out_of_time = self.config.timeout > Duration::ZERO && start.elapsed() >= self.config.timeout;
        if out_of_steps || out_of_time {
            debug!(steps = self.steps, out_of_time, "search limit reached");
            return Ok(self.finish(Status::LimitReached));
        }
        self.steps += 1;

        if !self.tableau_done {
            if let Some(status) = self.tableau_step()? {
                return Ok(self.finish(status));
            }
        }

        let mut finder_done = true;
        if let Some(finder) = self.finder.as_mut() {
            for _ in 0..self.config.model_steps_per_step.max(1) {
                match finder.step() {
                    FinderStatus::Searching => {}
                    FinderStatus::Found => return Ok(self.finish(Status::ModelFound)),
                    FinderStatus::GaveUp => break,
                }
            }
            finder_done = finder.status() == FinderStatus::GaveUp;
        }
        if self.tableau_done && finder_done {
            debug!("tableau saturated and no model found");
            return Ok(self.finish(Status::LimitReached));
        }

        if self.config.status_interval > 0 && self.steps % self.config.status_interval == 0 {
            let report = self.report();
            self.observer.on_status(&report);
        }
        Ok(Status::Continue)
    }

    fn finish(&mut self, status: Status) -> Status {
        debug!(?status, steps = self.steps, "search finished");
        self.result = Some(status);
        self.observer.on_finished(status);
        status
    }

    fn tableau_step(&mut self) -> Result<Option<Status>> {
        self.select_alternative();
        let Some(Alternative { tree, .. }) = self.alternatives.front_mut() else {
            self.tableau_done = true;
            return Ok(None);
        };
        match tree.step(&mut self.signature, &self.config)? {
            StepOutcome::Expanded => Ok(None),
            StepOutcome::Closed => {
                self.closed_tree = self.alternatives.pop_front().map(|a| a.tree);
                debug!(steps = self.steps, "tree closed");
                Ok(Some(Status::Closed))
            }
            StepOutcome::Saturated => {
                debug!(steps = self.steps, "open branch saturated");
                self.tableau_done = true;
                Ok(None)
            }
            StepOutcome::Alternatives(mut trees) => {
                if let Some(position) = trees.iter().position(Tree::is_closed) {
                    self.closed_tree = Some(trees.swap_remove(position));
                    debug!(steps = self.steps, "tree closed");
                    return Ok(Some(Status::Closed));
                }
                self.add_alternatives(trees);
                Ok(None)
            }
        }
    }

    /// The first closing option becomes current; the other options and the
    /// unclosed tree wait at the back. Beyond `max_alternatives` the trees
    /// stored longest are dropped first.
    fn add_alternatives(&mut self, trees: Vec<Tree>) {
        let added = trees.len();
        let queued_at = self.steps;
        let original = self.alternatives.pop_front();
        let mut fresh = trees
            .into_iter()
            .map(|tree| Alternative { tree, queued_at })
            .chain(original.map(|a| Alternative { queued_at, ..a }));

        let mut all: Vec<Alternative> = Vec::with_capacity(self.alternatives.len() + added + 1);
        all.extend(fresh.next());
        all.extend(self.alternatives.drain(..));
        all.extend(fresh);

        let pruned = prune_alternatives(&mut all);
        let limit = self.config.max_alternatives.max(1);
        let dropped = all.len().saturating_sub(limit);
        for _ in 0..dropped {
            evict_oldest(&mut all, queued_at);
        }
        self.alternatives = all.into();
        debug!(
            added,
            pruned,
            dropped,
            total = self.alternatives.len(),
            "alternatives updated"
        );
    }

    /// Rotate alternatives over the depth limit to the back; raise the
    /// limit when none is within it
    fn select_alternative(&mut self) {
        let mut rotations = 0;
        while let Some(front) = self.alternatives.front() {
            if front.tree.priority() <= self.depth_limit {
                return;
            }
            if rotations >= self.alternatives.len() {
                self.depth_limit += self.config.depth_limit_increment.max(1);
                debug!(depth_limit = self.depth_limit, "depth limit raised");
                rotations = 0;
                continue;
            }
            self.alternatives.rotate_left(1);
            rotations += 1;
            debug!(priority = front_priority(&self.alternatives), "switched alternative");
        }
    }
}

fn front_priority(alternatives: &VecDeque<Alternative>) -> usize {
    alternatives.front().map_or(0, |a| a.tree.priority())
}

/// Remove one tree, never the current one: the oldest stored before
/// `now`, else the latest closing option, keeping the unclosed tree last
fn evict_oldest(all: &mut Vec<Alternative>, now: usize) {
    let oldest = all
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, a)| a.queued_at < now)
        .min_by_key(|(_, a)| a.queued_at)
        .map(|(i, _)| i);
    match oldest {
        Some(index) => {
            all.remove(index);
        }
        None if all.len() >= 3 => {
            all.remove(all.len() - 2);
        }
        None => all.truncate(all.len().saturating_sub(1).max(1)),
    }
}
