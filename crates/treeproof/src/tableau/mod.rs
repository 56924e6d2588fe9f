//! Free-variable tableaux with backtracking over closing substitutions

mod accessibility;
pub mod branch;
pub mod diff;
pub mod node;
pub mod rules;
pub mod tree;

pub use branch::{Branch, BranchId, BranchStatus};
pub use diff::{prune_alternatives, tree_diff, TreeRelation};
pub use node::{Node, NodeId};
pub use rules::{Rule, Task, TaskTarget};
pub use tree::{ClosureOption, StepOutcome, Tree};
