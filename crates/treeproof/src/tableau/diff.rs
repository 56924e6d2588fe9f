//! Comparing alternative trees to drop redundant ones

use super::tree::Tree;
use crate::logic::Formula;

/// How the open branches of one tree relate to those of another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRelation {
    Same,
    /// Every open branch of the first tree is matched in the second, which has more
    Subset,
    Superset,
    Different,
}

/// A branch matches another when one formula sequence is a prefix of the other
fn branches_match(a: &[&Formula], b: &[&Formula]) -> bool {
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

fn covered(by: &[Vec<&Formula>], branches: &[Vec<&Formula>]) -> bool {
    branches
        .iter()
        .all(|branch| by.iter().any(|other| branches_match(branch, other)))
}

pub fn tree_diff(first: &Tree, second: &Tree) -> TreeRelation {
    let a = first.open_sequences();
    let b = second.open_sequences();
    let a_in_b = covered(&b, &a);
    let b_in_a = covered(&a, &b);
    match (a_in_b, b_in_a) {
        (true, true) if a.len() == b.len() => TreeRelation::Same,
        (true, true) if a.len() < b.len() => TreeRelation::Subset,
        (true, true) => TreeRelation::Superset,
        (true, false) => TreeRelation::Subset,
        (false, true) => TreeRelation::Superset,
        (false, false) => TreeRelation::Different,
    }
}

/// Drop alternatives that duplicate or extend another one.
///
/// Of two trees with the same open branches the later one goes; of a
/// subset and a superset the superset goes. At least one tree is kept.
/// Entries may carry bookkeeping next to their tree.
pub fn prune_alternatives<T: AsRef<Tree>>(entries: &mut Vec<T>) -> usize {
    let mut dropped = vec![false; entries.len()];
    for i in 0..entries.len() {
        if dropped[i] {
            continue;
        }
        for j in i + 1..entries.len() {
            if dropped[j] || dropped[i] {
                continue;
            }
            match tree_diff(entries[i].as_ref(), entries[j].as_ref()) {
                TreeRelation::Same | TreeRelation::Subset => dropped[j] = true,
                TreeRelation::Superset => dropped[i] = true,
                TreeRelation::Different => {}
            }
        }
    }
    if !dropped.is_empty() && dropped.iter().all(|d| *d) {
        dropped[0] = false;
    }
    let before = entries.len();
    let mut flags = dropped.into_iter();
    entries.retain(|_| !flags.next().unwrap_or(false));
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProverConfig;
    use crate::logic::{Signature, SymbolKind};

    fn prop(sig: &mut Signature, name: &str) -> Formula {
        Formula::atom(sig.register(name, SymbolKind::Predicate, 0).unwrap(), vec![])
    }

    #[test]
    fn identical_trees_are_same() {
        let mut sig = Signature::new();
        let p = prop(&mut sig, "p");
        let first = Tree::new(&[p.clone()], &[], None).unwrap();
        let second = Tree::new(&[p], &[], None).unwrap();
        assert_eq!(tree_diff(&first, &second), TreeRelation::Same);

        let mut trees = vec![first, second];
        assert_eq!(prune_alternatives(&mut trees), 1);
        assert_eq!(trees.len(), 1);
    }

    #[test]
    fn extra_branch_makes_a_superset() {
        let mut sig = Signature::new();
        let config = ProverConfig::default();
        let p = prop(&mut sig, "p");
        let q = prop(&mut sig, "q");
        let r = prop(&mut sig, "r");
        let narrow = Tree::new(&[p.clone()], &[], None).unwrap();
        let mut wide = Tree::new(&[p, Formula::or(q, r)], &[], None).unwrap();
        wide.step(&mut sig, &config).unwrap();
        wide.step(&mut sig, &config).unwrap();
        assert_eq!(wide.open_branches().len(), 2);

        assert_eq!(tree_diff(&narrow, &wide), TreeRelation::Subset);
        assert_eq!(tree_diff(&wide, &narrow), TreeRelation::Superset);

        let mut trees = vec![wide, narrow];
        prune_alternatives(&mut trees);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].open_branches().len(), 1);
    }

    #[test]
    fn unrelated_trees_are_kept() {
        let mut sig = Signature::new();
        let p = prop(&mut sig, "p");
        let q = prop(&mut sig, "q");
        let mut trees = vec![
            Tree::new(&[p], &[], None).unwrap(),
            Tree::new(&[q], &[], None).unwrap(),
        ];
        assert_eq!(tree_diff(&trees[0], &trees[1]), TreeRelation::Different);
        assert_eq!(prune_alternatives(&mut trees), 0);
    }
}
