//! JSON serialization types for proof data

use crate::logic::Signature;
use crate::model::Model;
use crate::prover::{Prover, Status};
use crate::tableau::{Branch, Node, Tree};
use serde::{Deserialize, Serialize};

/// JSON representation of a tableau node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJson {
    pub id: u32,
    pub formula: String,
    pub rule: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub from: Vec<u32>,
    pub step: usize,
    pub used: bool,
}

impl NodeJson {
    pub fn from_node(node: &Node, signature: &Signature) -> Self {
        NodeJson {
            id: node.id.as_u32(),
            formula: node.formula.display(signature).to_string(),
            rule: node.rule.name().to_string(),
            from: node.from_nodes.iter().map(|n| n.as_u32()).collect(),
            step: node.step,
            used: node.is_used(),
        }
    }
}

fn branch_nodes(branches: &[Branch]) -> Vec<Vec<u32>> {
    branches
        .iter()
        .map(|b| b.nodes().iter().map(|n| n.as_u32()).collect())
        .collect()
}

/// JSON representation of a tree: its nodes and branches as node-id lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeJson {
    pub nodes: Vec<NodeJson>,
    pub open: Vec<Vec<u32>>,
    pub closed: Vec<Vec<u32>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub removed: Vec<Vec<u32>>,
    pub priority: usize,
}

impl TreeJson {
    pub fn from_tree(tree: &Tree, signature: &Signature) -> Self {
        TreeJson {
            nodes: tree
                .nodes()
                .iter()
                .map(|n| NodeJson::from_node(n, signature))
                .collect(),
            open: branch_nodes(tree.open_branches()),
            closed: branch_nodes(tree.closed_branches()),
            removed: branch_nodes(tree.removed_branches()),
            priority: tree.priority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenotationJson {
    pub term: String,
    pub value: usize,
}

/// Tuples for which a predicate holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionJson {
    pub predicate: String,
    pub tuples: Vec<Vec<usize>>,
}

/// JSON representation of a finite model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelJson {
    pub individuals: usize,
    pub worlds: usize,
    pub denotations: Vec<DenotationJson>,
    pub extensions: Vec<ExtensionJson>,
}

impl ModelJson {
    pub fn from_model(model: &Model, signature: &Signature) -> Self {
        let denotations = model
            .denotations()
            .map(|(term, value)| DenotationJson {
                term: term.display(signature).to_string(),
                value,
            })
            .collect();

        let mut extensions: Vec<ExtensionJson> = Vec::new();
        for (predicate, args, value) in model.extensions() {
            let name = signature.name(predicate);
            let index = match extensions.iter().position(|e| e.predicate == name) {
                Some(index) => index,
                None => {
                    extensions.push(ExtensionJson {
                        predicate: name.to_string(),
                        tuples: Vec::new(),
                    });
                    extensions.len() - 1
                }
            };
            if value {
                extensions[index].tuples.push(args.to_vec());
            }
        }

        let sizes = model.sizes();
        ModelJson {
            individuals: sizes.individuals,
            worlds: sizes.worlds,
            denotations,
            extensions,
        }
    }
}

/// Everything the renderer needs from a finished or interrupted search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofReport {
    pub status: Status,
    pub steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelJson>,
}

impl ProofReport {
    pub fn from_prover(prover: &Prover) -> Self {
        let model = prover.model_finder().and_then(|finder| {
            finder
                .model()
                .map(|m| ModelJson::from_model(m, finder.signature()))
        });
        ProofReport {
            status: prover.result().unwrap_or(Status::Continue),
            steps: prover.steps(),
            tree: prover
                .current_tree()
                .map(|t| TreeJson::from_tree(t, prover.signature())),
            model,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProverConfig;
    use crate::logic::{Formula, SymbolKind, Term};

    #[test]
    fn closed_tree_report() {
        let mut sig = Signature::new();
        let p = Formula::atom(sig.register("p", SymbolKind::Predicate, 0).unwrap(), vec![]);
        let mut prover =
            Prover::new(vec![Formula::and(p.clone(), p.negate())], sig, ProverConfig::default())
                .unwrap();
        prover.run().unwrap();

        let report = ProofReport::from_prover(&prover);
        assert_eq!(report.status, Status::Closed);
        let tree = report.tree.as_ref().unwrap();
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[1].formula, "p");
        assert_eq!(tree.nodes[1].rule, "alpha");
        assert_eq!(tree.nodes[1].from, vec![0]);
        assert!(tree.nodes.iter().all(|n| n.used));
        assert!(tree.open.is_empty());
        assert_eq!(tree.closed, vec![vec![0, 1, 2]]);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"status\":\"closed\""));
        assert!(!json.contains("\"model\""));
    }

    #[test]
    fn model_report() {
        let mut sig = Signature::new();
        let f = sig.register("F", SymbolKind::Predicate, 1).unwrap();
        let a = Term::Const(sig.register("a", SymbolKind::Constant, 0).unwrap());
        let b = Term::Const(sig.register("b", SymbolKind::Constant, 0).unwrap());
        let formula = Formula::and(
            Formula::atom(f, vec![a]),
            Formula::negation(Formula::atom(f, vec![b])),
        );
        let mut prover = Prover::new(vec![formula], sig, ProverConfig::default()).unwrap();
        assert_eq!(prover.run().unwrap(), Status::ModelFound);

        let report = ProofReport::from_prover(&prover);
        let model = report.model.unwrap();
        assert_eq!(model.individuals, 2);
        let extension = model.extensions.iter().find(|e| e.predicate == "F").unwrap();
        assert_eq!(extension.tuples, vec![vec![0]]);
        let denotation = |name: &str| {
            model
                .denotations
                .iter()
                .find(|d| d.term == name)
                .map(|d| d.value)
        };
        assert_eq!(denotation("a"), Some(0));
        assert_eq!(denotation("b"), Some(1));
    }
}
