//! Negation normal form, Skolemization and clausal normal form
//!
//! These transformations are used by the model finder, which works on
//! clauses. The tableau expands formulas directly and never calls them.

use super::formula::{BinaryOp, Formula, FormulaKind, ModalOp, Quantifier};
use super::signature::{Signature, Sort, SymbolId};
use super::term::Term;

/// A disjunction of literals; bound variables are implicitly universal
pub type Clause = Vec<Formula>;

impl Formula {
    /// Negation normal form: only `∧`, `∨`, quantifiers and modal operators
    /// remain, and negations sit directly on atoms.
    pub fn normalize(&self) -> Formula {
        enum WorkItem {
            Process(Formula, bool),
            CombineBinary(BinaryOp),
            CombineQuantified(Quantifier, SymbolId, Sort),
            CombineModal(ModalOp),
        }

        let mut stack: Vec<WorkItem> = vec![WorkItem::Process(self.clone(), false)];
        let mut results: Vec<Formula> = Vec::new();

        while let Some(item) = stack.pop() {
            match item {
                WorkItem::Process(f, negated) => match f.kind() {
                    FormulaKind::Atom { .. } => {
                        results.push(if negated { Formula::negation(f.clone()) } else { f.clone() });
                    }

                    FormulaKind::Not(sub) => {
                        stack.push(WorkItem::Process(sub.clone(), !negated));
                    }

                    FormulaKind::Binary {
                        op: BinaryOp::Iff,
                        left,
                        right,
                    } => {
                        let expanded = if negated {
                            Formula::or(
                                Formula::and(left.clone(), Formula::negation(right.clone())),
                                Formula::and(Formula::negation(left.clone()), right.clone()),
                            )
                        } else {
                            Formula::and(
                                Formula::implies(left.clone(), right.clone()),
                                Formula::implies(right.clone(), left.clone()),
                            )
                        };
                        stack.push(WorkItem::Process(expanded, false));
                    }

                    FormulaKind::Binary { op, left, right } => {
                        let (combined, left_negated, right_negated) = match (op, negated) {
                            (BinaryOp::And, false) => (BinaryOp::And, false, false),
                            (BinaryOp::And, true) => (BinaryOp::Or, true, true),
                            (BinaryOp::Or, false) => (BinaryOp::Or, false, false),
                            (BinaryOp::Or, true) => (BinaryOp::And, true, true),
                            (BinaryOp::Implies, false) => (BinaryOp::Or, true, false),
                            (BinaryOp::Implies, true) => (BinaryOp::And, false, true),
                            (BinaryOp::Iff, _) => unreachable!("handled above"),
                        };
                        stack.push(WorkItem::CombineBinary(combined));
                        stack.push(WorkItem::Process(right.clone(), right_negated));
                        stack.push(WorkItem::Process(left.clone(), left_negated));
                    }

                    FormulaKind::Quantified {
                        quantifier,
                        variable,
                        sort,
                        matrix,
                    } => {
                        let q = if negated { quantifier.dual() } else { *quantifier };
                        stack.push(WorkItem::CombineQuantified(q, *variable, *sort));
                        stack.push(WorkItem::Process(matrix.clone(), negated));
                    }

                    FormulaKind::Modal { op, sub } => {
                        let op = if negated { op.dual() } else { *op };
                        stack.push(WorkItem::CombineModal(op));
                        stack.push(WorkItem::Process(sub.clone(), negated));
                    }
                },

                WorkItem::CombineBinary(op) => {
                    let right = results.pop();
                    let left = results.pop();
                    if let (Some(left), Some(right)) = (left, right) {
                        results.push(Formula::binary(op, left, right));
                    }
                }

                WorkItem::CombineQuantified(q, variable, sort) => {
                    if let Some(matrix) = results.pop() {
                        results.push(Formula::quantified(q, variable, sort, matrix));
                    }
                }

                WorkItem::CombineModal(op) => {
                    if let Some(sub) = results.pop() {
                        results.push(Formula::modal(op, sub));
                    }
                }
            }
        }

        results.pop().unwrap_or_else(|| self.clone())
    }

    /// Bound-variable symbols occurring outside the scope of their quantifier
    pub fn unbound_variables(&self) -> Vec<SymbolId> {
        fn collect(f: &Formula, bound: &mut Vec<SymbolId>, out: &mut Vec<SymbolId>) {
            match f.kind() {
                FormulaKind::Atom { terms, .. } => {
                    let mut vars = Vec::new();
                    for term in terms {
                        term.collect_bound_variables(&mut vars);
                    }
                    for v in vars {
                        if !bound.contains(&v) && !out.contains(&v) {
                            out.push(v);
                        }
                    }
                }
                FormulaKind::Not(sub) | FormulaKind::Modal { sub, .. } => collect(sub, bound, out),
                FormulaKind::Binary { left, right, .. } => {
                    collect(left, bound, out);
                    collect(right, bound, out);
                }
                FormulaKind::Quantified {
                    variable, matrix, ..
                } => {
                    bound.push(*variable);
                    collect(matrix, bound, out);
                    bound.pop();
                }
            }
        }
        let mut out = Vec::new();
        collect(self, &mut Vec::new(), &mut out);
        out
    }

    /// Replace existential quantifiers of a formula in negation normal form
    /// by Skolem terms. Universal quantifiers are kept, each with a fresh
    /// variable, so separate clauses never share variable names.
    pub fn skolemize(&self, signature: &mut Signature) -> Formula {
        Skolemizer {
            signature,
            universals: Vec::new(),
            renaming: Vec::new(),
        }
        .skolemize(self)
    }

    /// Clauses of the Skolemized negation normal form
    pub fn clausal_normal_form(&self, signature: &mut Signature) -> Vec<Clause> {
        let skolemized = self.normalize().skolemize(signature);
        distribute(&skolemized)
    }
}

struct Skolemizer<'a> {
    signature: &'a mut Signature,
    universals: Vec<SymbolId>,
    renaming: Vec<(SymbolId, Term)>,
}

impl Skolemizer<'_> {
    fn lookup(&self, variable: SymbolId) -> Option<&Term> {
        self.renaming
            .iter()
            .rev()
            .find(|(v, _)| *v == variable)
            .map(|(_, t)| t)
    }

    fn rename_term(&self, term: &Term) -> Term {
        match term {
            Term::Var(v) => self.lookup(*v).cloned().unwrap_or_else(|| term.clone()),
            Term::App(f, args) => Term::App(*f, args.iter().map(|a| self.rename_term(a)).collect()),
            _ => term.clone(),
        }
    }

    fn skolemize(&mut self, f: &Formula) -> Formula {
        match f.kind() {
            FormulaKind::Atom { predicate, terms } => {
                Formula::atom(*predicate, terms.iter().map(|t| self.rename_term(t)).collect())
            }
            FormulaKind::Not(sub) => Formula::negation(self.skolemize(sub)),
            FormulaKind::Binary { op, left, right } => {
                let left = self.skolemize(left);
                let right = self.skolemize(right);
                Formula::binary(*op, left, right)
            }
            FormulaKind::Modal { op, sub } => {
                let sub = self.skolemize(sub);
                Formula::modal(*op, sub)
            }
            FormulaKind::Quantified {
                quantifier: Quantifier::Forall,
                variable,
                sort,
                matrix,
            } => {
                let fresh = self.signature.fresh_bound_variable(*sort);
                self.renaming.push((*variable, Term::Var(fresh)));
                self.universals.push(fresh);
                let matrix = self.skolemize(matrix);
                self.universals.pop();
                self.renaming.pop();
                Formula::quantified(Quantifier::Forall, fresh, *sort, matrix)
            }
            FormulaKind::Quantified {
                quantifier: Quantifier::Exists,
                variable,
                sort,
                matrix,
            } => {
                // The witness depends only on the universals that actually occur
                let mut dependencies = Vec::new();
                for v in f.unbound_variables() {
                    if let Some(t) = self.lookup(v) {
                        t.collect_bound_variables(&mut dependencies);
                    }
                }
                let args: Vec<Term> = self
                    .universals
                    .iter()
                    .filter(|u| dependencies.contains(u))
                    .map(|u| Term::Var(*u))
                    .collect();
                let skolem = self.signature.fresh_skolem(args.len(), *sort);
                self.renaming.push((*variable, Term::app(skolem, args)));
                let matrix = self.skolemize(matrix);
                self.renaming.pop();
                matrix
            }
        }
    }
}

fn distribute(f: &Formula) -> Vec<Clause> {
    match f.kind() {
        FormulaKind::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let mut clauses = distribute(left);
            clauses.extend(distribute(right));
            clauses
        }
        FormulaKind::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => {
            let left = distribute(left);
            let right = distribute(right);
            let mut clauses = Vec::with_capacity(left.len() * right.len());
            for l in &left {
                for r in &right {
                    let mut clause = l.clone();
                    for lit in r {
                        if !clause.contains(lit) {
                            clause.push(lit.clone());
                        }
                    }
                    clauses.push(clause);
                }
            }
            clauses
        }
        FormulaKind::Quantified {
            quantifier: Quantifier::Forall,
            matrix,
            ..
        } => distribute(matrix),
        _ => vec![vec![f.clone()]],
    }
}

fn is_tautology(clause: &Clause) -> bool {
    clause.iter().any(|lit| {
        clause.contains(&lit.negate()) || lit.equation().map_or(false, |(s, t)| s == t)
    })
}

/// Remove tautologies and subsumed clauses; the result is ordered by length
pub fn simplify_clauses(clauses: Vec<Clause>) -> Vec<Clause> {
    let mut candidates: Vec<Clause> = clauses.into_iter().filter(|c| !is_tautology(c)).collect();
    candidates.sort_by_key(|c| c.len());

    let mut kept: Vec<Clause> = Vec::new();
    for clause in candidates {
        if kept
            .iter()
            .any(|k| k.iter().all(|lit| clause.contains(lit)))
        {
            continue;
        }
        kept.push(clause);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::SymbolKind;

    struct TestContext {
        sig: Signature,
    }

    impl TestContext {
        fn new() -> Self {
            TestContext {
                sig: Signature::new(),
            }
        }

        fn prop(&mut self, name: &str) -> Formula {
            let id = self.sig.register(name, SymbolKind::Predicate, 0).unwrap();
            Formula::atom(id, vec![])
        }

        fn pred(&mut self, name: &str, args: Vec<Term>) -> Formula {
            let id = self
                .sig
                .register(name, SymbolKind::Predicate, args.len())
                .unwrap();
            Formula::atom(id, args)
        }

        fn var(&mut self, name: &str) -> SymbolId {
            self.sig.register(name, SymbolKind::Variable, 0).unwrap()
        }
    }

    #[test]
    fn nnf_pushes_negation_inwards() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let q = ctx.prop("q");
        let f = Formula::negation(Formula::implies(p.clone(), q.clone()));
        assert_eq!(f.normalize(), Formula::and(p, q.negate()));
    }

    #[test]
    fn nnf_dualises_quantifiers_and_modalities() {
        let mut ctx = TestContext::new();
        let x = ctx.var("x");
        let fx = ctx.pred("F", vec![Term::Var(x)]);
        let f = Formula::negation(Formula::forall(x, fx.clone()));
        assert_eq!(f.normalize(), Formula::exists(x, fx.negate()));

        let p = ctx.prop("p");
        let boxed = Formula::negation(Formula::modal(ModalOp::Necessity, p.clone()));
        assert_eq!(
            boxed.normalize(),
            Formula::modal(ModalOp::Possibility, p.negate())
        );
    }

    #[test]
    fn nnf_expands_biconditional() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let q = ctx.prop("q");
        let nnf = Formula::iff(p.clone(), q.clone()).normalize();
        assert_eq!(
            nnf,
            Formula::and(
                Formula::or(p.negate(), q.clone()),
                Formula::or(q.negate(), p.clone())
            )
        );
    }

    #[test]
    fn skolem_terms_take_only_relevant_universals() {
        let mut ctx = TestContext::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let z = ctx.var("z");
        let rxz = ctx.pred("R", vec![Term::Var(x), Term::Var(z)]);
        // ∀x∀y∃z Rxz
        let f = Formula::forall(x, Formula::forall(y, Formula::exists(z, rxz)));
        let clauses = f.clausal_normal_form(&mut ctx.sig);
        assert_eq!(clauses.len(), 1);
        let (_, _, args) = clauses[0][0].literal_parts().unwrap();
        match &args[1] {
            Term::App(sk, sk_args) => {
                assert_eq!(ctx.sig.arity(*sk), 1);
                assert_eq!(sk_args[0], args[0]);
            }
            other => panic!("expected skolem function, got {:?}", other),
        }
    }

    #[test]
    fn existential_without_universals_becomes_constant() {
        let mut ctx = TestContext::new();
        let x = ctx.var("x");
        let fx = ctx.pred("F", vec![Term::Var(x)]);
        let clauses = Formula::exists(x, fx).clausal_normal_form(&mut ctx.sig);
        let (_, _, args) = clauses[0][0].literal_parts().unwrap();
        assert!(matches!(args[0], Term::Const(_)));
    }

    #[test]
    fn cnf_distributes() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let q = ctx.prop("q");
        let r = ctx.prop("r");
        let f = Formula::or(Formula::and(p.clone(), q.clone()), r.clone());
        let clauses = f.clausal_normal_form(&mut ctx.sig);
        assert_eq!(clauses, vec![vec![p, r.clone()], vec![q, r]]);
    }

    #[test]
    fn cnf_standardizes_apart() {
        let mut ctx = TestContext::new();
        let x = ctx.var("x");
        let fx = ctx.pred("F", vec![Term::Var(x)]);
        let gx = ctx.pred("G", vec![Term::Var(x)]);
        let f = Formula::and(Formula::forall(x, fx), Formula::forall(x, gx));
        let clauses = f.clausal_normal_form(&mut ctx.sig);
        let (_, _, a) = clauses[0][0].literal_parts().unwrap();
        let (_, _, b) = clauses[1][0].literal_parts().unwrap();
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn simplification_drops_tautologies_and_subsumed() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let q = ctx.prop("q");
        let clauses = vec![
            vec![p.clone(), q.clone()],
            vec![q.clone(), q.negate()],
            vec![p.clone()],
            vec![p.clone()],
        ];
        assert_eq!(simplify_clauses(clauses), vec![vec![p]]);
    }
}
