//! Formulas
//!
//! A `Formula` is an immutable, reference-counted tree. Its expansion type,
//! free variables and connective count are computed once at construction,
//! and the sets of symbols it mentions are cached on first request. Two
//! formulas are equal when their structure is equal; sharing the same
//! allocation is a fast path.

use super::signature::{Signature, Sort, SymbolId};
use super::substitution::Substitution;
use super::term::Term;
use super::unification::{unify_lists, UnificationError, UnificationResult};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Implies,
    Iff,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "∧",
            BinaryOp::Or => "∨",
            BinaryOp::Implies => "→",
            BinaryOp::Iff => "↔",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantifier {
    Forall,
    Exists,
}

impl Quantifier {
    pub fn dual(self) -> Quantifier {
        match self {
            Quantifier::Forall => Quantifier::Exists,
            Quantifier::Exists => Quantifier::Forall,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Quantifier::Forall => "∀",
            Quantifier::Exists => "∃",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModalOp {
    /// □
    Necessity,
    /// ◇
    Possibility,
}

impl ModalOp {
    pub fn dual(self) -> ModalOp {
        match self {
            ModalOp::Necessity => ModalOp::Possibility,
            ModalOp::Possibility => ModalOp::Necessity,
        }
    }

    /// The quantifier over worlds this operator stands for
    pub fn quantifier(self) -> Quantifier {
        match self {
            ModalOp::Necessity => Quantifier::Forall,
            ModalOp::Possibility => Quantifier::Exists,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ModalOp::Necessity => "□",
            ModalOp::Possibility => "◇",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormulaKind {
    Atom {
        predicate: SymbolId,
        terms: Vec<Term>,
    },
    Not(Formula),
    Binary {
        op: BinaryOp,
        left: Formula,
        right: Formula,
    },
    Quantified {
        quantifier: Quantifier,
        variable: SymbolId,
        sort: Sort,
        matrix: Formula,
    },
    Modal {
        op: ModalOp,
        sub: Formula,
    },
}

/// How the tableau expands a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpansionType {
    Literal,
    Alpha,
    Beta,
    Gamma,
    Delta,
    /// Quantification over accessible worlds; `Forall` is modal gamma, `Exists` modal delta
    Modal(Quantifier),
}

/// Symbols mentioned by a formula
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSets {
    pub predicates: BTreeSet<SymbolId>,
    pub functions: BTreeSet<SymbolId>,
    pub constants: BTreeSet<SymbolId>,
}

/// Variable and body of a quantified formula, with the polarity pushed inside
#[derive(Debug, Clone)]
pub struct QuantifierParts {
    pub variable: SymbolId,
    pub sort: Sort,
    pub body: Formula,
}

/// World, world variable and body of a guarded world quantifier
#[derive(Debug, Clone)]
pub struct ModalParts {
    pub world: Term,
    pub variable: SymbolId,
    pub body: Formula,
}

struct FormulaNode {
    kind: FormulaKind,
    expansion: ExpansionType,
    free_variables: Vec<SymbolId>,
    connectives: usize,
    symbols: OnceCell<SymbolSets>,
}

#[derive(Clone)]
pub struct Formula(Rc<FormulaNode>);

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0.kind == other.0.kind
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.kind.hash(state);
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.kind.fmt(f)
    }
}

fn merge_variables(left: &[SymbolId], right: &[SymbolId]) -> Vec<SymbolId> {
    let mut vars = left.to_vec();
    for v in right {
        if !vars.contains(v) {
            vars.push(*v);
        }
    }
    vars
}

fn is_guarded(quantifier: Quantifier, variable: SymbolId, sort: Sort, matrix: &Formula) -> bool {
    if sort != Sort::World {
        return false;
    }
    let guard = match (quantifier, matrix.kind()) {
        (Quantifier::Forall, FormulaKind::Binary { op: BinaryOp::Implies, left, .. })
        | (Quantifier::Exists, FormulaKind::Binary { op: BinaryOp::And, left, .. }) => left,
        _ => return false,
    };
    match guard.kind() {
        FormulaKind::Atom { predicate, terms } => {
            *predicate == Signature::ACCESSIBILITY
                && terms.len() == 2
                && terms[1] == Term::Var(variable)
                && !terms[0].contains_var(variable)
        }
        _ => false,
    }
}

fn classify(kind: &FormulaKind) -> ExpansionType {
    use ExpansionType::*;
    match kind {
        FormulaKind::Atom { .. } => Literal,
        FormulaKind::Binary { op: BinaryOp::And, .. } => Alpha,
        FormulaKind::Binary { .. } => Beta,
        FormulaKind::Quantified {
            quantifier,
            variable,
            sort,
            matrix,
        } => {
            if is_guarded(*quantifier, *variable, *sort, matrix) {
                Modal(*quantifier)
            } else {
                match quantifier {
                    Quantifier::Forall => Gamma,
                    Quantifier::Exists => Delta,
                }
            }
        }
        FormulaKind::Modal { op, .. } => Modal(op.quantifier()),
        FormulaKind::Not(inner) => match inner.kind() {
            FormulaKind::Atom { .. } => Literal,
            FormulaKind::Not(_) => Alpha,
            FormulaKind::Binary { op, .. } => match op {
                BinaryOp::And | BinaryOp::Iff => Beta,
                BinaryOp::Or | BinaryOp::Implies => Alpha,
            },
            FormulaKind::Quantified {
                quantifier,
                variable,
                sort,
                matrix,
            } => {
                if is_guarded(*quantifier, *variable, *sort, matrix) {
                    Modal(quantifier.dual())
                } else {
                    match quantifier {
                        Quantifier::Forall => Delta,
                        Quantifier::Exists => Gamma,
                    }
                }
            }
            FormulaKind::Modal { op, .. } => Modal(op.dual().quantifier()),
        },
    }
}

impl Formula {
    fn from_kind(kind: FormulaKind) -> Formula {
        let expansion = classify(&kind);
        let (free_variables, connectives) = match &kind {
            FormulaKind::Atom { terms, .. } => {
                let mut vars = Vec::new();
                for term in terms {
                    term.collect_free_variables(&mut vars);
                }
                (vars, 0)
            }
            FormulaKind::Not(sub)
            | FormulaKind::Quantified { matrix: sub, .. }
            | FormulaKind::Modal { sub, .. } => {
                (sub.free_variables().to_vec(), sub.connectives() + 1)
            }
            FormulaKind::Binary { left, right, .. } => (
                merge_variables(left.free_variables(), right.free_variables()),
                left.connectives() + right.connectives() + 1,
            ),
        };
        Formula(Rc::new(FormulaNode {
            kind,
            expansion,
            free_variables,
            connectives,
            symbols: OnceCell::new(),
        }))
    }

    pub fn atom(predicate: SymbolId, terms: Vec<Term>) -> Formula {
        Formula::from_kind(FormulaKind::Atom { predicate, terms })
    }

    pub fn equality(left: Term, right: Term) -> Formula {
        Formula::atom(Signature::EQUALITY, vec![left, right])
    }

    pub fn accessibility(from: Term, to: Term) -> Formula {
        Formula::atom(Signature::ACCESSIBILITY, vec![from, to])
    }

    /// Wrap in a negation; see `negate` for the stripping variant
    pub fn negation(sub: Formula) -> Formula {
        Formula::from_kind(FormulaKind::Not(sub))
    }

    pub fn binary(op: BinaryOp, left: Formula, right: Formula) -> Formula {
        Formula::from_kind(FormulaKind::Binary { op, left, right })
    }

    pub fn and(left: Formula, right: Formula) -> Formula {
        Formula::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: Formula, right: Formula) -> Formula {
        Formula::binary(BinaryOp::Or, left, right)
    }

    pub fn implies(left: Formula, right: Formula) -> Formula {
        Formula::binary(BinaryOp::Implies, left, right)
    }

    pub fn iff(left: Formula, right: Formula) -> Formula {
        Formula::binary(BinaryOp::Iff, left, right)
    }

    pub fn quantified(
        quantifier: Quantifier,
        variable: SymbolId,
        sort: Sort,
        matrix: Formula,
    ) -> Formula {
        Formula::from_kind(FormulaKind::Quantified {
            quantifier,
            variable,
            sort,
            matrix,
        })
    }

    pub fn forall(variable: SymbolId, matrix: Formula) -> Formula {
        Formula::quantified(Quantifier::Forall, variable, Sort::Individual, matrix)
    }

    pub fn exists(variable: SymbolId, matrix: Formula) -> Formula {
        Formula::quantified(Quantifier::Exists, variable, Sort::Individual, matrix)
    }

    pub fn modal(op: ModalOp, sub: Formula) -> Formula {
        Formula::from_kind(FormulaKind::Modal { op, sub })
    }

    pub fn kind(&self) -> &FormulaKind {
        &self.0.kind
    }

    pub fn expansion(&self) -> ExpansionType {
        self.0.expansion
    }

    pub fn is_literal(&self) -> bool {
        self.0.expansion == ExpansionType::Literal
    }

    /// Number of connectives, quantifiers and modal operators
    pub fn connectives(&self) -> usize {
        self.0.connectives
    }

    pub fn free_variables(&self) -> &[SymbolId] {
        &self.0.free_variables
    }

    pub fn symbols(&self) -> &SymbolSets {
        self.0.symbols.get_or_init(|| {
            let mut sets = SymbolSets::default();
            self.collect_symbols(&mut sets);
            sets
        })
    }

    fn collect_symbols(&self, sets: &mut SymbolSets) {
        fn collect_term(term: &Term, sets: &mut SymbolSets) {
            match term {
                Term::Const(c) => {
                    sets.constants.insert(*c);
                }
                Term::App(f, args) => {
                    sets.functions.insert(*f);
                    for arg in args {
                        collect_term(arg, sets);
                    }
                }
                Term::Var(_) | Term::Free(_) => {}
            }
        }
        match self.kind() {
            FormulaKind::Atom { predicate, terms } => {
                sets.predicates.insert(*predicate);
                for term in terms {
                    collect_term(term, sets);
                }
            }
            FormulaKind::Not(sub)
            | FormulaKind::Quantified { matrix: sub, .. }
            | FormulaKind::Modal { sub, .. } => sub.collect_symbols(sets),
            FormulaKind::Binary { left, right, .. } => {
                left.collect_symbols(sets);
                right.collect_symbols(sets);
            }
        }
    }

    /// Negation that removes a leading `¬` instead of stacking another one
    pub fn negate(&self) -> Formula {
        match self.kind() {
            FormulaKind::Not(sub) => sub.clone(),
            _ => Formula::negation(self.clone()),
        }
    }

    /// Polarity, predicate and arguments of a literal
    pub fn literal_parts(&self) -> Option<(bool, SymbolId, &[Term])> {
        match self.kind() {
            FormulaKind::Atom { predicate, terms } => Some((true, *predicate, terms)),
            FormulaKind::Not(sub) => match sub.kind() {
                FormulaKind::Atom { predicate, terms } => Some((false, *predicate, terms)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Sides of a positive identity atom
    pub fn equation(&self) -> Option<(&Term, &Term)> {
        match self.kind() {
            FormulaKind::Atom { predicate, terms }
                if *predicate == Signature::EQUALITY && terms.len() == 2 =>
            {
                Some((&terms[0], &terms[1]))
            }
            _ => None,
        }
    }

    /// Sides of a negated identity atom
    pub fn disequation(&self) -> Option<(&Term, &Term)> {
        match self.kind() {
            FormulaKind::Not(sub) => sub.equation(),
            _ => None,
        }
    }

    /// Worlds of a positive accessibility atom
    pub fn accessibility_pair(&self) -> Option<(&Term, &Term)> {
        match self.kind() {
            FormulaKind::Atom { predicate, terms }
                if *predicate == Signature::ACCESSIBILITY && terms.len() == 2 =>
            {
                Some((&terms[0], &terms[1]))
            }
            _ => None,
        }
    }

    pub fn contains_modal(&self) -> bool {
        match self.kind() {
            FormulaKind::Atom { .. } => false,
            FormulaKind::Modal { .. } => true,
            FormulaKind::Not(sub) | FormulaKind::Quantified { matrix: sub, .. } => {
                sub.contains_modal()
            }
            FormulaKind::Binary { left, right, .. } => {
                left.contains_modal() || right.contains_modal()
            }
        }
    }

    /// Whether some quantifier or modal operator would be expanded as an existential
    pub fn has_existential_force(&self) -> bool {
        self.existential_under(true)
    }

    fn existential_under(&self, positive: bool) -> bool {
        match self.kind() {
            FormulaKind::Atom { .. } => false,
            FormulaKind::Not(sub) => sub.existential_under(!positive),
            FormulaKind::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    left.existential_under(positive) || right.existential_under(positive)
                }
                BinaryOp::Implies => {
                    left.existential_under(!positive) || right.existential_under(positive)
                }
                BinaryOp::Iff => {
                    left.existential_under(true)
                        || left.existential_under(false)
                        || right.existential_under(true)
                        || right.existential_under(false)
                }
            },
            FormulaKind::Quantified {
                quantifier, matrix, ..
            } => (*quantifier == Quantifier::Exists) == positive || matrix.existential_under(positive),
            FormulaKind::Modal { op, sub } => {
                (*op == ModalOp::Possibility) == positive || sub.existential_under(positive)
            }
        }
    }

    /// Replace every occurrence of the term `from` by `to`.
    ///
    /// Replacing a bound variable stops at a quantifier that rebinds it.
    /// With `shallow` set only whole atom arguments are replaced.
    pub fn substitute(&self, from: &Term, to: &Term, shallow: bool) -> Formula {
        if let Term::Free(v) = from {
            if !self.0.free_variables.contains(v) {
                return self.clone();
            }
        }
        match self.kind() {
            FormulaKind::Atom { predicate, terms } => Formula::atom(
                *predicate,
                terms.iter().map(|t| t.replace(from, to, shallow)).collect(),
            ),
            FormulaKind::Not(sub) => Formula::negation(sub.substitute(from, to, shallow)),
            FormulaKind::Binary { op, left, right } => Formula::binary(
                *op,
                left.substitute(from, to, shallow),
                right.substitute(from, to, shallow),
            ),
            FormulaKind::Quantified {
                quantifier,
                variable,
                sort,
                matrix,
            } => {
                if *from == Term::Var(*variable) {
                    return self.clone();
                }
                Formula::quantified(
                    *quantifier,
                    *variable,
                    *sort,
                    matrix.substitute(from, to, shallow),
                )
            }
            FormulaKind::Modal { op, sub } => {
                Formula::modal(*op, sub.substitute(from, to, shallow))
            }
        }
    }

    /// Apply a substitution of free variables
    pub fn apply(&self, subst: &Substitution) -> Formula {
        if !subst.affects(&self.0.free_variables) {
            return self.clone();
        }
        match self.kind() {
            FormulaKind::Atom { predicate, terms } => {
                Formula::atom(*predicate, terms.iter().map(|t| subst.apply(t)).collect())
            }
            FormulaKind::Not(sub) => Formula::negation(sub.apply(subst)),
            FormulaKind::Binary { op, left, right } => {
                Formula::binary(*op, left.apply(subst), right.apply(subst))
            }
            FormulaKind::Quantified {
                quantifier,
                variable,
                sort,
                matrix,
            } => Formula::quantified(*quantifier, *variable, *sort, matrix.apply(subst)),
            FormulaKind::Modal { op, sub } => Formula::modal(*op, sub.apply(subst)),
        }
    }

    /// Unifier that makes `self` and `other` a complementary pair of literals
    pub fn unify_complementary(&self, other: &Formula) -> UnificationResult {
        let (p1, pred1, args1) = self
            .literal_parts()
            .ok_or(UnificationError::StructureMismatch)?;
        let (p2, pred2, args2) = other
            .literal_parts()
            .ok_or(UnificationError::StructureMismatch)?;
        if p1 == p2 {
            return Err(UnificationError::StructureMismatch);
        }
        if pred1 != pred2 {
            return Err(UnificationError::SymbolClash(pred1, pred2));
        }
        unify_lists(args1, args2)
    }

    // =========================================================================
    // Expansion components
    // =========================================================================

    /// Conjuncts of an alpha formula
    pub fn alpha_components(&self) -> Vec<Formula> {
        match self.kind() {
            FormulaKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => vec![left.clone(), right.clone()],
            FormulaKind::Not(sub) => match sub.kind() {
                FormulaKind::Not(inner) => vec![inner.clone()],
                FormulaKind::Binary {
                    op: BinaryOp::Or,
                    left,
                    right,
                } => vec![left.negate(), right.negate()],
                FormulaKind::Binary {
                    op: BinaryOp::Implies,
                    left,
                    right,
                } => vec![left.clone(), right.negate()],
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// The two branches of a beta formula, each a list of formulas
    pub fn beta_components(&self) -> Option<[Vec<Formula>; 2]> {
        match self.kind() {
            FormulaKind::Binary { op, left, right } => match op {
                BinaryOp::Or => Some([vec![left.clone()], vec![right.clone()]]),
                BinaryOp::Implies => Some([vec![left.negate()], vec![right.clone()]]),
                BinaryOp::Iff => Some([
                    vec![left.clone(), right.clone()],
                    vec![left.negate(), right.negate()],
                ]),
                BinaryOp::And => None,
            },
            FormulaKind::Not(sub) => match sub.kind() {
                FormulaKind::Binary {
                    op: BinaryOp::And,
                    left,
                    right,
                } => Some([vec![left.negate()], vec![right.negate()]]),
                FormulaKind::Binary {
                    op: BinaryOp::Iff,
                    left,
                    right,
                } => Some([
                    vec![left.clone(), right.negate()],
                    vec![left.negate(), right.clone()],
                ]),
                _ => None,
            },
            _ => None,
        }
    }

    /// Variable and body of a gamma or delta formula
    pub fn quantifier_parts(&self) -> Option<QuantifierParts> {
        match self.kind() {
            FormulaKind::Quantified {
                variable,
                sort,
                matrix,
                ..
            } => Some(QuantifierParts {
                variable: *variable,
                sort: *sort,
                body: matrix.clone(),
            }),
            FormulaKind::Not(sub) => match sub.kind() {
                FormulaKind::Quantified {
                    variable,
                    sort,
                    matrix,
                    ..
                } => Some(QuantifierParts {
                    variable: *variable,
                    sort: *sort,
                    body: matrix.negate(),
                }),
                _ => None,
            },
            _ => None,
        }
    }

    /// Parts of a guarded world quantifier `∀v(ℛwv → A)` or `∃v(ℛwv ∧ A)`, possibly negated
    pub fn modal_parts(&self) -> Option<ModalParts> {
        let (negated, quantified) = match self.kind() {
            FormulaKind::Not(sub) => (true, sub),
            _ => (false, self),
        };
        let (variable, matrix) = match quantified.kind() {
            FormulaKind::Quantified {
                quantifier,
                variable,
                sort,
                matrix,
            } if is_guarded(*quantifier, *variable, *sort, matrix) => (*variable, matrix),
            _ => return None,
        };
        match matrix.kind() {
            FormulaKind::Binary { left, right, .. } => {
                let world = left.accessibility_pair()?.0.clone();
                let body = if negated { right.negate() } else { right.clone() };
                Some(ModalParts {
                    world,
                    variable,
                    body,
                })
            }
            _ => None,
        }
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> FormulaDisplay<'a> {
        FormulaDisplay {
            formula: self,
            signature,
        }
    }
}

/// Display wrapper that resolves symbol names
pub struct FormulaDisplay<'a> {
    formula: &'a Formula,
    signature: &'a Signature,
}

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.signature;
        match self.formula.kind() {
            FormulaKind::Atom { predicate, terms } => {
                if *predicate == Signature::EQUALITY && terms.len() == 2 {
                    return write!(f, "{}={}", terms[0].display(sig), terms[1].display(sig));
                }
                write!(f, "{}", sig.name(*predicate))?;
                let juxtapose = terms.iter().all(|t| {
                    !matches!(t, Term::App(..)) && sig.name(t.symbol()).chars().count() == 1
                });
                if juxtapose {
                    for term in terms {
                        write!(f, "{}", term.display(sig))?;
                    }
                    Ok(())
                } else {
                    write!(f, "(")?;
                    for (i, term) in terms.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", term.display(sig))?;
                    }
                    write!(f, ")")
                }
            }
            FormulaKind::Not(sub) => match sub.equation() {
                Some((s, t)) => write!(f, "{}≠{}", s.display(sig), t.display(sig)),
                None => write!(f, "¬{}", sub.display(sig)),
            },
            FormulaKind::Binary { op, left, right } => write!(
                f,
                "({} {} {})",
                left.display(sig),
                op.symbol(),
                right.display(sig)
            ),
            FormulaKind::Quantified {
                quantifier,
                variable,
                matrix,
                ..
            } => write!(
                f,
                "{}{}{}",
                quantifier.symbol(),
                sig.name(*variable),
                matrix.display(sig)
            ),
            FormulaKind::Modal { op, sub } => write!(f, "{}{}", op.symbol(), sub.display(sig)),
        }
    }
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

        fn constant(&mut self, name: &str) -> Term {
            Term::Const(self.sig.register(name, SymbolKind::Constant, 0).unwrap())
        }

        fn bound(&mut self, name: &str) -> SymbolId {
            self.sig.register(name, SymbolKind::Variable, 0).unwrap()
        }
    }

    #[test]
    fn classification() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let q = ctx.prop("q");
        let x = ctx.bound("x");
        let fx = ctx.pred("F", vec![Term::Var(x)]);

        assert_eq!(p.expansion(), ExpansionType::Literal);
        assert_eq!(p.negate().expansion(), ExpansionType::Literal);
        assert_eq!(Formula::and(p.clone(), q.clone()).expansion(), ExpansionType::Alpha);
        assert_eq!(Formula::or(p.clone(), q.clone()).expansion(), ExpansionType::Beta);
        assert_eq!(
            Formula::negation(Formula::implies(p.clone(), q.clone())).expansion(),
            ExpansionType::Alpha
        );
        assert_eq!(
            Formula::negation(Formula::negation(p.clone())).expansion(),
            ExpansionType::Alpha
        );
        assert_eq!(Formula::iff(p.clone(), q.clone()).expansion(), ExpansionType::Beta);
        let all = Formula::forall(x, fx.clone());
        assert_eq!(all.expansion(), ExpansionType::Gamma);
        assert_eq!(all.negate().expansion(), ExpansionType::Delta);
        assert_eq!(
            Formula::negation(Formula::exists(x, fx)).expansion(),
            ExpansionType::Gamma
        );
    }

    #[test]
    fn guarded_world_quantifiers_are_modal() {
        let mut sig = Signature::new();
        let w = Term::Const(sig.initial_world());
        let v = sig.fresh_bound_variable(Sort::World);
        let p = sig.register("p", SymbolKind::Predicate, 1).unwrap();
        let body = Formula::atom(p, vec![Term::Var(v)]);
        let guard = Formula::accessibility(w.clone(), Term::Var(v));

        let boxed = Formula::quantified(
            Quantifier::Forall,
            v,
            Sort::World,
            Formula::implies(guard.clone(), body.clone()),
        );
        assert_eq!(boxed.expansion(), ExpansionType::Modal(Quantifier::Forall));
        assert_eq!(
            boxed.negate().expansion(),
            ExpansionType::Modal(Quantifier::Exists)
        );

        let parts = boxed.negate().modal_parts().unwrap();
        assert_eq!(parts.world, w);
        assert_eq!(parts.variable, v);
        assert_eq!(parts.body, body.negate());

        let unguarded = Formula::quantified(Quantifier::Forall, v, Sort::World, body);
        assert_eq!(unguarded.expansion(), ExpansionType::Gamma);
        assert!(unguarded.modal_parts().is_none());
    }

    #[test]
    fn negate_strips_leading_negation() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let not_p = p.negate();
        assert_eq!(not_p.negate(), p);
        assert_eq!(not_p.connectives(), 1);
    }

    #[test]
    fn substitution_respects_shadowing() {
        let mut ctx = TestContext::new();
        let x = ctx.bound("x");
        let a = ctx.constant("a");
        let fx = ctx.pred("F", vec![Term::Var(x)]);
        let inner = Formula::forall(x, fx.clone());
        let f = Formula::and(fx, inner.clone());

        let replaced = f.substitute(&Term::Var(x), &a, false);
        match replaced.kind() {
            FormulaKind::Binary { left, right, .. } => {
                assert_eq!(left.display(&ctx.sig).to_string(), "Fa");
                assert_eq!(*right, inner);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn components() {
        let mut ctx = TestContext::new();
        let p = ctx.prop("p");
        let q = ctx.prop("q");
        let not_or = Formula::negation(Formula::or(p.clone(), q.clone()));
        assert_eq!(not_or.alpha_components(), vec![p.negate(), q.negate()]);

        let [left, right] = Formula::implies(p.clone(), q.clone())
            .beta_components()
            .unwrap();
        assert_eq!(left, vec![p.negate()]);
        assert_eq!(right, vec![q.clone()]);

        let [left, right] = Formula::negation(Formula::iff(p.clone(), q.clone()))
            .beta_components()
            .unwrap();
        assert_eq!(left, vec![p.clone(), q.negate()]);
        assert_eq!(right, vec![p.negate(), q]);
    }

    #[test]
    fn complementary_literals_unify() {
        let mut sig = Signature::new();
        let f = sig.register("F", SymbolKind::Predicate, 1).unwrap();
        let a = Term::Const(sig.register("a", SymbolKind::Constant, 0).unwrap());
        let x = sig.fresh_free_variable(Sort::Individual);
        let fx = Formula::atom(f, vec![Term::Free(x)]);
        let not_fa = Formula::atom(f, vec![a.clone()]).negate();

        let subst = fx.unify_complementary(&not_fa).unwrap();
        assert_eq!(subst.get(x), Some(&a));
        assert_eq!(fx.apply(&subst).negate(), not_fa);
        assert_eq!(
            fx.unify_complementary(&fx),
            Err(UnificationError::StructureMismatch)
        );
    }

    #[test]
    fn existential_force_tracks_polarity() {
        let mut ctx = TestContext::new();
        let x = ctx.bound("x");
        let fx = ctx.pred("F", vec![Term::Var(x)]);
        let p = ctx.prop("p");
        let ex = Formula::exists(x, fx.clone());
        assert!(ex.has_existential_force());
        assert!(!Formula::negation(ex.clone()).has_existential_force());
        assert!(Formula::implies(Formula::forall(x, fx), p).has_existential_force());
    }

    #[test]
    fn display() {
        let mut ctx = TestContext::new();
        let x = ctx.bound("x");
        let a = ctx.constant("a");
        let fxa = ctx.pred("F", vec![Term::Var(x), a.clone()]);
        let f = Formula::forall(x, Formula::implies(fxa, Formula::equality(a.clone(), a.clone()).negate()));
        assert_eq!(f.display(&ctx.sig).to_string(), "∀x(Fxa → a≠a)");
    }

    #[test]
    fn symbols_are_collected() {
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let g = ctx.sig.register("g", SymbolKind::Function, 1).unwrap();
        let f = ctx.pred("F", vec![Term::App(g, vec![a.clone()])]);
        let symbols = f.symbols();
        assert!(symbols.functions.contains(&g));
        assert!(symbols.constants.contains(&a.symbol()));
        assert_eq!(symbols.predicates.len(), 1);
    }
}
