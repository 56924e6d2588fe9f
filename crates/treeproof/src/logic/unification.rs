//! Most general unifiers over free variables
//!
//! Only `Term::Free` is treated as a variable. Bound variables and constants
//! unify only with themselves. Sorts are not checked: well-sorted input never
//! produces an ill-sorted unifier because free variables inherit the sort of
//! the quantifier they replace.

use super::signature::SymbolId;
use super::substitution::Substitution;
use super::term::Term;

/// Result of a unification attempt
pub type UnificationResult = Result<Substitution, UnificationError>;

/// Reasons unification can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnificationError {
    /// Variable occurs in the term it should be bound to
    OccursCheck(SymbolId, Term),
    /// Different head symbols
    SymbolClash(SymbolId, SymbolId),
    /// Argument lists of different length
    ArityMismatch(usize, usize),
    /// Not two literals of opposite shape (wrong polarity or non-atomic)
    StructureMismatch,
}

/// Unify two terms, returning a most general unifier if one exists
pub fn unify(term1: &Term, term2: &Term) -> UnificationResult {
    let mut subst = Substitution::new();
    unify_with(term1, term2, &mut subst)?;
    Ok(subst)
}

/// Unify two argument lists pairwise
pub fn unify_lists(terms1: &[Term], terms2: &[Term]) -> UnificationResult {
    let mut subst = Substitution::new();
    unify_lists_with(terms1, terms2, &mut subst)?;
    Ok(subst)
}

/// Unify two terms, extending an existing substitution
pub fn unify_with(
    term1: &Term,
    term2: &Term,
    subst: &mut Substitution,
) -> Result<(), UnificationError> {
    let t1 = subst.apply(term1);
    let t2 = subst.apply(term2);

    match (&t1, &t2) {
        _ if t1 == t2 => Ok(()),

        (Term::Free(v), t) | (t, Term::Free(v)) => {
            if t.contains_free(*v) {
                Err(UnificationError::OccursCheck(*v, t.clone()))
            } else {
                subst.bind(*v, t.clone());
                Ok(())
            }
        }

        (Term::App(f1, args1), Term::App(f2, args2)) => {
            if f1 != f2 {
                return Err(UnificationError::SymbolClash(*f1, *f2));
            }
            if args1.len() != args2.len() {
                return Err(UnificationError::ArityMismatch(args1.len(), args2.len()));
            }
            for (arg1, arg2) in args1.iter().zip(args2.iter()) {
                unify_with(arg1, arg2, subst)?;
            }
            Ok(())
        }

        _ => Err(UnificationError::SymbolClash(t1.symbol(), t2.symbol())),
    }
}

pub fn unify_lists_with(
    terms1: &[Term],
    terms2: &[Term],
    subst: &mut Substitution,
) -> Result<(), UnificationError> {
    if terms1.len() != terms2.len() {
        return Err(UnificationError::ArityMismatch(terms1.len(), terms2.len()));
    }
    for (t1, t2) in terms1.iter().zip(terms2.iter()) {
        unify_with(t1, t2, subst)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Signature, Sort, SymbolKind};

    struct TestContext {
        sig: Signature,
    }

    impl TestContext {
        fn new() -> Self {
            TestContext {
                sig: Signature::new(),
            }
        }

        fn var(&mut self) -> Term {
            Term::Free(self.sig.fresh_free_variable(Sort::Individual))
        }

        fn constant(&mut self, name: &str) -> Term {
            Term::Const(self.sig.register(name, SymbolKind::Constant, 0).unwrap())
        }

        fn func(&mut self, name: &str, args: Vec<Term>) -> Term {
            let id = self.sig.register(name, SymbolKind::Function, args.len()).unwrap();
            Term::App(id, args)
        }
    }

    #[test]
    fn test_unify_variable_with_constant() {
        let mut ctx = TestContext::new();
        let x = ctx.var();
        let a = ctx.constant("a");

        let subst = unify(&x, &a).unwrap();
        assert_eq!(subst.get(x.symbol()), Some(&a));
    }

    #[test]
    fn test_unify_nested_functions() {
        let mut ctx = TestContext::new();
        let x = ctx.var();
        let y = ctx.var();
        let a = ctx.constant("a");
        let gx = ctx.func("g", vec![x.clone()]);
        let ga = ctx.func("g", vec![a.clone()]);
        let t1 = ctx.func("f", vec![gx, y.clone()]);
        let t2 = ctx.func("f", vec![ga, x.clone()]);

        let subst = unify(&t1, &t2).unwrap();
        assert_eq!(subst.apply(&t1), subst.apply(&t2));
        assert_eq!(subst.apply(&y), a);
    }

    #[test]
    fn test_occurs_check() {
        let mut ctx = TestContext::new();
        let x = ctx.var();
        let fx = ctx.func("f", vec![x.clone()]);
        assert!(matches!(
            unify(&x, &fx),
            Err(UnificationError::OccursCheck(_, _))
        ));
    }

    #[test]
    fn test_constant_clash() {
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        assert_eq!(
            unify(&a, &b),
            Err(UnificationError::SymbolClash(a.symbol(), b.symbol()))
        );
    }

    #[test]
    fn test_bound_variables_are_rigid() {
        let mut ctx = TestContext::new();
        let x = Term::Var(ctx.sig.register("x", SymbolKind::Variable, 0).unwrap());
        let a = ctx.constant("a");
        assert!(unify(&x, &a).is_err());
        assert!(unify(&x, &x).unwrap().is_empty());
    }

    #[test]
    fn test_unify_lists_shares_bindings() {
        let mut ctx = TestContext::new();
        let x = ctx.var();
        let a = ctx.constant("a");
        let b = ctx.constant("b");
        assert!(unify_lists(&[x.clone(), x.clone()], &[a.clone(), b]).is_err());
        let subst = unify_lists(&[x.clone(), a.clone()], &[a.clone(), x]).unwrap();
        assert_eq!(subst.len(), 1);
    }
}
