//! Term ordering for the equality reasoner
//!
//! A simplified Knuth-Bendix ordering on ground terms: compare by size,
//! then by the head symbol's arity and name, then lexicographically by
//! arguments. Terms containing free variables are only comparable through
//! the subterm relation.

use super::signature::Signature;
use super::term::Term;

/// Result of comparing two terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrdering {
    Greater,
    Less,
    Equal,
    Incomparable,
}

impl TermOrdering {
    fn reverse(self) -> TermOrdering {
        match self {
            TermOrdering::Greater => TermOrdering::Less,
            TermOrdering::Less => TermOrdering::Greater,
            other => other,
        }
    }
}

impl From<std::cmp::Ordering> for TermOrdering {
    fn from(ord: std::cmp::Ordering) -> Self {
        match ord {
            std::cmp::Ordering::Greater => TermOrdering::Greater,
            std::cmp::Ordering::Less => TermOrdering::Less,
            std::cmp::Ordering::Equal => TermOrdering::Equal,
        }
    }
}

pub struct TermOrder<'a> {
    signature: &'a Signature,
}

impl<'a> TermOrder<'a> {
    pub fn new(signature: &'a Signature) -> Self {
        TermOrder { signature }
    }

    pub fn compare(&self, s: &Term, t: &Term) -> TermOrdering {
        if s == t {
            return TermOrdering::Equal;
        }
        if s.contains(t) {
            return TermOrdering::Greater;
        }
        if t.contains(s) {
            return TermOrdering::Less;
        }
        if s.free_variables().is_empty() && t.free_variables().is_empty() {
            self.compare_ground(s, t)
        } else {
            TermOrdering::Incomparable
        }
    }

    pub fn greater(&self, s: &Term, t: &Term) -> bool {
        self.compare(s, t) == TermOrdering::Greater
    }

    fn compare_ground(&self, s: &Term, t: &Term) -> TermOrdering {
        let by_size = TermOrdering::from(s.size().cmp(&t.size()));
        if by_size != TermOrdering::Equal {
            return by_size;
        }
        let by_head = self.precedence(s, t);
        if by_head != TermOrdering::Equal {
            return by_head;
        }
        for (a, b) in s.args().iter().zip(t.args().iter()) {
            match self.compare_ground(a, b) {
                TermOrdering::Equal => continue,
                other => return other,
            }
        }
        TermOrdering::Equal
    }

    fn precedence(&self, s: &Term, t: &Term) -> TermOrdering {
        let (f, g) = (s.symbol(), t.symbol());
        if f == g {
            return TermOrdering::Equal;
        }
        let by_arity = TermOrdering::from(s.args().len().cmp(&t.args().len()));
        if by_arity != TermOrdering::Equal {
            return by_arity;
        }
        TermOrdering::from(self.signature.name(f).cmp(self.signature.name(g)))
    }

    /// Reversed comparison, for callers that hold the pair the other way round
    pub fn compare_reversed(&self, s: &Term, t: &Term) -> TermOrdering {
        self.compare(t, s).reverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Sort, SymbolKind};

    struct TestContext {
        sig: Signature,
    }

    impl TestContext {
        fn new() -> Self {
            TestContext {
                sig: Signature::new(),
            }
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
    fn constants_ordered_by_name() {
        let mut ctx = TestContext::new();
        let d = ctx.constant("d");
        let b = ctx.constant("b");
        let order = TermOrder::new(&ctx.sig);
        assert_eq!(order.compare(&d, &b), TermOrdering::Greater);
        assert_eq!(order.compare(&b, &d), TermOrdering::Less);
        assert_eq!(order.compare_reversed(&d, &b), TermOrdering::Greater);
    }

    #[test]
    fn larger_terms_are_greater() {
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let z = ctx.constant("z");
        let fa = ctx.func("f", vec![a.clone()]);
        let order = TermOrder::new(&ctx.sig);
        assert!(order.greater(&fa, &z));
        assert!(order.greater(&fa, &a));
    }

    #[test]
    fn free_variables_are_incomparable_except_subterms() {
        let mut ctx = TestContext::new();
        let a = ctx.constant("a");
        let x = Term::Free(ctx.sig.fresh_free_variable(Sort::Individual));
        let fx = ctx.func("f", vec![x.clone()]);
        let order = TermOrder::new(&ctx.sig);
        assert_eq!(order.compare(&x, &a), TermOrdering::Incomparable);
        assert_eq!(order.compare(&fx, &x), TermOrdering::Greater);
    }
}
