//! Terms
//!
//! Bound variables, free variables and constants are distinct variants so
//! unification only ever has to look at the `Free` case.

use super::signature::{Signature, SymbolId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a subterm: argument indices from the root
pub type Position = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// Variable bound by an enclosing quantifier
    Var(SymbolId),
    /// Free variable introduced during proof search
    Free(SymbolId),
    Const(SymbolId),
    App(SymbolId, Vec<Term>),
}

impl Term {
    /// Build a function application; nullary applications become constants
    pub fn app(symbol: SymbolId, args: Vec<Term>) -> Term {
        if args.is_empty() {
            Term::Const(symbol)
        } else {
            Term::App(symbol, args)
        }
    }

    pub fn symbol(&self) -> SymbolId {
        match self {
            Term::Var(s) | Term::Free(s) | Term::Const(s) | Term::App(s, _) => *s,
        }
    }

    pub fn args(&self) -> &[Term] {
        match self {
            Term::App(_, args) => args,
            _ => &[],
        }
    }

    pub fn is_free_variable(&self) -> bool {
        matches!(self, Term::Free(_))
    }

    /// No free and no bound variables
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) | Term::Free(_) => false,
            Term::Const(_) => true,
            Term::App(_, args) => args.iter().all(Term::is_ground),
        }
    }

    /// Number of symbol occurrences
    pub fn size(&self) -> usize {
        match self {
            Term::App(_, args) => 1 + args.iter().map(Term::size).sum::<usize>(),
            _ => 1,
        }
    }

    /// Occurs check for a free variable
    pub fn contains_free(&self, var: SymbolId) -> bool {
        match self {
            Term::Free(v) => *v == var,
            Term::App(_, args) => args.iter().any(|a| a.contains_free(var)),
            _ => false,
        }
    }

    pub fn contains_var(&self, var: SymbolId) -> bool {
        match self {
            Term::Var(v) => *v == var,
            Term::App(_, args) => args.iter().any(|a| a.contains_var(var)),
            _ => false,
        }
    }

    /// Whether `other` occurs in this term (including at the root)
    pub fn contains(&self, other: &Term) -> bool {
        if self == other {
            return true;
        }
        self.args().iter().any(|a| a.contains(other))
    }

    /// Collect free variables in first-occurrence order without duplicates
    pub fn collect_free_variables(&self, out: &mut Vec<SymbolId>) {
        match self {
            Term::Free(v) => {
                if !out.contains(v) {
                    out.push(*v);
                }
            }
            Term::App(_, args) => {
                for arg in args {
                    arg.collect_free_variables(out);
                }
            }
            _ => {}
        }
    }

    pub fn collect_bound_variables(&self, out: &mut Vec<SymbolId>) {
        match self {
            Term::Var(v) => {
                if !out.contains(v) {
                    out.push(*v);
                }
            }
            Term::App(_, args) => {
                for arg in args {
                    arg.collect_bound_variables(out);
                }
            }
            _ => {}
        }
    }

    pub fn free_variables(&self) -> Vec<SymbolId> {
        let mut vars = Vec::new();
        self.collect_free_variables(&mut vars);
        vars
    }

    /// Replace every occurrence of `from` by `to`.
    ///
    /// With `shallow` set, the arguments of function applications are left
    /// untouched, so only an occurrence at the root is replaced.
    pub fn replace(&self, from: &Term, to: &Term, shallow: bool) -> Term {
        if self == from {
            return to.clone();
        }
        match self {
            Term::App(f, args) if !shallow => {
                Term::App(*f, args.iter().map(|a| a.replace(from, to, false)).collect())
            }
            _ => self.clone(),
        }
    }

    pub fn subterm_at(&self, position: &[usize]) -> Option<&Term> {
        match position.split_first() {
            None => Some(self),
            Some((&i, rest)) => self.args().get(i)?.subterm_at(rest),
        }
    }

    /// Replace the subterm at `position`; positions that do not exist leave the term unchanged
    pub fn replace_at(&self, position: &[usize], with: Term) -> Term {
        match position.split_first() {
            None => with,
            Some((&i, rest)) => match self {
                Term::App(f, args) if i < args.len() => {
                    let mut new_args = args.clone();
                    new_args[i] = args[i].replace_at(rest, with);
                    Term::App(*f, new_args)
                }
                _ => self.clone(),
            },
        }
    }

    /// All positions with their subterms, root first
    pub fn positions(&self) -> Vec<(Position, &Term)> {
        let mut result = Vec::new();
        let mut stack: Vec<(Position, &Term)> = vec![(Vec::new(), self)];
        while let Some((pos, term)) = stack.pop() {
            if let Term::App(_, args) = term {
                for (i, arg) in args.iter().enumerate().rev() {
                    let mut child = pos.clone();
                    child.push(i);
                    stack.push((child, arg));
                }
            }
            result.push((pos, term));
        }
        result
    }

    pub fn display<'a>(&'a self, signature: &'a Signature) -> TermDisplay<'a> {
        TermDisplay {
            term: self,
            signature,
        }
    }
}

/// Display wrapper that resolves symbol names
pub struct TermDisplay<'a> {
    term: &'a Term,
    signature: &'a Signature,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            Term::Var(s) | Term::Free(s) | Term::Const(s) => {
                write!(f, "{}", self.signature.name(*s))
            }
            Term::App(s, args) => {
                write!(f, "{}(", self.signature.name(*s))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg.display(self.signature))?;
                }
                write!(f, ")")
            }
        }
    }
}
