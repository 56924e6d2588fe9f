//! Symbol registry for one proof session
//!
//! Every name that appears in a problem (predicates, functions, constants,
//! bound variables) is interned here and referred to by a `SymbolId`.
//! Symbols introduced during the search (free variables, Skolem terms,
//! world constants) are allocated here as well, with names drawn from
//! reserved non-ASCII prefixes so they can never collide with parsed input.

use crate::error::SignatureError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// ID for an interned symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    /// Get the raw ID value (for debugging/serialization)
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Predicate,
    Function,
    Constant,
    /// Variable bound by a quantifier
    Variable,
    /// Free variable introduced by a gamma expansion
    FreeVariable,
    /// Skolem function or constant introduced by a delta expansion
    Skolem,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Predicate => "predicate",
            SymbolKind::Function => "function",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::FreeVariable => "free variable",
            SymbolKind::Skolem => "skolem term",
        };
        write!(f, "{}", name)
    }
}

/// Sort of a term: ordinary individuals or possible worlds
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sort {
    Individual,
    World,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub arity: usize,
    pub sort: Sort,
}

pub const FREE_VARIABLE_PREFIX: &str = "ξ";
pub const WORLD_VARIABLE_PREFIX: &str = "ζ";
pub const SKOLEM_PREFIX: &str = "φ";
pub const WORLD_SKOLEM_PREFIX: &str = "ω";
pub const BOUND_VARIABLE_PREFIX: &str = "ν";
pub const WORLD_BOUND_PREFIX: &str = "υ";
pub const INITIAL_WORLD: &str = "ω0";

#[derive(Debug, Clone)]
pub struct Signature {
    symbols: Vec<SymbolInfo>,
    lookup: HashMap<String, SymbolId>,
    free_counter: usize,
    world_free_counter: usize,
    skolem_counter: usize,
    world_skolem_counter: usize,
    bound_counter: usize,
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

impl Signature {
    /// The identity predicate
    pub const EQUALITY: SymbolId = SymbolId(0);
    /// The accessibility relation between worlds
    pub const ACCESSIBILITY: SymbolId = SymbolId(1);

    pub fn new() -> Self {
        let mut signature = Signature {
            symbols: Vec::new(),
            lookup: HashMap::new(),
            free_counter: 0,
            world_free_counter: 0,
            skolem_counter: 0,
            world_skolem_counter: 0,
            bound_counter: 0,
        };
        signature.insert("=", SymbolKind::Predicate, 2, Sort::Individual);
        signature.insert("ℛ", SymbolKind::Predicate, 2, Sort::World);
        signature
    }

    fn insert(&mut self, name: &str, kind: SymbolKind, arity: usize, sort: Sort) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolInfo {
            name: name.to_string(),
            kind,
            arity,
            sort,
        });
        self.lookup.insert(name.to_string(), id);
        id
    }

    /// Register an individual-sorted symbol, or return the existing one
    pub fn register(
        &mut self,
        name: &str,
        kind: SymbolKind,
        arity: usize,
    ) -> Result<SymbolId, SignatureError> {
        self.register_sorted(name, kind, arity, Sort::Individual)
    }

    /// Register a symbol of the given sort, or return the existing one.
    ///
    /// Reusing a name with a different kind or arity is an error.
    pub fn register_sorted(
        &mut self,
        name: &str,
        kind: SymbolKind,
        arity: usize,
        sort: Sort,
    ) -> Result<SymbolId, SignatureError> {
        if let Some(&id) = self.lookup.get(name) {
            let info = &self.symbols[id.0 as usize];
            if info.kind != kind {
                return Err(SignatureError::KindConflict {
                    name: name.to_string(),
                    existing: info.kind,
                    requested: kind,
                });
            }
            if info.arity != arity {
                return Err(SignatureError::ArityMismatch {
                    name: name.to_string(),
                    expected: info.arity,
                    found: arity,
                });
            }
            return Ok(id);
        }
        Ok(self.insert(name, kind, arity, sort))
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.lookup.get(name).copied()
    }

    pub fn info(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.0 as usize]
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.symbols[id.0 as usize].name
    }

    pub fn kind(&self, id: SymbolId) -> SymbolKind {
        self.symbols[id.0 as usize].kind
    }

    pub fn arity(&self, id: SymbolId) -> usize {
        self.symbols[id.0 as usize].arity
    }

    pub fn sort(&self, id: SymbolId) -> Sort {
        self.symbols[id.0 as usize].sort
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbols of one kind, in registration order
    pub fn symbols_of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(move |(_, info)| info.kind == kind)
            .map(|(i, _)| SymbolId(i as u32))
    }

    /// World-sorted constants and Skolem symbols
    pub fn world_symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, info)| {
                info.sort == Sort::World
                    && matches!(info.kind, SymbolKind::Constant | SymbolKind::Skolem)
            })
            .map(|(i, _)| SymbolId(i as u32))
    }

    // =========================================================================
    // Fresh symbols
    // =========================================================================

    pub fn fresh_free_variable(&mut self, sort: Sort) -> SymbolId {
        let name = match sort {
            Sort::Individual => {
                self.free_counter += 1;
                format!("{}{}", FREE_VARIABLE_PREFIX, self.free_counter)
            }
            Sort::World => {
                self.world_free_counter += 1;
                format!("{}{}", WORLD_VARIABLE_PREFIX, self.world_free_counter)
            }
        };
        self.insert(&name, SymbolKind::FreeVariable, 0, sort)
    }

    pub fn fresh_skolem(&mut self, arity: usize, sort: Sort) -> SymbolId {
        let name = match sort {
            Sort::Individual => {
                self.skolem_counter += 1;
                format!("{}{}", SKOLEM_PREFIX, self.skolem_counter)
            }
            Sort::World => {
                self.world_skolem_counter += 1;
                format!("{}{}", WORLD_SKOLEM_PREFIX, self.world_skolem_counter)
            }
        };
        self.insert(&name, SymbolKind::Skolem, arity, sort)
    }

    /// A bound variable that does not occur anywhere yet
    pub fn fresh_bound_variable(&mut self, sort: Sort) -> SymbolId {
        self.bound_counter += 1;
        let prefix = match sort {
            Sort::Individual => BOUND_VARIABLE_PREFIX,
            Sort::World => WORLD_BOUND_PREFIX,
        };
        let name = format!("{}{}", prefix, self.bound_counter);
        self.insert(&name, SymbolKind::Variable, 0, sort)
    }

    /// The world at which the input formulas are evaluated
    pub fn initial_world(&mut self) -> SymbolId {
        match self.lookup(INITIAL_WORLD) {
            Some(id) => id,
            None => self.insert(INITIAL_WORLD, SymbolKind::Constant, 0, Sort::World),
        }
    }
}
