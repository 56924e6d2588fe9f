//! Text input
//!
//! A problem is a comma separated list of premises, a turnstile (`⊨` or
//! `|=`) and a conclusion. Either side may be empty, and without a
//! turnstile the whole input is a single conclusion.
//!
//! Parsing happens in two passes: `syntax` builds an untyped tree, then the
//! resolver interns names. The resolver works on a copy of the signature,
//! so a failed parse leaves the caller's signature untouched.

mod syntax;

use crate::error::ParseError;
use crate::logic::{Formula, Signature, Sort, SymbolId, SymbolKind, Term};
use syntax::{Expr, TermExpr};

/// Premises and conclusion of an argument, with the signature they were interned in
#[derive(Debug, Clone)]
pub struct Problem {
    pub premises: Vec<Formula>,
    pub conclusion: Option<Formula>,
    pub signature: Signature,
}

impl Problem {
    /// Premises followed by the negated conclusion: the tableau's root formulas
    pub fn initial_formulas(&self) -> Vec<Formula> {
        let mut formulas = self.premises.clone();
        if let Some(conclusion) = &self.conclusion {
            formulas.push(Formula::negation(conclusion.clone()));
        }
        formulas
    }

    pub fn is_modal(&self) -> bool {
        self.premises
            .iter()
            .chain(self.conclusion.iter())
            .any(Formula::contains_modal)
    }
}

/// Parse one formula, registering its symbols in `signature`
pub fn parse_formula(input: &str, signature: &mut Signature) -> Result<Formula, ParseError> {
    let expr = syntax::parse_expr(input)?;
    let mut scratch = signature.clone();
    let formula = Resolver::new(&mut scratch).formula(&expr)?;
    *signature = scratch;
    Ok(formula)
}

/// Parse `premise, premise ⊨ conclusion`
pub fn parse_problem(input: &str) -> Result<Problem, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut signature = Signature::new();

    let (premise_text, conclusion_text, conclusion_offset) = match find_turnstile(input) {
        Some((start, end)) => (&input[..start], &input[end..], end),
        None => ("", input, 0),
    };

    let mut premises = Vec::new();
    if !premise_text.trim().is_empty() {
        for (offset, segment) in split_top_level(premise_text) {
            if segment.trim().is_empty() {
                return Err(ParseError::MissingArgument {
                    operator: ",".into(),
                    position: offset,
                });
            }
            let formula =
                parse_formula(segment, &mut signature).map_err(|e| shift(e, offset))?;
            premises.push(formula);
        }
    }

    let conclusion = if conclusion_text.trim().is_empty() {
        None
    } else {
        Some(
            parse_formula(conclusion_text, &mut signature)
                .map_err(|e| shift(e, conclusion_offset))?,
        )
    };

    if premises.is_empty() && conclusion.is_none() {
        return Err(ParseError::Empty);
    }
    Ok(Problem {
        premises,
        conclusion,
        signature,
    })
}

/// Byte range of the first turnstile
fn find_turnstile(input: &str) -> Option<(usize, usize)> {
    let unicode = input.find('⊨').map(|i| (i, i + '⊨'.len_utf8()));
    let ascii = input.find("|=").map(|i| (i, i + 2));
    match (unicode, ascii) {
        (Some(u), Some(a)) => Some(if u.0 < a.0 { u } else { a }),
        (u, a) => u.or(a),
    }
}

/// Split at commas outside parentheses, keeping each segment's byte offset
fn split_top_level(text: &str) -> Vec<(usize, &str)> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push((start, &text[start..]));
    segments
}

fn shift(error: ParseError, offset: usize) -> ParseError {
    match error {
        ParseError::Unparseable { position, fragment } => ParseError::Unparseable {
            position: position + offset,
            fragment,
        },
        ParseError::MissingArgument { operator, position } => ParseError::MissingArgument {
            operator,
            position: position + offset,
        },
        ParseError::Unbalanced { position } => ParseError::Unbalanced {
            position: position + offset,
        },
        other => other,
    }
}

struct Resolver<'a> {
    signature: &'a mut Signature,
    bound: Vec<(String, SymbolId)>,
}

impl<'a> Resolver<'a> {
    fn new(signature: &'a mut Signature) -> Self {
        Resolver {
            signature,
            bound: Vec::new(),
        }
    }

    fn formula(&mut self, expr: &Expr) -> Result<Formula, ParseError> {
        Ok(match expr {
            Expr::Sentence(name) => {
                let id = self.signature.register(name, SymbolKind::Predicate, 0)?;
                Formula::atom(id, Vec::new())
            }
            Expr::Atom(name, args) => {
                let terms = args
                    .iter()
                    .map(|a| self.term(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let id = self
                    .signature
                    .register(name, SymbolKind::Predicate, terms.len())?;
                Formula::atom(id, terms)
            }
            Expr::Identity(left, right) => Formula::equality(self.term(left)?, self.term(right)?),
            Expr::Not(sub) => Formula::negation(self.formula(sub)?),
            Expr::Binary(op, left, right) => {
                let left = self.formula(left)?;
                let right = self.formula(right)?;
                Formula::binary(*op, left, right)
            }
            Expr::Quantified(quantifier, name, body) => {
                let variable = self.signature.register(name, SymbolKind::Variable, 0)?;
                self.bound.push((name.clone(), variable));
                let body = self.formula(body);
                self.bound.pop();
                Formula::quantified(*quantifier, variable, Sort::Individual, body?)
            }
            Expr::Modal(op, sub) => Formula::modal(*op, self.formula(sub)?),
        })
    }

    fn term(&mut self, expr: &TermExpr) -> Result<Term, ParseError> {
        match expr {
            TermExpr::Name(name) => {
                if let Some((_, id)) = self.bound.iter().rev().find(|(n, _)| n == name) {
                    return Ok(Term::Var(*id));
                }
                Ok(Term::Const(
                    self.signature.register(name, SymbolKind::Constant, 0)?,
                ))
            }
            TermExpr::Apply(name, args) => {
                let args = args
                    .iter()
                    .map(|a| self.term(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let id = self
                    .signature
                    .register(name, SymbolKind::Function, args.len())?;
                Ok(Term::App(id, args))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignatureError;
    use crate::logic::{ExpansionType, FormulaKind};

    #[test]
    fn parses_a_problem() {
        let problem = parse_problem("∀x(Fx → Gx), Fa ⊨ Ga").unwrap();
        assert_eq!(problem.premises.len(), 2);
        let sig = &problem.signature;
        assert_eq!(
            problem.premises[0].display(sig).to_string(),
            "∀x(Fx → Gx)"
        );
        assert_eq!(problem.conclusion.as_ref().unwrap().display(sig).to_string(), "Ga");

        let initial = problem.initial_formulas();
        assert_eq!(initial.len(), 3);
        assert_eq!(initial[2].display(sig).to_string(), "¬Ga");
        assert!(!problem.is_modal());
    }

    #[test]
    fn commas_inside_arguments_do_not_split() {
        let problem = parse_problem("R(a, f(b, c)), p |= q").unwrap();
        assert_eq!(problem.premises.len(), 2);
        assert_eq!(
            problem.premises[0].display(&problem.signature).to_string(),
            "R(a,f(b,c))"
        );
    }

    #[test]
    fn either_side_may_be_empty() {
        let theorem = parse_problem("⊨ p ∨ ¬p").unwrap();
        assert!(theorem.premises.is_empty());
        assert!(theorem.conclusion.is_some());

        let consistency = parse_problem("p, ¬q |=").unwrap();
        assert_eq!(consistency.premises.len(), 2);
        assert!(consistency.conclusion.is_none());
        assert_eq!(consistency.initial_formulas().len(), 2);

        let bare = parse_problem("□p → p").unwrap();
        assert!(bare.premises.is_empty());
        assert!(bare.is_modal());

        assert!(matches!(parse_problem(" ⊨ "), Err(ParseError::Empty)));
    }

    #[test]
    fn bound_names_become_variables() {
        let mut sig = Signature::new();
        let f = parse_formula("∀x∃y Rxy", &mut sig).unwrap();
        assert_eq!(f.expansion(), ExpansionType::Gamma);
        let x = sig.lookup("x").unwrap();
        assert_eq!(sig.kind(x), SymbolKind::Variable);
        match f.kind() {
            FormulaKind::Quantified { matrix, .. } => match matrix.kind() {
                FormulaKind::Quantified { matrix, .. } => {
                    let (_, _, args) = matrix.literal_parts().unwrap();
                    assert!(matches!(args[0], Term::Var(_)));
                    assert!(matches!(args[1], Term::Var(_)));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failed_parse_leaves_signature_unchanged() {
        let mut sig = Signature::new();
        parse_formula("Fa", &mut sig).unwrap();
        let before = sig.len();
        let err = parse_formula("Gb ∧ Fab", &mut sig).unwrap_err();
        assert_eq!(
            err,
            ParseError::Signature(SignatureError::ArityMismatch {
                name: "F".into(),
                expected: 1,
                found: 2
            })
        );
        assert_eq!(sig.len(), before);
        assert!(sig.lookup("G").is_none());
    }

    #[test]
    fn error_positions_are_relative_to_the_whole_input() {
        let err = parse_problem("p, q ∧ ⊨ r").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingArgument {
                operator: "∧".into(),
                position: "p, q ∧ ".len()
            }
        );
        assert!(matches!(
            parse_problem("p,, q ⊨ r"),
            Err(ParseError::MissingArgument { position: 2, .. })
        ));
    }

    #[test]
    fn sentence_letter_cannot_be_a_constant() {
        let mut sig = Signature::new();
        assert!(matches!(
            parse_formula("p ∧ Fp", &mut sig),
            Err(ParseError::Signature(SignatureError::KindConflict { .. }))
        ));
    }
}
