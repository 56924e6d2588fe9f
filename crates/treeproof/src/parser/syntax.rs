//! Grammar for formulas
//!
//! Produces an untyped syntax tree; names are resolved against the
//! signature in a second pass.

use crate::error::ParseError;
use crate::logic::{BinaryOp, ModalOp, Quantifier};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, multispace0, satisfy},
    combinator::{map, recognize, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TermExpr {
    Name(String),
    Apply(String, Vec<TermExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Lowercase letter standing alone in formula position
    Sentence(String),
    Atom(String, Vec<TermExpr>),
    Identity(TermExpr, TermExpr),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Quantified(Quantifier, String, Box<Expr>),
    Modal(ModalOp, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SyntaxErrorKind {
    Unexpected,
    MissingArgument(String),
    Unbalanced,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError<'a> {
    input: &'a str,
    kind: SyntaxErrorKind,
}

impl<'a> nom::error::ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: nom::error::ErrorKind) -> Self {
        SyntaxError {
            input,
            kind: SyntaxErrorKind::Unexpected,
        }
    }

    fn append(_input: &'a str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

fn failure(input: &str, kind: SyntaxErrorKind) -> nom::Err<SyntaxError<'_>> {
    nom::Err::Failure(SyntaxError { input, kind })
}

/// Parse a complete formula; positions in errors are byte offsets into `source`
pub(crate) fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let position = |rest: &str| source.len() - rest.len();
    match delimited(multispace0, formula, multispace0)(source) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) if rest.starts_with(')') => Err(ParseError::Unbalanced {
            position: position(rest),
        }),
        Ok((rest, _)) => Err(ParseError::Unparseable {
            position: position(rest),
            fragment: rest.trim_end().to_string(),
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(match e.kind {
            SyntaxErrorKind::Unexpected => ParseError::Unparseable {
                position: position(e.input),
                fragment: e.input.trim_end().to_string(),
            },
            SyntaxErrorKind::MissingArgument(operator) => ParseError::MissingArgument {
                operator,
                position: position(e.input),
            },
            SyntaxErrorKind::Unbalanced => ParseError::Unbalanced {
                position: position(e.input),
            },
        }),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Unparseable {
            position: source.len(),
            fragment: String::new(),
        }),
    }
}

fn formula(input: &str) -> PResult<'_, Expr> {
    biconditional(input)
}

/// Operand of `operator`; failing to find one is fatal
fn operand<'a>(
    operator: &'static str,
    parser: fn(&'a str) -> PResult<'a, Expr>,
) -> impl FnMut(&'a str) -> PResult<'a, Expr> {
    move |input: &'a str| {
        let (input, _) = multispace0(input)?;
        parser(input).map_err(|e| match e {
            nom::Err::Error(_) => {
                failure(input, SyntaxErrorKind::MissingArgument(operator.to_string()))
            }
            other => other,
        })
    }
}

/// Right associative
fn biconditional(input: &str) -> PResult<'_, Expr> {
    let (input, left) = implication(input)?;
    let (rest, _) = multispace0(input)?;
    match alt((tag::<_, _, SyntaxError>("↔"), tag("<->")))(rest) {
        Ok((rest, _)) => {
            let (rest, right) = operand("↔", biconditional)(rest)?;
            Ok((rest, Expr::Binary(BinaryOp::Iff, Box::new(left), Box::new(right))))
        }
        Err(_) => Ok((input, left)),
    }
}

/// Right associative
fn implication(input: &str) -> PResult<'_, Expr> {
    let (input, left) = disjunction(input)?;
    let (rest, _) = multispace0(input)?;
    match alt((tag::<_, _, SyntaxError>("→"), tag("->")))(rest) {
        Ok((rest, _)) => {
            let (rest, right) = operand("→", implication)(rest)?;
            Ok((rest, Expr::Binary(BinaryOp::Implies, Box::new(left), Box::new(right))))
        }
        Err(_) => Ok((input, left)),
    }
}

fn disjunction(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = conjunction(input)?;
    loop {
        let (rest, _) = multispace0(input)?;
        match alt((tag::<_, _, SyntaxError>("∨"), tag("|")))(rest) {
            Ok((rest, _)) => {
                let (rest, right) = operand("∨", conjunction)(rest)?;
                left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
                input = rest;
            }
            Err(_) => return Ok((input, left)),
        }
    }
}

fn conjunction(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = unary(input)?;
    loop {
        let (rest, _) = multispace0(input)?;
        match alt((tag::<_, _, SyntaxError>("∧"), tag("&")))(rest) {
            Ok((rest, _)) => {
                let (rest, right) = operand("∧", unary)(rest)?;
                left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
                input = rest;
            }
            Err(_) => return Ok((input, left)),
        }
    }
}

fn unary(input: &str) -> PResult<'_, Expr> {
    alt((
        negation,
        quantified,
        modal,
        parenthesized,
        identity,
        predicate_atom,
        sentence_letter,
    ))(input)
}

fn negation(input: &str) -> PResult<'_, Expr> {
    let (input, _) = alt((tag("¬"), tag("~")))(input)?;
    let (input, sub) = operand("¬", unary)(input)?;
    Ok((input, Expr::Not(Box::new(sub))))
}

fn quantified(input: &str) -> PResult<'_, Expr> {
    let (input, quantifier) = alt((
        value(Quantifier::Forall, alt((tag("∀"), tag("!")))),
        value(Quantifier::Exists, alt((tag("∃"), tag("?")))),
    ))(input)?;
    let symbol = quantifier.symbol();
    let (input, _) = multispace0(input)?;
    let (input, variable) = lower_ident(input)
        .map_err(|_| failure(input, SyntaxErrorKind::MissingArgument(symbol.to_string())))?;
    let (input, body) = operand(symbol, unary)(input)?;
    Ok((
        input,
        Expr::Quantified(quantifier, variable.to_string(), Box::new(body)),
    ))
}

fn modal(input: &str) -> PResult<'_, Expr> {
    let (input, op) = alt((
        value(ModalOp::Necessity, alt((tag("□"), tag("[]")))),
        value(ModalOp::Possibility, alt((tag("◇"), tag("◊"), tag("<>")))),
    ))(input)?;
    let (input, sub) = operand(op.symbol(), unary)(input)?;
    Ok((input, Expr::Modal(op, Box::new(sub))))
}

fn parenthesized(input: &str) -> PResult<'_, Expr> {
    let (input, _) = char('(')(input)?;
    let (input, inner) = operand("(", formula)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char::<_, SyntaxError>(')')(input)
        .map_err(|_| failure(input, SyntaxErrorKind::Unbalanced))?;
    Ok((input, inner))
}

fn identity(input: &str) -> PResult<'_, Expr> {
    let (input, left) = term(input)?;
    let (input, _) = multispace0(input)?;
    let (input, negated) = alt((
        value(false, tag("=")),
        value(true, tag("≠")),
        value(true, tag("!=")),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, right) =
        term(input).map_err(|_| failure(input, SyntaxErrorKind::MissingArgument("=".into())))?;
    let atom = Expr::Identity(left, right);
    Ok((
        input,
        if negated {
            Expr::Not(Box::new(atom))
        } else {
            atom
        },
    ))
}

/// `F(a, f(b))` or `Fab`
fn predicate_atom(input: &str) -> PResult<'_, Expr> {
    let (input, name) = upper_ident(input)?;
    if let Ok((rest, _)) = char::<_, SyntaxError>('(')(input) {
        let (rest, args) = argument_list(rest)
            .map_err(|_| failure(rest, SyntaxErrorKind::MissingArgument(name.to_string())))?;
        return Ok((rest, Expr::Atom(name.to_string(), args)));
    }
    let (input, args) = many0(map(lower_ident, |n: &str| TermExpr::Name(n.to_string())))(input)?;
    Ok((input, Expr::Atom(name.to_string(), args)))
}

fn sentence_letter(input: &str) -> PResult<'_, Expr> {
    map(lower_ident, |n: &str| Expr::Sentence(n.to_string()))(input)
}

fn term(input: &str) -> PResult<'_, TermExpr> {
    let (input, name) = lower_ident(input)?;
    if let Ok((rest, _)) = char::<_, SyntaxError>('(')(input) {
        let (rest, args) = argument_list(rest)?;
        return Ok((rest, TermExpr::Apply(name.to_string(), args)));
    }
    Ok((input, TermExpr::Name(name.to_string())))
}

/// Arguments after an opening parenthesis, including the closing one
fn argument_list(input: &str) -> PResult<'_, Vec<TermExpr>> {
    let (input, args) = separated_list1(
        tuple((multispace0, char(','), multispace0)),
        preceded(multispace0, term),
    )(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char::<_, SyntaxError>(')')(input)
        .map_err(|_| failure(input, SyntaxErrorKind::Unbalanced))?;
    Ok((input, args))
}

fn lower_ident(input: &str) -> PResult<'_, &str> {
    recognize(pair(satisfy(|c| c.is_ascii_lowercase()), digit0))(input)
}

fn upper_ident(input: &str) -> PResult<'_, &str> {
    recognize(pair(satisfy(|c| c.is_ascii_uppercase()), digit0))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> TermExpr {
        TermExpr::Name(n.to_string())
    }

    fn sentence(n: &str) -> Box<Expr> {
        Box::new(Expr::Sentence(n.to_string()))
    }

    #[test]
    fn precedence_and_associativity() {
        let expr = parse_expr("p ∧ q ∨ r → s").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Implies,
                Box::new(Expr::Binary(
                    BinaryOp::Or,
                    Box::new(Expr::Binary(BinaryOp::And, sentence("p"), sentence("q"))),
                    sentence("r"),
                )),
                sentence("s"),
            )
        );

        let expr = parse_expr("p -> q -> r").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Implies,
                sentence("p"),
                Box::new(Expr::Binary(BinaryOp::Implies, sentence("q"), sentence("r"))),
            )
        );
    }

    #[test]
    fn juxtaposed_and_parenthesised_arguments() {
        assert_eq!(
            parse_expr("Fab").unwrap(),
            Expr::Atom("F".into(), vec![name("a"), name("b")])
        );
        assert_eq!(
            parse_expr("R1(x, f(y))").unwrap(),
            Expr::Atom(
                "R1".into(),
                vec![name("x"), TermExpr::Apply("f".into(), vec![name("y")])]
            )
        );
    }

    #[test]
    fn quantifiers_and_modalities() {
        let expr = parse_expr("∀x □¬Fx").unwrap();
        assert_eq!(
            expr,
            Expr::Quantified(
                Quantifier::Forall,
                "x".into(),
                Box::new(Expr::Modal(
                    ModalOp::Necessity,
                    Box::new(Expr::Not(Box::new(Expr::Atom("F".into(), vec![name("x")]))))
                ))
            )
        );
        assert_eq!(parse_expr("!x Fx").unwrap(), parse_expr("∀xFx").unwrap());
        assert_eq!(parse_expr("<>p").unwrap(), parse_expr("◇p").unwrap());
    }

    #[test]
    fn identity_and_inequality() {
        assert_eq!(
            parse_expr("a = f(b)").unwrap(),
            Expr::Identity(name("a"), TermExpr::Apply("f".into(), vec![name("b")]))
        );
        assert_eq!(
            parse_expr("a != b").unwrap(),
            Expr::Not(Box::new(Expr::Identity(name("a"), name("b"))))
        );
        assert_eq!(parse_expr("a≠b").unwrap(), parse_expr("a != b").unwrap());
    }

    #[test]
    fn errors() {
        assert_eq!(parse_expr("  "), Err(ParseError::Empty));
        assert_eq!(
            parse_expr("p ∧"),
            Err(ParseError::MissingArgument {
                operator: "∧".into(),
                position: "p ∧".len()
            })
        );
        assert!(matches!(
            parse_expr("(p ∧ q"),
            Err(ParseError::Unbalanced { .. })
        ));
        assert!(matches!(
            parse_expr("p q"),
            Err(ParseError::Unparseable { position: 2, .. })
        ));
        assert!(matches!(
            parse_expr("p)"),
            Err(ParseError::Unbalanced { position: 1 })
        ));
    }
}
