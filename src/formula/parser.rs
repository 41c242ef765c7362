//! Infix-expression parser for propositional formulas.
//!
//! The grammar (see `grammar.pest`) is a plain precedence ladder: prefix negation binds
//! tightest, then `&`/`and`, then `|`/`or`, then `^`/`xor`, then the loosest tier of
//! `==`/`<=>`, `=>`/`->`, `<=`/`<-` — all sharing one precedence level, left-associative.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::Formula;
use crate::errors::FormulaError;

#[derive(Parser)]
#[grammar = "formula/grammar.pest"]
pub struct FormulaParser;

/// Parses an infix propositional-formula string into a [`Formula`] tree.
pub fn parse(input: &str) -> Result<Formula, FormulaError> {
    let mut pairs = FormulaParser::parse(Rule::formula, input)?;
    let formula_pair = pairs.next().expect("formula rule always produces one pair");
    let level5 = formula_pair
        .into_inner()
        .next()
        .expect("formula always wraps a level5 expression");
    Ok(build_level5(level5))
}

fn build_level5(pair: Pair<Rule>) -> Formula {
    let mut inner = pair.into_inner();
    let mut acc = build_level4(inner.next().unwrap());
    loop {
        let Some(op) = inner.next() else { break };
        let rhs = build_level4(inner.next().unwrap());
        acc = match op.as_str() {
            "<=>" | "==" => Formula::eq(acc, rhs),
            "=>" | "->" => Formula::rimpl(acc, rhs),
            "<=" | "<-" => Formula::limpl(acc, rhs),
            other => unreachable!("unexpected level5 operator {other:?}"),
        };
    }
    acc
}

fn build_level4(pair: Pair<Rule>) -> Formula {
    let mut inner = pair.into_inner();
    let mut acc = build_level3(inner.next().unwrap());
    while let Some(_op) = inner.next() {
        let rhs = build_level3(inner.next().unwrap());
        acc = Formula::xor(acc, rhs);
    }
    acc
}

fn build_level3(pair: Pair<Rule>) -> Formula {
    let mut inner = pair.into_inner();
    let mut acc = build_level2(inner.next().unwrap());
    while let Some(_op) = inner.next() {
        let rhs = build_level2(inner.next().unwrap());
        acc = Formula::or(acc, rhs);
    }
    acc
}

fn build_level2(pair: Pair<Rule>) -> Formula {
    let mut inner = pair.into_inner();
    let mut acc = build_level1(inner.next().unwrap());
    while let Some(_op) = inner.next() {
        let rhs = build_level1(inner.next().unwrap());
        acc = Formula::and(acc, rhs);
    }
    acc
}

fn build_level1(pair: Pair<Rule>) -> Formula {
    let mut inner = pair.into_inner().peekable();
    let mut negations = 0usize;
    while let Some(p) = inner.peek() {
        if p.as_rule() == Rule::not {
            negations += 1;
            inner.next();
        } else {
            break;
        }
    }
    let atom = build_atom(inner.next().expect("level1 always ends in an atom"));
    apply_negations(atom, negations)
}

fn apply_negations(atom: Formula, negations: usize) -> Formula {
    if negations == 0 {
        return atom;
    }
    // A single leading '-' directly in front of a bare literal folds into a negative
    // literal; everything else (parenthesized subexpressions, or two or more stacked
    // negations) wraps in explicit `Not` nodes. Both shapes are accepted by `to_cnf`.
    match atom {
        Formula::Literal(x) => {
            let mut f = Formula::Literal(-x);
            for _ in 1..negations {
                f = Formula::not(f);
            }
            f
        }
        other => {
            let mut f = other;
            for _ in 0..negations {
                f = Formula::not(f);
            }
            f
        }
    }
}

fn build_atom(pair: Pair<Rule>) -> Formula {
    let inner = pair.into_inner().next().expect("atom wraps number or group");
    match inner.as_rule() {
        Rule::number => {
            let value: i64 = inner.as_str().parse().expect("ASCII_DIGIT+ always parses");
            Formula::Literal(value)
        }
        Rule::group => {
            let level5 = inner.into_inner().next().expect("group wraps level5");
            build_level5(level5)
        }
        other => unreachable!("unexpected atom child {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precedence() {
        // & binds tighter than |
        let f = parse("1 & 2 | 3").unwrap();
        assert_eq!(f, Formula::or(Formula::and(Formula::Literal(1), Formula::Literal(2)), Formula::Literal(3)));
    }

    #[test]
    fn parses_keywords_and_symbols_equivalently() {
        assert_eq!(parse("1 and 2").unwrap(), parse("1 & 2").unwrap());
        assert_eq!(parse("1 or 2").unwrap(), parse("1 | 2").unwrap());
        assert_eq!(parse("1 xor 2").unwrap(), parse("1 ^ 2").unwrap());
    }

    #[test]
    fn parses_implications() {
        assert_eq!(parse("1 => 2").unwrap(), Formula::rimpl(Formula::Literal(1), Formula::Literal(2)));
        assert_eq!(parse("1 -> 2").unwrap(), Formula::rimpl(Formula::Literal(1), Formula::Literal(2)));
        assert_eq!(parse("1 <= 2").unwrap(), Formula::limpl(Formula::Literal(1), Formula::Literal(2)));
        assert_eq!(parse("1 <- 2").unwrap(), Formula::limpl(Formula::Literal(1), Formula::Literal(2)));
        assert_eq!(parse("1 <=> 2").unwrap(), Formula::eq(Formula::Literal(1), Formula::Literal(2)));
        assert_eq!(parse("1 == 2").unwrap(), Formula::eq(Formula::Literal(1), Formula::Literal(2)));
    }

    #[test]
    fn unary_minus_on_bare_literal_is_a_negative_literal() {
        assert_eq!(parse("-5").unwrap(), Formula::Literal(-5));
    }

    #[test]
    fn unary_minus_on_group_wraps_not() {
        assert_eq!(parse("-(1 & 2)").unwrap(), Formula::not(Formula::and(Formula::Literal(1), Formula::Literal(2))));
    }

    #[test]
    fn parens_group_and_repeat_in_brackets() {
        assert_eq!(parse("(1 | 2)").unwrap(), parse("[1 | 2]").unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("1 &&").is_err());
        assert!(parse("").is_err());
        assert!(parse("()").is_err());
    }
}
