//! Conversion of a [`Formula`](super::Formula) tree into a reduced set of CNF clauses.
//!
//! The algorithm keeps a worklist of clause fragments (each fragment still a bag of
//! sub-formulas, not yet all literals). It repeatedly pops a fragment, rewrites the first
//! non-literal element it contains according to the table below, and pushes the result
//! back onto the worklist — splitting into two fragments for the connectives that do not
//! distribute into a single clause. A fragment made entirely of literals is canonicalized
//! (sorted, deduplicated) and folded into the result with [`insert_reduce`], which drops
//! tautologies and keeps the result free of subsumed clauses.

use super::Formula;

/// Rewrites `formula` into an equisatisfiable list of clauses, each a literal list.
///
/// The result is a minimal (subsumption-free, tautology-free) clause set, sorted by
/// ascending clause length, but it is not itself a formula equivalent to the input — CNF
/// conversion of non-clausal connectives is equisatisfiable, not equivalence-preserving,
/// whenever Tseitin-style splitting is involved. Here no fresh variables are introduced;
/// every split is a pure distribution of the input's own literals, so satisfiability and
/// logical equivalence coincide.
pub fn to_cnf(formula: &Formula) -> Vec<Vec<i64>> {
    let mut worklist: Vec<Vec<Formula>> = vec![vec![formula.clone()]];
    let mut result: Vec<Vec<i64>> = Vec::new();

    while let Some(fragment) = worklist.pop() {
        match find_non_literal(&fragment) {
            Some(idx) => rewrite(fragment, idx, &mut worklist),
            None => {
                let clause = canonical_clause(fragment.into_iter().map(unwrap_literal).collect());
                insert_reduce(&mut result, clause);
            }
        }
    }

    result
}

fn unwrap_literal(f: Formula) -> i64 {
    match f {
        Formula::Literal(l) => l,
        _ => unreachable!("find_non_literal guarantees every remaining element is a literal"),
    }
}

fn find_non_literal(fragment: &[Formula]) -> Option<usize> {
    fragment.iter().position(|f| !matches!(f, Formula::Literal(_)))
}

/// Rewrites the non-literal element at `idx` of `fragment`, pushing the resulting
/// fragment(s) back onto `worklist`. Element order within a fragment is irrelevant —
/// a fragment is a set, not a sequence — so rewritten operands are simply appended.
fn rewrite(mut fragment: Vec<Formula>, idx: usize, worklist: &mut Vec<Vec<Formula>>) {
    let node = fragment.remove(idx);
    match node {
        Formula::Literal(_) => unreachable!(),

        Formula::Not(inner) => {
            fragment.push(reduce_negation(*inner));
            worklist.push(fragment);
        }

        // a or b -> single clause gains both operands
        Formula::Or(l, r) => {
            fragment.push(*l);
            fragment.push(*r);
            worklist.push(fragment);
        }

        // a -> b == -a or b
        Formula::RImpl(l, r) => {
            fragment.push(Formula::not(*l));
            fragment.push(*r);
            worklist.push(fragment);
        }

        // a <- b == a or -b
        Formula::LImpl(l, r) => {
            fragment.push(Formula::not(*r));
            fragment.push(*l);
            worklist.push(fragment);
        }

        // a and b -> two clauses, one per operand
        Formula::And(l, r) => {
            let mut other = fragment.clone();
            fragment.push(*l);
            other.push(*r);
            worklist.push(fragment);
            worklist.push(other);
        }

        // a xor b -> (a or b) and (-a or -b)
        Formula::Xor(l, r) => {
            let mut negated = fragment.clone();
            negated.push(Formula::not((*l).clone()));
            negated.push(Formula::not((*r).clone()));
            fragment.push(*l);
            fragment.push(*r);
            worklist.push(fragment);
            worklist.push(negated);
        }

        // a <=> b -> (a or -b) and (-a or b)
        Formula::Eq(l, r) => {
            let mut other = fragment.clone();
            other.push(Formula::not((*l).clone()));
            other.push((*r).clone());
            fragment.push(*l);
            fragment.push(Formula::not(*r));
            worklist.push(fragment);
            worklist.push(other);
        }
    }
}

/// Reduces a formula directly beneath a negation by pushing the negation inward one level.
fn reduce_negation(inner: Formula) -> Formula {
    match inner {
        Formula::Literal(l) => Formula::Literal(-l),
        Formula::Not(f) => *f,
        Formula::Xor(l, r) => Formula::eq(*l, *r),
        Formula::Eq(l, r) => Formula::xor(*l, *r),
        Formula::And(l, r) => Formula::or(Formula::not(*l), Formula::not(*r)),
        Formula::Or(l, r) => Formula::and(Formula::not(*l), Formula::not(*r)),
        // -(a -> b) == a and -b
        Formula::RImpl(l, r) => Formula::and(*l, Formula::not(*r)),
        // -(a <- b) == -a and b
        Formula::LImpl(l, r) => Formula::and(Formula::not(*l), *r),
    }
}

fn canonical_clause(mut literals: Vec<i64>) -> Vec<i64> {
    literals.sort_by_key(|&l| (l.abs(), i64::from(l < 0)));
    literals.dedup();
    literals
}

fn is_tautology(sorted: &[i64]) -> bool {
    sorted.windows(2).any(|w| w[0] + w[1] == 0)
}

/// `true` if every literal of `small` occurs in `big`. Both slices must be sorted with
/// the same ordering as [`canonical_clause`] produces.
fn subset(small: &[i64], big: &[i64]) -> bool {
    let mut bi = 0;
    for &s in small {
        while bi < big.len() && big[bi] != s {
            bi += 1;
        }
        if bi == big.len() {
            return false;
        }
        bi += 1;
    }
    true
}

/// Folds `clause` into `result`, discarding it if it is a tautology or subsumed by an
/// existing (shorter-or-equal) clause, and removing any existing clause it subsumes in
/// turn. `result` stays sorted by ascending clause length.
fn insert_reduce(result: &mut Vec<Vec<i64>>, clause: Vec<i64>) {
    if is_tautology(&clause) {
        return;
    }

    let len_insert = clause.len();

    let mut i = 0;
    while i < result.len() && result[i].len() <= len_insert {
        if subset(&result[i], &clause) {
            return;
        }
        i += 1;
    }

    result.retain(|existing| existing.len() <= len_insert || !subset(&clause, existing));

    let pos = result.partition_point(|c| c.len() <= len_insert);
    result.insert(pos, clause);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser::parse;

    fn cnf_of(src: &str) -> Vec<Vec<i64>> {
        to_cnf(&parse(src).unwrap())
    }

    #[test]
    fn single_literal() {
        assert_eq!(cnf_of("1"), vec![vec![1]]);
    }

    #[test]
    fn or_is_a_single_clause() {
        let mut cnf = cnf_of("1 | 2");
        for c in &mut cnf {
            c.sort();
        }
        assert_eq!(cnf, vec![vec![1, 2]]);
    }

    #[test]
    fn and_splits_into_two_clauses() {
        let mut cnf = cnf_of("1 & 2");
        cnf.sort();
        assert_eq!(cnf, vec![vec![1], vec![2]]);
    }

    #[test]
    fn tautology_collapses_to_no_clauses() {
        assert_eq!(cnf_of("1 | -1"), Vec::<Vec<i64>>::new());
    }

    #[test]
    fn subsumption_keeps_the_shorter_clause() {
        // (1 | 2) & (1 | 2 | 3) -> the second clause is subsumed by the first.
        let mut cnf = cnf_of("(1 | 2) & (1 | 2 | 3)");
        for c in &mut cnf {
            c.sort();
        }
        assert_eq!(cnf, vec![vec![1, 2]]);
    }

    #[test]
    fn double_negation_cancels() {
        assert_eq!(cnf_of("--1"), vec![vec![1]]);
    }

    #[test]
    fn xor_produces_two_clauses() {
        let mut cnf = cnf_of("1 xor 2");
        for c in &mut cnf {
            c.sort();
        }
        cnf.sort();
        assert_eq!(cnf, vec![vec![-2, -1], vec![1, 2]]);
    }

    #[test]
    fn equivalence_produces_two_clauses() {
        let mut cnf = cnf_of("1 <=> 2");
        for c in &mut cnf {
            c.sort();
        }
        cnf.sort();
        assert_eq!(cnf, vec![vec![-2, 1], vec![-1, 2]]);
    }
}
