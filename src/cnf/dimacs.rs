//! Plain and gzip-compressed DIMACS CNF writers, and DIMACS solution-file parsing.

use std::io::{self, BufRead, Write};

/// Writes a DIMACS `p cnf` header followed by every clause, each terminated with `0`.
pub fn write_dimacs<W: Write>(mut out: W, max_var: u64, clauses: &[Vec<i64>]) -> io::Result<()> {
    writeln!(out, "p cnf {} {}", max_var, clauses.len())?;
    for clause in clauses {
        for lit in clause {
            write!(out, "{lit} ")?;
        }
        writeln!(out, "0")?;
    }
    Ok(())
}

/// The outcome of reading a solver's solution file: unsatisfiable, or satisfiable with
/// an assignment as signed literals (one per variable, sign gives its polarity).
pub enum Solution {
    Unsatisfiable,
    Satisfiable(Vec<i64>),
}

/// Parses a solution file: the first whitespace-separated token must be `SAT` or
/// `SATISFIABLE` for the instance to count as satisfiable, after which signed integers
/// are read until a `0` or end of input.
pub fn read_solution<R: BufRead>(mut input: R) -> io::Result<Solution> {
    let mut tokens = String::new();
    input.read_to_string(&mut tokens)?;
    let mut it = tokens.split_whitespace();

    let satisfiable = matches!(it.next(), Some("SAT") | Some("SATISFIABLE"));
    if !satisfiable {
        return Ok(Solution::Unsatisfiable);
    }

    let mut literals = Vec::new();
    for tok in it {
        match tok.parse::<i64>() {
            Ok(0) => break,
            Ok(lit) => literals.push(lit),
            Err(_) => break,
        }
    }

    Ok(Solution::Satisfiable(literals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_clauses() {
        let mut buf = Vec::new();
        write_dimacs(&mut buf, 3, &[vec![1, -2], vec![3]]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "p cnf 3 2\n1 -2 0\n3 0\n");
    }

    #[test]
    fn parses_satisfiable_solution() {
        let sol = read_solution("SAT\n1 -2 3 0\n".as_bytes()).unwrap();
        match sol {
            Solution::Satisfiable(lits) => assert_eq!(lits, vec![1, -2, 3]),
            Solution::Unsatisfiable => panic!("expected satisfiable"),
        }
    }

    #[test]
    fn parses_unsatisfiable() {
        let sol = read_solution("UNSAT\n".as_bytes()).unwrap();
        assert!(matches!(sol, Solution::Unsatisfiable));
    }
}
