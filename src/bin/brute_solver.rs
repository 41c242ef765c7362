//! A brute-force DIMACS solver used only as a test fixture: small enough to reason about
//! by hand, standing in for `minisat` wherever the integration tests need a real solver
//! binary to shell out to instead of mocking [`satshell::Cnf::solve`] away entirely.
//!
//! Usage mirrors the two invocation shapes `Cnf::solve` produces: `brute_solver CNF SOL`
//! writes its result to `SOL`; `brute_solver CNF` (no second argument) prints it to stdout
//! in the `s `/`v `-prefixed form solvers use when `solution_on_stdout` is set.

use std::env;
use std::fs;
use std::io::{Read, Write};

use flate2::read::GzDecoder;

fn main() {
    let args: Vec<String> = env::args().collect();
    let cnf_path = args.get(1).expect("usage: brute_solver CNF [SOL]");
    let sol_path = args.get(2);

    let (nvars, clauses) = parse_dimacs(&read_cnf_text(cnf_path));
    let assignment = brute_force(nvars, &clauses);

    match sol_path {
        Some(path) => {
            let mut f = fs::File::create(path).expect("create solution file");
            write_result(&mut f, &assignment);
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match &assignment {
                Some(lits) => {
                    writeln!(out, "s SATISFIABLE").unwrap();
                    writeln!(out, "v {}", format_lits(lits)).unwrap();
                }
                None => writeln!(out, "s UNSATISFIABLE").unwrap(),
            }
        }
    }
}

fn write_result(out: &mut impl Write, assignment: &Option<Vec<i64>>) {
    match assignment {
        Some(lits) => {
            writeln!(out, "SAT").unwrap();
            writeln!(out, "{}", format_lits(lits)).unwrap();
        }
        None => writeln!(out, "UNSAT").unwrap(),
    }
}

fn format_lits(lits: &[i64]) -> String {
    let strs: Vec<String> = lits.iter().map(i64::to_string).collect();
    format!("{} 0", strs.join(" "))
}

/// Reads the CNF file as plain text, transparently decompressing it first if it starts
/// with the gzip magic bytes (mirroring `Cnf`'s `compress_cnf` option on the writing side).
fn read_cnf_text(path: &str) -> String {
    let raw = fs::read(path).expect("read cnf file");
    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut text = String::new();
        GzDecoder::new(raw.as_slice()).read_to_string(&mut text).expect("gunzip cnf file");
        text
    } else {
        String::from_utf8(raw).expect("cnf file must be utf8")
    }
}

fn parse_dimacs(content: &str) -> (usize, Vec<Vec<i64>>) {
    let mut nvars = 0usize;
    let mut clauses = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if line.starts_with('p') {
            nvars = line.split_whitespace().nth(2).expect("p cnf line needs a var count").parse().unwrap();
            continue;
        }
        for tok in line.split_whitespace() {
            let lit: i64 = tok.parse().expect("clause literal");
            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                current.push(lit);
            }
        }
    }

    (nvars, clauses)
}

/// Tries every assignment of `nvars` boolean variables; `nvars` is expected to stay small
/// since this exists for tests, not for solving anything at scale.
fn brute_force(nvars: usize, clauses: &[Vec<i64>]) -> Option<Vec<i64>> {
    assert!(nvars <= 20, "brute_solver is a test fixture, not a real solver");
    for mask in 0u32..(1 << nvars) {
        let assignment: Vec<i64> =
            (1..=nvars as i64).map(|v| if (mask >> (v - 1)) & 1 == 1 { v } else { -v }).collect();
        let satisfied = clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                let var = lit.unsigned_abs() as usize;
                assignment[var - 1] == lit
            })
        });
        if satisfied {
            return Some(assignment);
        }
    }
    None
}
