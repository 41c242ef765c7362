//! A plain integer-variable CNF clause set with no notion of variable names, and the
//! machinery to solve it by shelling out to an external DIMACS solver.

pub mod dimacs;

use std::fs::File;
use std::io::{BufReader, BufWriter};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};

use crate::errors::{CnfError, SolveError};
use crate::subprocess::Subprocess;
use dimacs::Solution;

/// Options controlling how [`Cnf::solve`] invokes the external solver.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Path (without extension) used for the generated `.cnf`/`.cnf.gz` and `.sol` files.
    pub tempfile_base: String,
    /// Executable invoked to solve the generated DIMACS file.
    pub solver_binary: String,
    /// Remove the temporary files once solving finishes (successfully or not).
    pub tempfile_clean: bool,
    /// Write the CNF file gzip-compressed.
    pub compress_cnf: bool,
    /// Assume the solver prints its solution to stdout (scraped for `s`/`v` lines)
    /// rather than writing it to the `.sol` file path passed as its second argument.
    pub solution_on_stdout: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            tempfile_base: "tmp_cnf".to_string(),
            solver_binary: "minisat".to_string(),
            tempfile_clean: true,
            compress_cnf: false,
            solution_on_stdout: false,
        }
    }
}

/// A CNF formula over plain integer-literal variables, with an optional last solution.
#[derive(Debug, Clone, Default)]
pub struct Cnf {
    max_var: u64,
    clauses: Vec<Vec<i64>>,
    solution: Option<Vec<i64>>,
}

impl Cnf {
    pub fn new() -> Cnf {
        Cnf::default()
    }

    /// Appends `clause` (a non-empty list of non-zero literals), invalidating any
    /// existing solution.
    pub fn add_clause(&mut self, clause: &[i64]) -> Result<(), CnfError> {
        if clause.is_empty() {
            return Err(CnfError::EmptyClause);
        }
        for &lit in clause {
            self.max_var = self.max_var.max(lit.unsigned_abs());
        }
        self.clauses.push(clause.to_vec());
        self.solution = None;
        Ok(())
    }

    pub fn max_var(&self) -> u64 {
        self.max_var
    }

    pub fn clauses(&self) -> &[Vec<i64>] {
        &self.clauses
    }

    pub fn solution(&self) -> Option<&[i64]> {
        self.solution.as_deref()
    }

    /// Invalidates the current solution so the next [`Cnf::solve`] call must find a
    /// different assignment: appends the negation of every solution literal as a new
    /// clause, which the current solution provably no longer satisfies.
    pub fn cancel_solution(&mut self) {
        let Some(solution) = self.solution.take() else {
            return;
        };
        let blocking: Vec<i64> = solution.iter().map(|lit| -lit).collect();
        // The solution is never empty for a satisfiable, non-vacuous instance.
        let _ = self.add_clause(&blocking);
    }

    /// Writes the instance to a DIMACS file, runs the configured solver over it, and
    /// reads back its solution. An I/O or spawn failure is reported as `Ok(false)`
    /// (solving simply didn't happen) rather than propagated, matching the rest of this
    /// engine's "never block progress on a temp-file hiccup" stance; the `Err` case
    /// exists for completeness but is not produced by this implementation today.
    pub fn solve(&mut self, opts: &SolveOptions) -> Result<bool, SolveError> {
        match self.try_solve(opts) {
            Ok(satisfiable) => Ok(satisfiable),
            Err(err) => {
                warn!("solve failed: {err}");
                Ok(false)
            }
        }
    }

    fn try_solve(&mut self, opts: &SolveOptions) -> Result<bool, SolveError> {
        let cnf_path = if opts.compress_cnf {
            format!("{}.cnf.gz", opts.tempfile_base)
        } else {
            format!("{}.cnf", opts.tempfile_base)
        };
        let sol_path = format!("{}.sol", opts.tempfile_base);

        info!("writing cnf file {cnf_path}");
        self.write_cnf_file(&cnf_path, opts.compress_cnf)?;

        let argv = if opts.solution_on_stdout {
            vec![opts.solver_binary.clone(), cnf_path.clone()]
        } else {
            vec![opts.solver_binary.clone(), cnf_path.clone(), sol_path.clone()]
        };

        info!("running solver ({})...", opts.solver_binary);
        let run_result = self.run_solver(&argv, &sol_path, opts.solution_on_stdout);

        if opts.tempfile_clean {
            let _ = std::fs::remove_file(&cnf_path);
        }

        let sol_path_for_read = sol_path.clone();
        let read_result = run_result.and_then(|()| self.read_solution(&sol_path_for_read));

        if opts.tempfile_clean {
            let _ = std::fs::remove_file(&sol_path);
        }

        read_result
    }

    fn write_cnf_file(&self, path: &str, compressed: bool) -> Result<(), SolveError> {
        let open = || {
            File::create(path).map_err(|source| SolveError::TempFile { path: path.to_string(), source })
        };
        if compressed {
            let file = open()?;
            let encoder = GzEncoder::new(file, Compression::default());
            dimacs::write_dimacs(encoder, self.max_var, &self.clauses)
                .map_err(|source| SolveError::TempFile { path: path.to_string(), source })
        } else {
            let file = open()?;
            dimacs::write_dimacs(BufWriter::new(file), self.max_var, &self.clauses)
                .map_err(|source| SolveError::TempFile { path: path.to_string(), source })
        }
    }

    fn run_solver(&self, argv: &[String], sol_path: &str, solution_on_stdout: bool) -> Result<(), SolveError> {
        let mut child = Subprocess::spawn(argv)?;

        let mut sol_writer = if solution_on_stdout {
            Some(BufWriter::new(
                File::create(sol_path).map_err(|source| SolveError::TempFile { path: sol_path.to_string(), source })?,
            ))
        } else {
            None
        };

        while let Some(line) = child.getline() {
            if solution_on_stdout {
                scrape_line(&line, sol_writer.as_mut().expect("sol_writer set when solution_on_stdout"));
            } else {
                info!("SOLVER: {line}");
            }
        }

        child.finish();
        Ok(())
    }

    fn read_solution(&mut self, sol_path: &str) -> Result<bool, SolveError> {
        let file = File::open(sol_path).map_err(|source| SolveError::TempFile { path: sol_path.to_string(), source })?;
        let solution = dimacs::read_solution(BufReader::new(file))
            .map_err(|source| SolveError::TempFile { path: sol_path.to_string(), source })?;

        match solution {
            Solution::Unsatisfiable => {
                self.solution = None;
                Ok(false)
            }
            Solution::Satisfiable(lits) => {
                self.solution = Some(lits);
                Ok(true)
            }
        }
    }
}

/// Mirrors the scraping rule for solvers that print their solution to stdout: a line
/// starting with `s` is both logged and (minus its two-character prefix) written to the
/// solution file; a line starting with `v` is written only; anything else is just logged.
fn scrape_line(line: &str, sol_file: &mut BufWriter<File>) {
    use std::io::Write;

    let prefix = line.as_bytes().first().copied();
    let write_line = line.len() > 1 && matches!(prefix, Some(b's') | Some(b'v'));
    let print_line = !(line.len() > 1 && prefix == Some(b'v'));

    if print_line {
        info!("SOLVER: {line}");
    }
    if write_line {
        let _ = writeln!(sol_file, "{}", &line[2..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_clause_tracks_max_var() {
        let mut cnf = Cnf::new();
        cnf.add_clause(&[1, -3]).unwrap();
        cnf.add_clause(&[2]).unwrap();
        assert_eq!(cnf.max_var(), 3);
        assert_eq!(cnf.clauses().len(), 2);
    }

    #[test]
    fn add_clause_rejects_empty() {
        let mut cnf = Cnf::new();
        assert!(matches!(cnf.add_clause(&[]), Err(CnfError::EmptyClause)));
    }

    #[test]
    fn cancel_solution_blocks_previous_assignment() {
        let mut cnf = Cnf::new();
        cnf.add_clause(&[1]).unwrap();
        cnf.solution = Some(vec![1, -2]);
        cnf.cancel_solution();
        assert!(cnf.solution().is_none());
        assert_eq!(cnf.clauses().last().unwrap(), &vec![-1, 2]);
    }

    #[test]
    fn scrape_line_writes_without_prefix_for_v_lines() {
        let dir = std::env::temp_dir().join("satshell_scrape_test.sol");
        let mut writer = BufWriter::new(File::create(&dir).unwrap());
        scrape_line("v 1 -2 0", &mut writer);
        scrape_line("s SATISFIABLE", &mut writer);
        drop(writer);
        let contents = std::fs::read_to_string(&dir).unwrap();
        assert_eq!(contents, "1 -2 0\nSATISFIABLE\n");
        let _ = std::fs::remove_file(&dir);
    }
}
