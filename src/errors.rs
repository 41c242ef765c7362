//! Error types for every fallible operation exposed by this crate.

use thiserror::Error;

use crate::formula::Rule;

/// Errors raised while parsing a propositional formula string.
#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("failed to parse formula: {0}")]
    Syntax(Box<pest::error::Error<Rule>>),
}

impl From<pest::error::Error<Rule>> for FormulaError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        FormulaError::Syntax(Box::new(err))
    }
}

/// Errors raised by the base CNF engine.
#[derive(Error, Debug)]
pub enum CnfError {
    #[error("refusing to add an empty clause")]
    EmptyClause,
}

/// Errors raised while driving the external solver subprocess.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("failed to open temporary file {path}: {source}")]
    TempFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn solver {0:?}: {1}")]
    Spawn(String, #[source] std::io::Error),
}

/// Errors raised by the named-variable SAT problem façade.
#[derive(Error, Debug)]
pub enum ProblemError {
    #[error("invalid literal name {0:?}")]
    InvalidLiteral(String),
    #[error("{0}")]
    Formula(#[from] FormulaError),
    #[error("no mapping supplied for raw variable {0}")]
    MappingIncomplete(i64),
    #[error(transparent)]
    Cnf(#[from] CnfError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("problem has not been solved yet")]
    NotSolved,
    #[error("problem is not satisfiable")]
    Unsatisfiable,
    #[error("unknown variable {0:?}")]
    UnknownVariable(String),
}
