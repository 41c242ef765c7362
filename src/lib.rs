//! Core engine for an interactive SAT-problem-construction shell.
//!
//! Four layers, leaves first: [`subprocess`] runs an external program on a pseudo-terminal,
//! [`cnf`] owns a plain integer-variable clause set and drives a solve through a
//! subprocess, [`formula`] parses and CNF-converts propositional expressions, and
//! [`problem`] is the named-variable façade that ties the other three together.

pub mod cnf;
pub mod errors;
pub mod formula;
pub mod problem;
pub mod subprocess;

pub use cnf::{Cnf, SolveOptions};
pub use errors::{CnfError, FormulaError, ProblemError, SolveError};
pub use formula::Formula;
pub use problem::Problem;
