//! The named-variable SAT problem façade: the public surface a shell session drives.
//!
//! Unlike [`crate::cnf::Cnf`], which only knows integer literals, [`Problem`] lets callers
//! name variables as strings, derives their integer encoding lazily on first use, and
//! layers cardinality encodings and cached formula-string mappings on top of the base
//! clause set.

use std::collections::HashMap;

use crate::cnf::{Cnf, SolveOptions};
use crate::errors::ProblemError;
use crate::formula::{cnf::to_cnf, parse};

/// A SAT problem over named boolean variables.
#[derive(Debug, Default)]
pub struct Problem {
    cnf: Cnf,
    last_var: i64,
    name_to_num: HashMap<String, i64>,
    num_to_name: HashMap<i64, String>,
    solver_run: bool,
    satisfiable: bool,
    var_result: HashMap<String, bool>,
    formula_cache: HashMap<String, Vec<Vec<i64>>>,
    ofn_counter: u64,
}

impl Problem {
    pub fn new() -> Problem {
        Problem::default()
    }

    fn clear_solution(&mut self) {
        if self.solver_run {
            self.solver_run = false;
            self.satisfiable = false;
            self.var_result.clear();
        }
    }

    /// Encodes a literal name, stripping any number of leading `-` characters and
    /// toggling polarity with each one, allocating a fresh integer variable the first
    /// time a name is seen.
    fn encode_literal(&mut self, literal: &str) -> Result<i64, ProblemError> {
        if literal.is_empty() {
            return Err(ProblemError::InvalidLiteral(literal.to_string()));
        }

        let mut invert = false;
        let mut name = literal;
        while let Some(rest) = name.strip_prefix('-') {
            invert = !invert;
            name = rest;
            if name.is_empty() {
                return Err(ProblemError::InvalidLiteral(literal.to_string()));
            }
        }

        let var = match self.name_to_num.get(name) {
            Some(&v) => v,
            None => {
                self.last_var += 1;
                let v = self.last_var;
                self.name_to_num.insert(name.to_string(), v);
                self.num_to_name.insert(v, name.to_string());
                v
            }
        };

        Ok(if invert { -var } else { var })
    }

    fn check_clause_names(names: &[String]) -> Result<(), ProblemError> {
        for name in names {
            if name.is_empty() || name == "-" {
                return Err(ProblemError::InvalidLiteral(name.clone()));
            }
        }
        Ok(())
    }

    /// Adds a clause given as a list of (possibly `-`-prefixed) variable names.
    pub fn add_clause(&mut self, names: &[String]) -> Result<(), ProblemError> {
        Self::check_clause_names(names)?;
        let mut lits = Vec::with_capacity(names.len());
        for name in names {
            lits.push(self.encode_literal(name)?);
        }
        self.cnf.add_clause(&lits)?;
        self.clear_solution();
        Ok(())
    }

    /// Encodes "exactly one of `names` is true" using an order encoding with `n - 1`
    /// auxiliary ladder variables, avoiding the quadratic blowup of a pairwise encoding.
    pub fn add_1ofn_order_encoding(&mut self, names: &[String]) -> Result<(), ProblemError> {
        let n = names.len();
        if n == 0 {
            return Ok(());
        }
        if n == 1 {
            return self.add_clause(names);
        }

        let mut main = Vec::with_capacity(n);
        for name in names {
            main.push(self.encode_literal(name)?);
        }

        let mut help = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            let aux_name = format!("_int_1ofn_{}_{}_", self.ofn_counter, i);
            help.push(self.encode_literal(&aux_name)?);
        }

        let mut clauses = Vec::new();
        for i in 0..n.saturating_sub(2) {
            clauses.push(vec![help[i], -help[i + 1]]);
        }

        clauses.push(vec![main[0], help[0]]);
        clauses.push(vec![-main[0], -help[0]]);

        for i in 1..n - 1 {
            clauses.push(vec![-main[i], help[i - 1]]);
            clauses.push(vec![-main[i], -help[i]]);
            clauses.push(vec![main[i], -help[i - 1], help[i]]);
        }

        let last = n - 1;
        clauses.push(vec![-main[last], help[last - 1]]);
        clauses.push(vec![main[last], -help[last - 1]]);

        for clause in &clauses {
            self.cnf.add_clause(clause)?;
        }
        self.ofn_counter += 1;
        self.clear_solution();
        Ok(())
    }

    /// Encodes "exactly `m` of `names` are true" as a direct encoding: every subset of
    /// `n - m + 1` literals has at least one true member (forces at least `m` true), and
    /// every subset of `m + 1` literals has at least one false member (forces at most `m`
    /// true).
    pub fn add_mofn_direct_encoding(&mut self, names: &[String], m: usize) -> Result<(), ProblemError> {
        let n = names.len();
        if m > n || n <= 1 {
            return Ok(());
        }
        if n == m {
            for name in names {
                self.add_clause(std::slice::from_ref(name))?;
            }
            return Ok(());
        }

        let mut main = Vec::with_capacity(n);
        for name in names {
            main.push(self.encode_literal(name)?);
        }

        let mut clauses: Vec<Vec<i64>> = Vec::new();
        for combo in combinations(n, n - m + 1) {
            clauses.push(combo.iter().map(|&i| main[i]).collect());
        }
        for combo in combinations(n, m + 1) {
            clauses.push(combo.iter().map(|&i| -main[i]).collect());
        }

        for clause in &clauses {
            self.cnf.add_clause(clause)?;
        }
        self.clear_solution();
        Ok(())
    }

    /// Adds the CNF of `formula` (parsing and converting it once, then caching the
    /// result keyed by the formula's exact source text) mapped onto `mapping`, whose
    /// `i`-th entry names the variable that stands for the formula's literal `i + 1`.
    pub fn add_formula_mapping(&mut self, formula: &str, mapping: &[String]) -> Result<(), ProblemError> {
        let raw_clauses = match self.formula_cache.get(formula) {
            Some(clauses) => clauses.clone(),
            None => {
                let parsed = parse(formula)?;
                let clauses = to_cnf(&parsed);
                self.formula_cache.insert(formula.to_string(), clauses.clone());
                clauses
            }
        };

        let n_lits = mapping.len();
        let mut encoded = Vec::with_capacity(n_lits + 1);
        encoded.push(0i64);
        for name in mapping {
            encoded.push(self.encode_literal(name)?);
        }

        let mut mapped_clauses = Vec::with_capacity(raw_clauses.len());
        for clause in &raw_clauses {
            let mut mapped = Vec::with_capacity(clause.len());
            for &raw in clause {
                let (var, invert) = if raw < 0 { (-raw, true) } else { (raw, false) };
                let var = var as usize;
                if var > n_lits {
                    return Err(ProblemError::MappingIncomplete(var as i64));
                }
                let lit = encoded[var];
                mapped.push(if invert { -lit } else { lit });
            }
            mapped_clauses.push(mapped);
        }

        for clause in &mapped_clauses {
            self.cnf.add_clause(clause)?;
        }
        if !mapped_clauses.is_empty() {
            self.clear_solution();
        }
        Ok(())
    }

    pub fn get_varname_from_number(&self, number: i64) -> Option<&str> {
        if number <= 0 {
            return None;
        }
        self.num_to_name.get(&number).map(String::as_str)
    }

    pub fn get_varnumber_from_name(&self, name: &str) -> Option<i64> {
        let mut invert = false;
        let mut rest = name;
        while let Some(stripped) = rest.strip_prefix('-') {
            invert = !invert;
            rest = stripped;
            if rest.is_empty() {
                return None;
            }
        }
        let var = *self.name_to_num.get(rest)?;
        Some(if invert { -var } else { var })
    }

    /// The raw integer-literal clause set, in internal encoding.
    pub fn clauses(&self) -> &[Vec<i64>] {
        self.cnf.clauses()
    }

    /// The clause set with every literal rendered back to its variable name (`-name` for
    /// negative literals). Variables with no recorded name are rendered as their bare
    /// number — this can only happen for a literal this `Problem` never named itself.
    pub fn clauses_named(&self) -> Vec<Vec<String>> {
        self.cnf
            .clauses()
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .map(|&lit| {
                        let var = lit.unsigned_abs() as i64;
                        let name = self.get_varname_from_number(var).map(str::to_string).unwrap_or_else(|| var.to_string());
                        if lit < 0 {
                            format!("-{name}")
                        } else {
                            name
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn solve(&mut self, opts: &SolveOptions) -> Result<(), ProblemError> {
        let satisfiable = self.cnf.solve(opts)?;
        self.solver_run = true;
        self.satisfiable = satisfiable;
        self.var_result.clear();

        if satisfiable {
            if let Some(solution) = self.cnf.solution() {
                for &lit in solution {
                    let value = lit > 0;
                    let var = lit.unsigned_abs() as i64;
                    if let Some(name) = self.num_to_name.get(&var) {
                        self.var_result.insert(name.clone(), value);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn cancel_solution(&mut self) {
        self.cnf.cancel_solution();
        self.clear_solution();
    }

    pub fn satisfiable(&self) -> Result<bool, ProblemError> {
        if !self.solver_run {
            return Err(ProblemError::NotSolved);
        }
        Ok(self.satisfiable)
    }

    pub fn var_result(&self, var: &str) -> Result<bool, ProblemError> {
        if !self.solver_run {
            return Err(ProblemError::NotSolved);
        }
        if !self.satisfiable {
            return Err(ProblemError::Unsatisfiable);
        }
        self.var_result.get(var).copied().ok_or_else(|| ProblemError::UnknownVariable(var.to_string()))
    }

    /// All variable names assigned `assignment` in the current solution.
    pub fn var_result_list(&self, assignment: bool) -> Result<Vec<&str>, ProblemError> {
        if !self.solver_run {
            return Err(ProblemError::NotSolved);
        }
        if !self.satisfiable {
            return Err(ProblemError::Unsatisfiable);
        }
        Ok(self
            .var_result
            .iter()
            .filter(|&(_, &v)| v == assignment)
            .map(|(name, _)| name.as_str())
            .collect())
    }

    /// Discards any recorded solution without adding a blocking clause, as if the solver
    /// had never been run.
    pub fn reset(&mut self) {
        self.solver_run = false;
        self.satisfiable = false;
        self.var_result.clear();
    }
}

/// Every strictly increasing `k`-element subset of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    if k > n {
        return result;
    }
    let mut combo: Vec<usize> = (0..k).collect();
    'outer: loop {
        result.push(combo.clone());
        if k == 0 {
            break;
        }
        let mut i = k - 1;
        loop {
            if combo[i] != i + n - k {
                combo[i] += 1;
                for j in (i + 1)..k {
                    combo[j] = combo[j - 1] + 1;
                }
                continue 'outer;
            }
            if i == 0 {
                break 'outer;
            }
            i -= 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn combinations_of_three_choose_two() {
        assert_eq!(combinations(3, 2), vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn combinations_k_greater_than_n_is_empty() {
        assert!(combinations(2, 3).is_empty());
    }

    #[test]
    fn add_clause_allocates_stable_variable_numbers() {
        let mut p = Problem::new();
        p.add_clause(&names(&["a", "-b"])).unwrap();
        assert_eq!(p.get_varnumber_from_name("a"), Some(1));
        assert_eq!(p.get_varnumber_from_name("-a"), Some(-1));
        assert_eq!(p.get_varnumber_from_name("b"), Some(2));
        assert_eq!(p.clauses(), &[vec![1, -2]]);
    }

    #[test]
    fn add_clause_rejects_bare_dash() {
        let mut p = Problem::new();
        assert!(matches!(p.add_clause(&names(&["a", "-"])), Err(ProblemError::InvalidLiteral(_))));
    }

    #[test]
    fn one_of_n_with_single_literal_is_a_unit_clause() {
        let mut p = Problem::new();
        p.add_1ofn_order_encoding(&names(&["a"])).unwrap();
        assert_eq!(p.clauses(), &[vec![1]]);
    }

    #[test]
    fn one_of_n_introduces_ladder_variables() {
        let mut p = Problem::new();
        p.add_1ofn_order_encoding(&names(&["a", "b", "c"])).unwrap();
        // 3 main vars + 2 ladder vars.
        assert_eq!(p.get_varnumber_from_name("_int_1ofn_0_0_"), Some(4));
        assert_eq!(p.get_varnumber_from_name("_int_1ofn_0_1_"), Some(5));
        assert!(!p.clauses().is_empty());
    }

    #[test]
    fn mofn_exactly_n_is_all_unit_clauses() {
        let mut p = Problem::new();
        p.add_mofn_direct_encoding(&names(&["a", "b"]), 2).unwrap();
        let mut cl = p.clauses().to_vec();
        cl.sort();
        assert_eq!(cl, vec![vec![1], vec![2]]);
    }

    #[test]
    fn mofn_exactly_zero_negates_everything() {
        let mut p = Problem::new();
        p.add_mofn_direct_encoding(&names(&["a", "b", "c"]), 0).unwrap();
        let mut cl = p.clauses().to_vec();
        cl.sort();
        assert_eq!(cl, vec![vec![-3], vec![-2], vec![-1]]);
    }

    #[test]
    fn formula_mapping_reuses_the_cache() {
        let mut p = Problem::new();
        p.add_formula_mapping("1 & 2", &names(&["a", "b"])).unwrap();
        let first_len = p.clauses().len();
        p.add_formula_mapping("1 & 2", &names(&["c", "d"])).unwrap();
        assert_eq!(p.clauses().len(), first_len * 2);
    }

    #[test]
    fn formula_mapping_reports_missing_mapping() {
        let mut p = Problem::new();
        let err = p.add_formula_mapping("1 & 2", &names(&["a"])).unwrap_err();
        assert!(matches!(err, ProblemError::MappingIncomplete(2)));
        // Nothing should have been added to the CNF on failure.
        assert!(p.clauses().is_empty());
    }

    #[test]
    fn unsolved_problem_reports_not_solved() {
        let p = Problem::new();
        assert!(matches!(p.satisfiable(), Err(ProblemError::NotSolved)));
    }
}
