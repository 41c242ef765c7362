//! Thin command-line front-end: a `-s|--script FILE`/stdin-driven line interpreter over
//! [`satshell::Problem`]'s public surface.
//!
//! Each line is one command, whitespace-separated, mirroring the command table of the
//! interactive shell this engine's problem-solving core is built for (`add_clause`,
//! `add_encoding`, `add_formula`, `solve`, `reset`, `cancel_solution`, `get_var_result`,
//! `get_var_mapping`, `get_clauses`). Parsing and dispatching shell syntax is deliberately
//! minimal here: this bin exists to drive the library, not to be a line editor.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use clap::Parser;
use log::error;

use satshell::{Problem, SolveOptions};

#[derive(Parser)]
#[command(name = "satshell", version, about = "Interactive core for named-variable SAT problems")]
struct Cli {
    /// Run commands from FILE instead of reading them from stdin.
    #[arg(short, long, value_name = "FILE")]
    script: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.script {
        Some(path) => File::open(&path)
            .map_err(|e| format!("cannot open script {path:?}: {e}"))
            .and_then(|f| run(BufReader::new(f))),
        None => run(io::stdin().lock()),
    };

    if let Err(msg) = result {
        error!("{msg}");
        std::process::exit(1);
    }
}

fn run<R: BufRead>(input: R) -> Result<(), String> {
    let mut problem = Problem::new();
    for (lineno, line) in input.lines().enumerate() {
        let line = line.map_err(|e| format!("read error: {e}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        if let Err(msg) = dispatch(&mut problem, &words) {
            error!("line {}: {msg}", lineno + 1);
        }
    }
    Ok(())
}

fn dispatch(problem: &mut Problem, words: &[&str]) -> Result<(), String> {
    let (command, args) = words.split_first().ok_or_else(|| "empty command".to_string())?;
    let owned = |args: &[&str]| args.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    match *command {
        "add_clause" => problem.add_clause(&owned(args)).map_err(|e| e.to_string()),

        "add_encoding" => {
            let (encoding, literals) = args.split_first().ok_or("add_encoding needs an encoding name")?;
            match *encoding {
                "1ofn" => problem.add_mofn_direct_encoding(&owned(literals), 1).map_err(|e| e.to_string()),
                "1ofn_order" => problem.add_1ofn_order_encoding(&owned(literals)).map_err(|e| e.to_string()),
                "2ofn" => problem.add_mofn_direct_encoding(&owned(literals), 2).map_err(|e| e.to_string()),
                "mofn" => {
                    let (m, literals) = literals.split_first().ok_or("mofn needs a parameter m")?;
                    let m: usize = m.parse().map_err(|_| format!("invalid mofn parameter {m:?}"))?;
                    problem.add_mofn_direct_encoding(&owned(literals), m).map_err(|e| e.to_string())
                }
                other => Err(format!("unknown encoding {other:?}, expected one of 1ofn, 2ofn, mofn, 1ofn_order")),
            }
        }

        "add_formula" => {
            let (formula, mapping) = args.split_first().ok_or("add_formula needs a formula string")?;
            problem.add_formula_mapping(formula, &owned(mapping)).map_err(|e| e.to_string())
        }

        "solve" => {
            let opts = parse_solve_opts(args)?;
            problem.solve(&opts).map_err(|e| e.to_string())?;
            println!("{}", problem.satisfiable().map_err(|e| e.to_string())?);
            Ok(())
        }

        "reset" => {
            *problem = Problem::new();
            Ok(())
        }

        "cancel_solution" => {
            problem.cancel_solution();
            Ok(())
        }

        "get_var_result" => {
            let var = args.first().ok_or("get_var_result needs a variable name")?;
            let value = problem.var_result(var).map_err(|e| e.to_string())?;
            println!("{value}");
            Ok(())
        }

        "get_var_mapping" => {
            if let Some(&name) = args.first() {
                match problem.get_varnumber_from_name(name) {
                    Some(number) => println!("{number}"),
                    None => return Err(format!("unknown variable {name:?}")),
                }
            }
            Ok(())
        }

        "get_clauses" => {
            for clause in problem.clauses_named() {
                println!("{}", clause.join(" "));
            }
            Ok(())
        }

        "help" => {
            print_help();
            Ok(())
        }

        other => Err(format!("unknown command {other:?}")),
    }
}

/// Parses `solve`'s trailing `-flag[=value]` arguments over [`SolveOptions`]'s defaults.
fn parse_solve_opts(args: &[&str]) -> Result<SolveOptions, String> {
    let mut opts = SolveOptions::default();
    for arg in args {
        let (flag, value) = match arg.split_once('=') {
            Some((f, v)) => (f, Some(v)),
            None => (*arg, None),
        };
        match flag {
            "-tempfile_base" => opts.tempfile_base = value.ok_or("-tempfile_base needs a value")?.to_string(),
            "-solver_binary" => opts.solver_binary = value.ok_or("-solver_binary needs a value")?.to_string(),
            "-tempfile_clean" => opts.tempfile_clean = true,
            "-tempfile_keep" => opts.tempfile_clean = false,
            "-compress_cnf" => opts.compress_cnf = true,
            "-plain_cnf" => opts.compress_cnf = false,
            "-solution_on_stdout" => opts.solution_on_stdout = true,
            other => return Err(format!("unknown solve flag {other:?}")),
        }
    }
    Ok(opts)
}

fn print_help() {
    let _ = writeln!(
        io::stdout(),
        "commands: add_clause <lit...> | add_encoding <1ofn|1ofn_order|2ofn|mofn> [m] <lit...> | \
         add_formula <formula> <lit...> | solve [-flag...] | reset | cancel_solution | \
         get_var_result <name> | get_var_mapping [name] | get_clauses | help"
    );
}
