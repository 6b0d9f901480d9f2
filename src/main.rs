use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;

use pyrt::programs::{self, Program};
use pyrt::{Runtime, RuntimeConfig};

/// pyrt - run and check programs against the Python-like runtime core
#[derive(Parser)]
#[command(name = "pyrt")]
#[command(version = "0.1.0")]
#[command(about = "Value, object and built-in core for a Python-like runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. `warn,pyrt::object=debug` (overrides PYRT_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the hosted programs
    List,

    /// Run one hosted program and print its output
    Run {
        /// Program name (see `pyrt list`)
        name: String,
    },

    /// Run every hosted program and compare with <dir>/<name>.expected
    Check {
        /// Directory holding the expected output files
        dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = build_config(cli.log.as_deref()).and_then(|config| match cli.command {
        Commands::List => {
            list_programs();
            Ok(())
        }
        Commands::Run { name } => run_program(&name, config),
        Commands::Check { dir, json } => check_programs(&dir, json, config),
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

fn build_config(log: Option<&str>) -> Result<RuntimeConfig, String> {
    let config = RuntimeConfig::from_env();
    match log {
        Some(spec) => config.with_filter(spec),
        None => Ok(config),
    }
}

fn list_programs() {
    for program in programs::all() {
        println!("{:<22} {}", program.name.green(), program.summary.dimmed());
    }
}

fn find_program(name: &str) -> Result<&'static Program, String> {
    programs::find(name).ok_or_else(|| {
        format!(
            "no program named '{}' (try `pyrt list`)",
            name
        )
    })
}

fn run_program(name: &str, config: RuntimeConfig) -> Result<(), String> {
    let program = find_program(name)?;
    let mut rt = Runtime::with_config(RuntimeConfig {
        echo: true,
        ..config
    });
    program.execute(&mut rt).map_err(|e| e.report())
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    passed: usize,
    failed: usize,
    results: Vec<CheckResult>,
}

fn check_one(program: &Program, dir: &Path, config: &RuntimeConfig) -> CheckResult {
    let fail = |detail: String| CheckResult {
        name: program.name.to_string(),
        passed: false,
        detail: Some(detail),
    };

    let expected_path = dir.join(format!("{}.expected", program.name));
    let expected = match fs::read_to_string(&expected_path) {
        Ok(text) => text,
        Err(e) => return fail(format!("cannot read {}: {}", expected_path.display(), e)),
    };

    let mut rt = Runtime::with_config(RuntimeConfig {
        echo: false,
        ..config.clone()
    });
    if let Err(e) = program.execute(&mut rt) {
        return fail(e.report());
    }

    let expected: Vec<&str> = expected.lines().collect();
    let actual = rt.output();
    if let Some(line) = first_difference(&expected, actual) {
        let want = expected.get(line).copied().unwrap_or("<end of output>");
        let got = actual.get(line).map(String::as_str).unwrap_or("<end of output>");
        return fail(format!(
            "line {}: expected {:?}, got {:?}",
            line + 1,
            want,
            got
        ));
    }

    CheckResult {
        name: program.name.to_string(),
        passed: true,
        detail: None,
    }
}

/// Index of the first line where the outputs disagree
fn first_difference(expected: &[&str], actual: &[String]) -> Option<usize> {
    let common = expected.len().min(actual.len());
    (0..common)
        .find(|&i| expected[i] != actual[i])
        .or_else(|| (expected.len() != actual.len()).then_some(common))
}

fn check_programs(dir: &Path, json: bool, config: RuntimeConfig) -> Result<(), String> {
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()));
    }

    let results: Vec<CheckResult> = programs::all()
        .iter()
        .map(|program| check_one(program, dir, &config))
        .collect();
    let passed = results.iter().filter(|r| r.passed).count();
    let report = CheckReport {
        passed,
        failed: results.len() - passed,
        results,
    };

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("cannot serialize report: {}", e))?;
        println!("{}", text);
    } else {
        for result in &report.results {
            if result.passed {
                println!("{} {}", "ok".green().bold(), result.name);
            } else {
                println!(
                    "{} {}: {}",
                    "FAIL".red().bold(),
                    result.name,
                    result.detail.as_deref().unwrap_or("")
                );
            }
        }
        println!();
        println!(
            "{} passed, {} failed",
            report.passed.to_string().green(),
            report.failed.to_string().red()
        );
    }

    if report.failed > 0 {
        return Err(format!(
            "{} of {} programs did not match",
            report.failed,
            report.passed + report.failed
        ));
    }
    Ok(())
}
