// src/main.rs

use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use scopecheck::{
    CaseReport, Expectation, Grammar, GrammarTokenizer, PatternRegistry, run,
};

#[derive(Parser)]
#[command(name = "scopecheck")]
#[command(about = "Fixture-driven verification for stateful line tokenizers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every test case in the given fixture files
    Check {
        #[arg(value_name = "FIXTURES", required = true)]
        fixtures: Vec<PathBuf>,

        /// Pattern table (JSON object of name -> pattern source)
        #[arg(long, value_name = "FILE")]
        patterns: Option<PathBuf>,

        /// Grammar for scope expectations (JSON)
        #[arg(long, value_name = "FILE")]
        grammar: Option<PathBuf>,
    },
    /// List the test cases parsed from a fixture file
    List {
        #[arg(value_name = "FIXTURE")]
        fixture: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            fixtures,
            patterns,
            grammar,
        } => {
            let registry = match patterns {
                Some(path) => PatternRegistry::load(&path)?,
                None => PatternRegistry::new(),
            };
            let tokenizer = match grammar {
                Some(path) => Some(GrammarTokenizer::new(&Grammar::load(&path)?)?),
                None => None,
            };

            let mut failed = false;
            for path in &fixtures {
                let content = read_to_string(path)
                    .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
                let cases = scopecheck::parse(&content);
                let reports = run(&cases, &registry, tokenizer.as_ref());

                println!("{}", path.display().to_string().bold());
                for report in &reports {
                    print_report(report);
                    failed |= report.has_failures();
                }
            }

            if failed {
                std::process::exit(1);
            }
        }
        Commands::List { fixture } => {
            let content = read_to_string(&fixture)
                .with_context(|| format!("Failed to read fixture: {}", fixture.display()))?;
            for case in scopecheck::parse(&content) {
                let kinds: Vec<&str> = case
                    .expectations
                    .iter()
                    .map(|e| match e {
                        Expectation::Pattern(_) => "pattern",
                        Expectation::Scope(_) => "scopes",
                    })
                    .collect();
                println!(
                    "{} ({} input line(s), expectations: [{}])",
                    case.name,
                    case.input.split('\n').count(),
                    kinds.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn print_report(report: &CaseReport) {
    let marker = if report.has_failures() {
        "FAIL".red()
    } else {
        "PASS".green()
    };
    println!("  {} {}", marker, report.name);

    for result in &report.results {
        if result.passed() {
            continue;
        }
        match result {
            scopecheck::ExpectationReport::Configuration { .. } => {
                println!("    {}", result.to_string().yellow());
            }
            scopecheck::ExpectationReport::Scope { assertions } => {
                for assertion in assertions {
                    if matches!(assertion.outcome, scopecheck::AssertionOutcome::Resolved(_)) {
                        continue;
                    }
                    println!("    {}", assertion.to_string().red());
                }
            }
            scopecheck::ExpectationReport::Pattern { .. } => {
                println!("    {}", result.to_string().red());
            }
        }
    }
}
