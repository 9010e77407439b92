//! Command-line interface for the lexlr calculator.
//!
//! Evaluates a single expression, or a file with one statement per line;
//! variables assigned with `let` persist across the lines of a file.

use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};

use lexlr_calc::{Calc, SymTab};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates one statement and prints its value
    Eval {
        /// The statement, e.g. "1 + 2 * 3"
        stat: String,
    },
    /// Evaluates a file with one statement per line
    Run {
        /// Input file with calculator statements
        #[arg(short, long)]
        input: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let calc = Calc::new().context("table generation failed")?;
    let mut symtab = SymTab::new();

    match args.command {
        Commands::Eval { stat } => {
            let value = calc.eval(&stat, &mut symtab)?;
            println!("{value}");
        }
        Commands::Run { input } => {
            let file = std::fs::File::open(&input).with_context(|| format!("can't open {input:?}"))?;
            for (i, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let value = calc
                    .eval(&line, &mut symtab)
                    .with_context(|| format!("line {}", i + 1))?;
                println!("{value}");
            }
        }
    }
    Ok(())
}
