//! dwq - query debugging information with pipeline expressions.
//!
//! Compiles the query against the core + debug-info vocabulary, opens
//! each input dump, seeds the initial stack with the file value and
//! prints every result stack.

use std::path::PathBuf;
use std::process::exit;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dwq_engine::{compile, Query, Stack};

#[derive(Parser, Debug)]
#[command(name = "dwq")]
#[command(about = "Query debugging-information trees with pipeline expressions")]
struct Cli {
    /// Query expression
    query: String,

    /// Debug-info dump files to run the query over
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print only the number of result stacks per file
    #[arg(long)]
    count: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dwq=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let voc = dwq_dw::full_voc();
    let query = match compile(&cli.query, &voc) {
        Ok(query) => query,
        Err(e) => {
            error!("cannot compile query: {e}");
            exit(2);
        }
    };

    let mut failed = false;
    for path in &cli.files {
        if let Err(e) = run_file(&query, path, cli.count, cli.files.len() > 1) {
            error!("{path}: {e:#}", path = path.display());
            failed = true;
        }
    }
    if failed {
        exit(1);
    }
}

fn run_file(query: &Query, path: &PathBuf, count: bool, show_name: bool) -> anyhow::Result<()> {
    let file = dwq_dw::load_file(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut initial = Stack::new();
    initial.push(dwq_dw::dwarf_value(file));

    let mut total = 0usize;
    for result in query.run(initial) {
        let stack = result.context("query failed")?;
        total += 1;
        if !count {
            print_stack(&stack);
        }
    }
    if count {
        if show_name {
            println!("{}: {}", path.display(), total);
        } else {
            println!("{total}");
        }
    }
    Ok(())
}

/// Values top-down, one per line, stacks separated by `---`.
fn print_stack(stack: &Stack) {
    println!("---");
    for value in stack.values().iter().rev() {
        println!("{value}");
    }
}
