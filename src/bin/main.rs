use clap::Parser;
use std::{
    io,
    path::{Path, PathBuf},
    process,
};
use tlox::{config::DEFAULT_MAX_RUNTIME_ERRORS, Config, Lox, Outcome};
use tracing_subscriber::EnvFilter;

/// Tree-walking interpreter for small `program { ... }` scripts.
///
/// Without a SCRIPT, statements are read from a prompt one line at a time.
#[derive(Parser)]
#[command(name = "tlox")]
#[command(version)]
struct Cli {
    /// Source file to run
    script: Option<PathBuf>,
    /// Runtime errors tolerated before evaluation is abandoned
    #[arg(long, env = "TLOX_MAX_ERRORS", default_value_t = DEFAULT_MAX_RUNTIME_ERRORS)]
    max_errors: usize,
    /// Print the parsed program instead of running it
    #[arg(long)]
    ast: bool,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config { max_runtime_errors: cli.max_errors };

    let outcome = match &cli.script {
        Some(path) => run_file(path, config, cli.ast)?,
        None => run_prompt(config)?,
    };

    if outcome != Outcome::Success {
        process::exit(outcome.exit_code());
    }
    Ok(())
}

fn run_file(path: &Path, config: Config, print_ast: bool) -> io::Result<Outcome> {
    let contents = std::fs::read_to_string(path)?;
    let stdin = io::stdin();
    let mut lox = Lox::new(stdin.lock(), io::stdout(), io::stderr()).with_config(config);
    let outcome = if print_ast {
        lox.print_ast(contents.as_str())?
    } else {
        lox.run(contents.as_str())?
    };
    Ok(outcome)
}

fn run_prompt(config: Config) -> io::Result<Outcome> {
    let stdin = io::stdin();
    let mut lox = Lox::new(stdin.lock(), io::stdout(), io::stderr()).with_config(config);
    let outcome = lox.run_prompt(io::stdout())?;
    Ok(outcome)
}
