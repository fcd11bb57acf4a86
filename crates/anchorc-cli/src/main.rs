//! `ancc` — the Anchor compiler's command-line driver.
//!
//! Argument dispatch only: every actual compilation step lives in
//! `anchorc-core`, this binary just wires argv to it, reads the package
//! manifest, and invokes the host C compiler.

mod driver;
mod errors;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ancc")]
#[command(author, version, about = "Anchor-to-C compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read `<dir>/anchor`, compile the package, invoke the host C compiler.
    Build {
        dir: Option<PathBuf>,
        /// Print each module's symbol table after analysis (supplemental
        /// to the documented exit contract, default off).
        #[arg(long)]
        dump_symbols: bool,
    },
    /// Compile a single file into a temp directory and execute it.
    Run { file: PathBuf },
    /// Compile a single file into `-o <dir>` and stop; no execution.
    Compile {
        file: PathBuf,
        #[arg(short = 'o', long = "out-dir")]
        out_dir: PathBuf,
    },
    /// Enter the editor-protocol server loop on stdin/stdout.
    Lsp { dir: Option<PathBuf> },
    /// Print the token stream for a file.
    Lexer { file: PathBuf },
    /// Print the parsed AST for a file.
    Ast { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Build { dir, dump_symbols } => {
            let dir = dir.clone().unwrap_or_else(|| PathBuf::from("."));
            driver::build(&dir, *dump_symbols)
        }
        Commands::Run { file } => driver::run(file),
        Commands::Compile { file, out_dir } => driver::compile(file, out_dir),
        Commands::Lsp { dir } => {
            let dir = dir.clone().unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
            anchorc_lsp::run(dir).map_err(crate::errors::DriverError::Lsp)
        }
        Commands::Lexer { file } => driver::dump_lexer(file),
        Commands::Ast { file } => driver::dump_ast(file),
    };

    if let Err(err) = result {
        eprintln!("ancc: {err}");
        std::process::exit(1);
    }
    Ok(())
}
