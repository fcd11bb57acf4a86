//! Rust-level fallibility for the driver (SPEC_FULL.md "Error handling").
//!
//! This is distinct from `anchorc_core::errors::Errors`, which records
//! diagnostics *about the user's Anchor source*. `DriverError` covers
//! everything that can go wrong running the compiler itself: a missing
//! manifest, a host compiler that isn't on `PATH`, a spawn failure, an
//! output directory that can't be created.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Manifest(#[from] anchorc_core::manifest::ManifestError),

    #[error("cannot create output directory {0}")]
    CreateOutDir(PathBuf, #[source] std::io::Error),

    #[error("cannot write {0}")]
    WriteFile(PathBuf, #[source] std::io::Error),

    #[error("cannot read source file {0}")]
    ReadSource(PathBuf, #[source] std::io::Error),

    #[error("compilation failed with {0} diagnostic error(s)")]
    CompileErrors(usize),

    #[error("failed to invoke host C compiler '{0}'")]
    SpawnHostCompiler(String, #[source] std::io::Error),

    #[error("host C compiler exited with status {0}:\n{1}")]
    HostCompilerFailed(std::process::ExitStatus, String),

    #[error("failed to execute compiled binary {0}")]
    RunBinary(PathBuf, #[source] std::io::Error),

    #[error("editor-protocol server error: {0}")]
    Lsp(#[source] anyhow::Error),
}
