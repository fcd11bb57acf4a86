//! Test utilities and fixtures for the Anchor compiler.
//!
//! Shared by `anchorc-core`'s own integration tests and by `anchorc-cli`
//! and `anchorc-lsp`, whenever a test wants a full compile without
//! shelling out to `ancc`.

pub mod compile;
pub mod fixtures;
