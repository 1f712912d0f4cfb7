//! Shared `Result` alias.
//!
//! Library crates keep their own typed error enums (`ChainError`,
//! `CompileError`, `WorkflowError`) and the engine's public entry points
//! report them as `Report<E>`. Callers inspect the typed cause with
//! `report.current_context()`.

use rootcause::Report;

/// A `Result` whose error is a rootcause [`Report`] over context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
