//! Rich diagnostic error types for the ibis engine.
//!
//! Each subsystem defines its own error enum next to its code, with miette
//! `#[diagnostic]` derives providing error codes and help text; this module
//! aggregates them transparently so the full diagnostic chain survives to
//! the caller.

use miette::Diagnostic;
use thiserror::Error;

use crate::channel::ChannelError;
use crate::dme::DmeError;
use crate::domain::DomainError;
use crate::rules::RuleError;
use crate::seeds::SeedError;

/// Top-level error type for the ibis engine.
#[derive(Debug, Error, Diagnostic)]
pub enum IbisError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dme(#[from] DmeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Seed(#[from] SeedError),
}

/// Convenience alias used across the crate.
pub type IbisResult<T> = std::result::Result<T, IbisError>;
