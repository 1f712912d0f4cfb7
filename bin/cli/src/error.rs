//! Error types for the command line.

use std::fmt;

/// Why a command could not run to completion.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The graph file could not be read.
    ReadGraph { path: String, details: String },
    /// The graph file is not a workflow graph.
    ParseGraph { path: String, details: String },
    /// The devnet chain client rejected its configuration.
    Chain { details: String },
    /// The engine refused the workflow.
    Workflow { details: String },
    /// A result could not be written to stdout.
    Output { details: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "failed to load configuration: {details}"),
            Self::ReadGraph { path, details } => {
                write!(f, "failed to read graph '{path}': {details}")
            }
            Self::ParseGraph { path, details } => {
                write!(f, "'{path}' is not a workflow graph: {details}")
            }
            Self::Chain { details } => write!(f, "invalid devnet configuration: {details}"),
            Self::Workflow { details } => write!(f, "{details}"),
            Self::Output { details } => write!(f, "failed to write output: {details}"),
        }
    }
}

impl std::error::Error for CliError {}
