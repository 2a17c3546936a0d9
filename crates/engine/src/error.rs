use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Oracle failure: {0}")]
    OracleFailure(#[from] OracleError),

    #[error("Structural violation: {}", format_violations(.0))]
    StructuralViolation(Vec<Violation>),

    #[error("Failed to read {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseFailure(msg.into())
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailure {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a single Content Oracle exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("oracle returned an error: {0}")]
    Api(String),

    #[error("oracle call timed out after {0}s")]
    Timeout(u64),

    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// A file-level structural invariant broken by a patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Violation {
    MissingImport(String),
    MissingExport(String),
    MissingPrimaryIdentifier(String),
    MissingDefaultExport,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingImport(line) => write!(f, "missing import: {line}"),
            Self::MissingExport(line) => write!(f, "missing export: {line}"),
            Self::MissingPrimaryIdentifier(name) => write!(f, "missing primary identifier: {name}"),
            Self::MissingDefaultExport => write!(f, "missing default export"),
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_violation_lists_every_invariant() {
        let err = EngineError::StructuralViolation(vec![
            Violation::MissingExport("export default Login;".into()),
            Violation::MissingDefaultExport,
        ]);
        assert_eq!(
            err.to_string(),
            "Structural violation: missing export: export default Login;; missing default export"
        );
    }

    #[test]
    fn oracle_error_converts() {
        let err: EngineError = OracleError::Timeout(5).into();
        assert!(matches!(err, EngineError::OracleFailure(OracleError::Timeout(5))));
    }
}
