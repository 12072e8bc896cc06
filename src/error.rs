use std::path::PathBuf;

use thiserror::Error;

use crate::scan::Phase;

#[derive(Debug, Error)]
pub enum LayerchopError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Cannot read {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan cannot move from {from} back to {to}")]
    PhaseRegression { from: Phase, to: Phase },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A marker whose value could not be parsed as a layer number.
///
/// These never abort a scan; the previous value is kept.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseWarning {
    /// 1-based line number in the source file.
    pub line: usize,
    pub marker: String,
    pub value: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: `{}` value {:?} is not an integer",
            self.line, self.marker, self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_warning_display() {
        let w = ParseWarning {
            line: 12,
            marker: ";LAYER:".into(),
            value: "abc".into(),
        };
        assert_eq!(
            w.to_string(),
            "line 12: `;LAYER:` value \"abc\" is not an integer"
        );
    }

    #[test]
    fn phase_regression_display() {
        let err = LayerchopError::PhaseRegression {
            from: Phase::Footer,
            to: Phase::Body,
        };
        assert_eq!(err.to_string(), "Scan cannot move from FOOTER back to BODY");
    }
}
