use std::fmt;

use crate::error::LayerchopError;

/// The three sections of a slicer G-code file.
///
/// A scan flows through: HEADER → BODY → FOOTER
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Header,
    Body,
    Footer,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Header => write!(f, "HEADER"),
            Phase::Body => write!(f, "BODY"),
            Phase::Footer => write!(f, "FOOTER"),
        }
    }
}

/// Everything the rewriter learns while walking the source once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    pub phase: Phase,
    /// Last layer number seen in the body, -1 until the first layer marker.
    pub current_layer: i64,
    pub slicer: Option<String>,
    pub layer_count: Option<i64>,
}

impl ScanState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Header,
            current_layer: -1,
            slicer: None,
            layer_count: None,
        }
    }

    /// Move to the next phase.
    ///
    /// Only single forward steps are accepted; the footer is terminal.
    pub fn advance(&mut self, next: Phase) -> Result<(), LayerchopError> {
        let allowed = matches!(
            (self.phase, next),
            (Phase::Header, Phase::Body) | (Phase::Body, Phase::Footer)
        );
        if !allowed {
            return Err(LayerchopError::PhaseRegression {
                from: self.phase,
                to: next,
            });
        }
        log::debug!("phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_in_header_with_unknown_layer() {
        let state = ScanState::new();
        assert_eq!(state.phase, Phase::Header);
        assert_eq!(state.current_layer, -1);
        assert!(state.slicer.is_none());
        assert!(state.layer_count.is_none());
    }

    #[test]
    fn happy_path_walks_all_phases() {
        let mut state = ScanState::new();
        state.advance(Phase::Body).unwrap();
        assert_eq!(state.phase, Phase::Body);
        state.advance(Phase::Footer).unwrap();
        assert_eq!(state.phase, Phase::Footer);
    }

    #[test]
    fn footer_is_terminal() {
        let mut state = ScanState::new();
        state.advance(Phase::Body).unwrap();
        state.advance(Phase::Footer).unwrap();

        let err = state.advance(Phase::Body).unwrap_err();
        assert!(matches!(
            err,
            LayerchopError::PhaseRegression {
                from: Phase::Footer,
                to: Phase::Body
            }
        ));
        assert!(state.advance(Phase::Footer).is_err());
        assert_eq!(state.phase, Phase::Footer);
    }

    #[test]
    fn header_cannot_skip_body() {
        let mut state = ScanState::new();
        assert!(state.advance(Phase::Footer).is_err());
        assert_eq!(state.phase, Phase::Header);
    }

    #[test]
    fn phases_are_ordered() {
        assert!(Phase::Header < Phase::Body);
        assert!(Phase::Body < Phase::Footer);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Header.to_string(), "HEADER");
        assert_eq!(Phase::Body.to_string(), "BODY");
        assert_eq!(Phase::Footer.to_string(), "FOOTER");
    }
}
