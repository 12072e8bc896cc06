mod job;
mod state;

pub use job::{JobRequest, LayerRange};
pub use state::{Phase, ScanState};
