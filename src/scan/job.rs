use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::LayerchopError;

/// The layer window a sub-job keeps from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRange {
    pub begin: i64,
    /// `None` until the header reports the layer count (or forever, if it never does).
    pub end: Option<i64>,
    /// Set by an explicit `-to`; the discovered layer count no longer applies.
    end_locked: bool,
}

impl LayerRange {
    /// Resolve the begin/end flags into a range.
    ///
    /// `-beginning` and `-from` both name the first layer, as do `-end` and `-to`
    /// for the last; giving both forms of either boundary is a usage error.
    pub fn resolve(
        beginning: bool,
        from: Option<i64>,
        end: bool,
        to: Option<i64>,
    ) -> Result<Self, LayerchopError> {
        if beginning && from.is_some() {
            return Err(LayerchopError::Usage(
                "-beginning and -from cannot be combined".into(),
            ));
        }
        if end && to.is_some() {
            return Err(LayerchopError::Usage("-end and -to cannot be combined".into()));
        }

        Ok(Self {
            begin: from.unwrap_or(0),
            end: to,
            end_locked: to.is_some(),
        })
    }

    /// Apply the total layer count read from the header.
    pub fn discover_layer_count(&mut self, count: i64) {
        if !self.end_locked {
            self.end = Some(count);
        }
    }

    /// Whether a body line on `layer` belongs to this sub-job.
    pub fn contains(&self, layer: i64) -> bool {
        match self.end {
            Some(end) => self.begin <= layer && layer <= end,
            None => false,
        }
    }

    /// A begin past the end keeps no body lines at all.
    pub fn is_inverted(&self) -> bool {
        self.end.is_some_and(|end| self.begin > end)
    }
}

/// One invocation's worth of work, fixed before the scan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub source: PathBuf,
    /// Destination file; `None` in info-only mode.
    pub output: Option<PathBuf>,
    pub range: LayerRange,
    /// Text for the `M117` status line injected after the header.
    pub message: Option<String>,
}

impl JobRequest {
    pub fn from_cli(cli: &Cli) -> Result<Self, LayerchopError> {
        let range = LayerRange::resolve(cli.beginning, cli.from, cli.end, cli.to)?;

        let output = if cli.info {
            None
        } else {
            match (cli.ordinal, cli.count) {
                (Some(ordinal), Some(count)) => Some(output_path(&cli.source, ordinal, count)),
                _ => {
                    return Err(LayerchopError::Usage(
                        "-ordinal and -count are required unless -info is given".into(),
                    ));
                }
            }
        };

        Ok(Self {
            source: cli.source.clone(),
            output,
            range,
            message: cli.msg.clone(),
        })
    }

    pub fn info_only(&self) -> bool {
        self.output.is_none()
    }
}

/// `dir/Model.gcode` → `dir/Model_<ordinal>of<count>.gcode`
pub fn output_path(source: &Path, ordinal: u32, count: u32) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_{ordinal}of{count}");
    if let Some(ext) = source.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    source.with_file_name(name)
}
