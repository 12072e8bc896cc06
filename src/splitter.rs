//! Single-pass G-code classifier and rewriter.
//!
//! [`Rewriter`] walks the source line by line through HEADER → BODY → FOOTER.
//! Header and footer lines are always kept; body lines are kept when the
//! current layer falls inside the requested [`LayerRange`]. Lines after the
//! final layer marker belong to that last layer until the end-of-gcode marker.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::config::Markers;
use crate::error::{LayerchopError, ParseWarning};
use crate::scan::{JobRequest, LayerRange, Phase, ScanState};
use crate::ui::ScanProgress;

/// What a finished scan learned and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub state: ScanState,
    pub range: LayerRange,
    pub lines_read: usize,
    pub lines_written: usize,
    pub warnings: Vec<ParseWarning>,
}

/// Execution summary shown to the operator after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub slicer: Option<String>,
    pub layer_count: Option<i64>,
    pub begin: i64,
    pub end: Option<i64>,
    pub message: Option<String>,
    pub lines_read: usize,
    pub lines_written: usize,
    pub warnings: Vec<ParseWarning>,
}

impl ScanSummary {
    pub fn new(request: &JobRequest, report: ScanReport) -> Self {
        Self {
            source: request.source.clone(),
            output: request.output.clone(),
            slicer: report.state.slicer,
            layer_count: report.state.layer_count,
            begin: report.range.begin,
            end: report.range.end,
            message: request.message.clone(),
            lines_read: report.lines_read,
            lines_written: report.lines_written,
            warnings: report.warnings,
        }
    }
}

/// Classifies each source line and writes the kept ones to `sink`.
///
/// With no sink (info-only mode) the scan runs identically but writes nothing.
pub struct Rewriter<'m, W: Write> {
    markers: &'m Markers,
    state: ScanState,
    range: LayerRange,
    message: Option<String>,
    sink: Option<W>,
    line_no: usize,
    lines_written: usize,
    warnings: Vec<ParseWarning>,
}

impl<'m, W: Write> Rewriter<'m, W> {
    pub fn new(
        markers: &'m Markers,
        range: LayerRange,
        message: Option<String>,
        sink: Option<W>,
    ) -> Self {
        Self {
            markers,
            state: ScanState::new(),
            range,
            message,
            sink,
            line_no: 0,
            lines_written: 0,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Process one source line (without its terminator).
    ///
    /// Lines are raw bytes; only marker values need to be valid UTF-8.
    pub fn feed(&mut self, line: &[u8]) -> Result<(), LayerchopError> {
        self.line_no += 1;
        match self.state.phase {
            Phase::Header => self.feed_header(line),
            Phase::Body => self.feed_body(line),
            Phase::Footer => self.emit(line),
        }
    }

    fn feed_header(&mut self, line: &[u8]) -> Result<(), LayerchopError> {
        let markers = self.markers;
        if let Some(name) = line.strip_prefix(markers.generator.as_bytes()) {
            self.state.slicer = Some(String::from_utf8_lossy(name.trim_ascii()).into_owned());
        }
        self.emit(line)?;

        let Some(value) = line.strip_prefix(markers.layer_count.as_bytes()) else {
            return Ok(());
        };
        if let Some(count) = self.parse_marker(&markers.layer_count, value) {
            self.state.layer_count = Some(count);
            self.range.discover_layer_count(count);
        }
        self.state.advance(Phase::Body)?;

        if self.range.is_inverted() {
            log::warn!(
                "layer range {}..={} is inverted; no body lines will be kept",
                self.range.begin,
                self.range.end.unwrap_or_default()
            );
        }
        if let Some(message) = &self.message {
            let status = markers.status_line(message);
            self.emit(status.as_bytes())?;
        }
        Ok(())
    }

    fn feed_body(&mut self, line: &[u8]) -> Result<(), LayerchopError> {
        let markers = self.markers;
        if let Some(value) = line.strip_prefix(markers.layer.as_bytes())
            && let Some(layer) = self.parse_marker(&markers.layer, value)
        {
            self.state.current_layer = layer;
        }

        if line.starts_with(markers.end_of_gcode.as_bytes()) {
            self.state.advance(Phase::Footer)?;
            for command in &markers.shutdown {
                self.emit(command.as_bytes())?;
            }
            return self.emit(line);
        }

        if self.range.contains(self.state.current_layer) {
            self.emit(line)?;
        }
        Ok(())
    }

    // A bad value is reported and skipped; the caller keeps its previous state.
    fn parse_marker(&mut self, marker: &str, value: &[u8]) -> Option<i64> {
        let value = value.trim_ascii();
        let parsed = std::str::from_utf8(value)
            .ok()
            .and_then(|text| text.parse::<i64>().ok());
        if parsed.is_none() {
            let warning = ParseWarning {
                line: self.line_no,
                marker: marker.to_string(),
                value: String::from_utf8_lossy(value).into_owned(),
            };
            log::warn!("{warning}");
            self.warnings.push(warning);
        }
        parsed
    }

    fn emit(&mut self, line: &[u8]) -> Result<(), LayerchopError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(line)?;
            sink.write_all(b"\n")?;
            self.lines_written += 1;
        }
        Ok(())
    }

    /// Flush the sink and hand back what the scan found.
    pub fn finish(mut self) -> Result<(ScanReport, Option<W>), LayerchopError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        let report = ScanReport {
            state: self.state,
            range: self.range,
            lines_read: self.line_no,
            lines_written: self.lines_written,
            warnings: self.warnings,
        };
        Ok((report, self.sink))
    }
}

/// Lines of `text` split on `\n`; a trailing newline does not start another line.
pub fn source_lines(text: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = text.strip_suffix(b"\n").unwrap_or(text);
    (!text.is_empty())
        .then(|| body.split(|&b| b == b'\n'))
        .into_iter()
        .flatten()
}

/// Read the request's source, rewrite it into the sub-job file and summarize.
///
/// The source is read in full before the output is created, so an unreadable
/// source never leaves an output file behind. Once it is read, the output is
/// always (re)created, even when nothing ends up written to it.
pub fn run(
    request: &JobRequest,
    markers: &Markers,
    progress: &ScanProgress,
) -> Result<ScanSummary, LayerchopError> {
    let text = std::fs::read(&request.source).map_err(|source| LayerchopError::ReadSource {
        path: request.source.clone(),
        source,
    })?;
    log::debug!(
        "read {} bytes from {}",
        text.len(),
        request.source.display()
    );

    let sink = match &request.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| LayerchopError::CreateOutput {
                path: path.clone(),
                source,
            })?;
            log::debug!("created {}", path.display());
            Some(BufWriter::new(file))
        }
        None => {
            log::debug!("info only, nothing will be written");
            None
        }
    };
    let mut rewriter = Rewriter::new(markers, request.range, request.message.clone(), sink);

    progress.start(&request.source, source_lines(&text).count() as u64);
    for line in source_lines(&text) {
        rewriter.feed(line).map_err(|err| write_error(request, err))?;
        progress.inc();
    }
    progress.finish();
    log::debug!("scan ended in {}", rewriter.state().phase);

    let (report, sink) = rewriter.finish().map_err(|err| write_error(request, err))?;
    if let Some(writer) = sink {
        sync(writer).map_err(|err| write_error(request, err.into()))?;
    }

    Ok(ScanSummary::new(request, report))
}

// Flush buffered lines and sync the file to disk.
fn sync(writer: BufWriter<File>) -> std::io::Result<()> {
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()
}

// Attach the output path to a raw IO failure.
fn write_error(request: &JobRequest, err: LayerchopError) -> LayerchopError {
    match (err, request.output.clone()) {
        (LayerchopError::Io(source), Some(path)) => LayerchopError::WriteOutput { path, source },
        (err, _) => err,
    }
}
