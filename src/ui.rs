//! Terminal output: scan progress and the run summary.
//!
//! Uses `indicatif` for a line progress bar on stderr (hidden when stderr is
//! not a terminal) and `console` for colored summary labels.

use std::path::Path;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::splitter::ScanSummary;

/// Progress of one scan plus the styles used to report on it.
pub struct ScanProgress {
    pb: ProgressBar,
    label: Style,
    green: Style,
    yellow: Style,
}

impl ScanProgress {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        // A bad template only loses the bar's styling.
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len} lines")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        Self::with_bar(pb)
    }

    /// Draws nothing; used for `-json` output and tests.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(pb: ProgressBar) -> Self {
        Self {
            pb,
            label: Style::new().bold(),
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn start(&self, source: &Path, total_lines: u64) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.pb.set_length(total_lines);
        self.pb.set_message(name);
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Print the human-readable summary to stdout.
    pub fn print_summary(&self, summary: &ScanSummary) {
        println!("{}", self.render_summary(summary));
    }

    /// Print the summary as pretty JSON to stdout.
    pub fn print_json(&self, summary: &ScanSummary) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(summary)?);
        Ok(())
    }

    fn render_summary(&self, summary: &ScanSummary) -> String {
        let mut lines = vec![self.field("Original:  ", &summary.source.display().to_string())];
        if let Some(slicer) = &summary.slicer {
            lines.push(self.field("Slicer:    ", slicer));
        }
        if let Some(count) = summary.layer_count {
            lines.push(self.field("Layers:    ", &count.to_string()));
        }

        if let Some(output) = &summary.output {
            lines.push(format!("{}", self.label.apply_to("Slicing:")));
            lines.push(self.field("  Output filename: ", &output.display().to_string()));
            lines.push(self.field("  From:            ", &summary.begin.to_string()));
            let end = summary.end.map_or_else(|| "N/A".to_string(), |e| e.to_string());
            lines.push(self.field("  To:              ", &end));
            if let Some(message) = &summary.message {
                lines.push(self.field("  Msg:             ", &format!("{message:?}")));
            }
        }

        if !summary.warnings.is_empty() {
            lines.push(format!(
                "{}",
                self.yellow.apply_to(format!(
                    "{} marker value(s) could not be parsed",
                    summary.warnings.len()
                ))
            ));
        }

        lines.push(String::new());
        lines.push(format!("{}", self.green.apply_to("Finished.")));
        lines.join("\n")
    }

    fn field(&self, label: &str, value: &str) -> String {
        format!("{} {value}", self.label.apply_to(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn summary(output: Option<&str>) -> ScanSummary {
        ScanSummary {
            source: PathBuf::from("/prints/Model.gcode"),
            output: output.map(PathBuf::from),
            slicer: Some("Cura_SteamEngine 2.3.1".into()),
            layer_count: Some(120),
            begin: 40,
            end: Some(80),
            message: Some("Blue PLA".into()),
            lines_read: 1000,
            lines_written: 400,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn summary_lists_slicing_details() {
        console::set_colors_enabled(false);
        let text = ScanProgress::hidden().render_summary(&summary(Some("/prints/Model_2of3.gcode")));
        assert!(text.contains("Original:   /prints/Model.gcode"));
        assert!(text.contains("Slicer:     Cura_SteamEngine 2.3.1"));
        assert!(text.contains("Layers:     120"));
        assert!(text.contains("Output filename:  /prints/Model_2of3.gcode"));
        assert!(text.contains("From:             40"));
        assert!(text.contains("To:               80"));
        assert!(text.contains("Msg:              \"Blue PLA\""));
        assert!(text.ends_with("Finished."));
    }

    #[test]
    fn info_summary_omits_slicing_section() {
        console::set_colors_enabled(false);
        let text = ScanProgress::hidden().render_summary(&summary(None));
        assert!(text.contains("Layers:     120"));
        assert!(!text.contains("Slicing:"));
        assert!(!text.contains("Msg:"));
    }

    #[test]
    fn summary_serializes_to_json() {
        let json = serde_json::to_value(summary(None)).unwrap();
        assert_eq!(json["layer_count"], 120);
        assert_eq!(json["slicer"], "Cura_SteamEngine 2.3.1");
        assert!(json["output"].is_null());
    }
}
