//! Command-line interface built on clap.
//!
//! The tool keeps the single-dash long flags its users already script against
//! (`-from=14`, `-info`); [`normalize_args`] rewrites them to clap's `--from=14`
//! form before [`Cli`] parses them.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};

/// Split a slicer G-code file into a sub-job covering a range of layers.
#[derive(Debug, Parser)]
#[command(name = "layerchop", version, about)]
pub struct Cli {
    /// G-code file produced by the slicer.
    pub source: PathBuf,

    /// Start from the first layer of the file.
    #[arg(long, conflicts_with = "from")]
    pub beginning: bool,

    /// Start from the given layer.
    #[arg(long, value_name = "LAYER", allow_negative_numbers = true)]
    pub from: Option<i64>,

    /// Stop at the last layer reported by the slicer.
    #[arg(long, conflicts_with = "to")]
    pub end: bool,

    /// Stop at the given layer, whatever the file's layer count.
    #[arg(long, value_name = "LAYER", allow_negative_numbers = true)]
    pub to: Option<i64>,

    /// Position of this sub-job, used in the output filename.
    #[arg(long, required_unless_present = "info")]
    pub ordinal: Option<u32>,

    /// Total number of sub-jobs, used in the output filename.
    #[arg(long, required_unless_present = "info")]
    pub count: Option<u32>,

    /// Only report slicer and layer information; write nothing.
    #[arg(long, default_value_t = false)]
    pub info: bool,

    /// Message shown on the printer display (M117) when the sub-job starts.
    #[arg(long, allow_hyphen_values = true)]
    pub msg: Option<String>,

    /// Enable debug logging.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,

    /// Print the run summary as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Marker configuration file (defaults to ./layerchop.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Rewrite Go-style `-flag` arguments into clap's `--flag`.
///
/// Short flags (`-v`), negative numbers, the value following a value-taking
/// flag written without `=` (`-msg "-Red PLA"`) and everything after a bare
/// `--` are passed through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let value_flags: Vec<String> = Cli::command()
        .get_arguments()
        .filter(|arg| arg.get_action().takes_values())
        .filter_map(|arg| arg.get_long().map(str::to_string))
        .collect();

    let mut normalized = Vec::new();
    let mut passthrough = false;
    let mut expects_value = false;
    for (i, arg) in args.into_iter().map(Into::into).enumerate() {
        if i == 0 || passthrough || expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }
        let Some(s) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };
        if s == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }

        let name = s.trim_start_matches('-');
        let is_flag = s.starts_with('-') && name.starts_with(|c: char| c.is_ascii_alphabetic());
        expects_value = is_flag && !name.contains('=') && value_flags.iter().any(|f| f == name);

        if is_flag && s.len() > 2 && !s.starts_with("--") {
            normalized.push(OsString::from(format!("-{s}")));
        } else {
            normalized.push(arg);
        }
    }
    normalized
}

/// Usage text printed on any command-line mistake.
pub fn syntax() -> String {
    [
        "Syntax: layerchop [flags] GCodeFilePath",
        "",
        "        -beginning | -from=14   (selects starting layer to print)",
        "        -end | -to=24           (selects ending layer to print)",
        "        -ordinal=1 & -count=3   (will append \"_1of3\" for output filename)",
        "        -info                   (displays layer information in file only)",
        "        -msg=\"Blue PLA\"         (adds M117 message information to GCODE file)",
        "        -json                   (prints the summary as JSON)",
        "        -config=layerchop.toml  (reads marker settings from the given file)",
        "        -verbose                (enables debug logging)",
        "",
    ]
    .join("\n")
}
