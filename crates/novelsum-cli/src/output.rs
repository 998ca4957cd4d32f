use std::io::Write;

use novelsum_core::{Config, ExtractedText, SummaryParams};
use owo_colors::OwoColorize;
use serde::Serialize;

pub const NO_TEXT_MESSAGE: &str = "The uploaded file does not contain extractable text!";

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Machine-readable result of `summarize --json`.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub filename: &'a str,
    pub pages: usize,
    pub chars: usize,
    pub max_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<usize>,
    pub neural: Option<&'a str>,
    pub graph_rank: &'a str,
}

/// Print the line describing what was extracted.
pub fn print_document_header(
    w: &mut dyn Write,
    doc: &ExtractedText,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "{}: {} pages, {} characters",
        doc.filename,
        doc.pages,
        doc.char_count()
    );
    if color.enabled() {
        writeln!(w, "{}", line.dimmed())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    writeln!(w)?;
    Ok(())
}

pub fn print_no_text(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", NO_TEXT_MESSAGE.yellow().bold())
    } else {
        writeln!(w, "{}", NO_TEXT_MESSAGE)
    }
}

/// Print one labeled summary block.
pub fn print_summary(
    w: &mut dyn Write,
    label: &str,
    body: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", label.bold().cyan())?;
    } else {
        writeln!(w, "{}", label)?;
    }
    writeln!(w, "{}", "-".repeat(label.len()))?;
    if body.trim().is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "(empty)".dimmed())?;
        } else {
            writeln!(w, "(empty)")?;
        }
    } else {
        writeln!(w, "{}", body)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print the effective configuration for `novelsum config`.
pub fn print_config(
    w: &mut dyn Write,
    config: &Config,
    path: Option<&std::path::Path>,
    color: ColorMode,
) -> std::io::Result<()> {
    let heading = |w: &mut dyn Write, s: &str| -> std::io::Result<()> {
        if color.enabled() {
            writeln!(w, "{}", s.bold())
        } else {
            writeln!(w, "{}", s)
        }
    };

    match path {
        Some(p) => writeln!(w, "Config file: {}", p.display())?,
        None => writeln!(w, "Config file: (no config directory)")?,
    }
    writeln!(w)?;

    heading(w, "[neural]")?;
    writeln!(w, "inference_url = {}", config.inference_url)?;
    writeln!(w, "model = {}", config.model)?;
    writeln!(
        w,
        "api_token = {}",
        if config.api_token.is_some() { "(set)" } else { "(not set)" }
    )?;
    writeln!(w, "request_timeout_secs = {}", config.request_timeout_secs)?;
    writeln!(w, "max_input_chars = {}", config.max_input_chars)?;
    writeln!(w, "min_length = {}", config.min_length)?;
    writeln!(w)?;

    heading(w, "[summary]")?;
    writeln!(w, "max_length = {}", config.default_params.max_length)?;
    writeln!(w, "ratio = {}", config.default_params.ratio)?;
    writeln!(w, "language = {}", config.language)?;
    writeln!(w, "additional_stopwords = {:?}", config.additional_stopwords)?;
    writeln!(w, "unwrap_lines = {}", config.unwrap_lines)?;
    writeln!(w)?;

    heading(w, "[server]")?;
    writeln!(w, "bind = {}", config.bind)?;
    writeln!(w, "max_upload_mb = {}", config.max_upload_mb)?;
    writeln!(w, "session_ttl_secs = {}", config.session_ttl_secs)?;
    Ok(())
}

/// Slider ranges, shown in `--help` footers and error hints.
pub fn param_ranges() -> String {
    format!(
        "max length {}-{}, ratio {}-{}",
        SummaryParams::MIN_MAX_LENGTH,
        SummaryParams::MAX_MAX_LENGTH,
        SummaryParams::MIN_RATIO,
        SummaryParams::MAX_RATIO
    )
}
