use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use novelsum_core::{
    Config, ExtractedText, GraphRankSummarizer, HfInferenceBackend, NeuralSummarizer,
    SummaryLength, SummaryParams, config_file, extract_text,
};
use novelsum_pdf_mupdf::MupdfBackend;

mod output;

use output::{ColorMode, JsonReport};

/// PDF Novel Summarizer - neural and TextRank summaries of a PDF novel
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Produce a neural and a TextRank summary of a PDF
    Summarize {
        /// Path to the PDF file
        file_path: PathBuf,

        /// Maximum neural summary length in model tokens (50-300)
        #[arg(long)]
        max_length: Option<usize>,

        /// Fraction of sentences kept by TextRank (0.1-0.5)
        #[arg(long, conflicts_with = "words")]
        ratio: Option<f64>,

        /// Approximate TextRank summary length in words, instead of a ratio
        #[arg(long)]
        words: Option<usize>,

        /// Characters of the document handed to the neural model
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        max_input_chars: Option<usize>,

        /// Model id on the inference endpoint
        #[arg(long)]
        model: Option<String>,

        /// Only produce the TextRank summary
        #[arg(long)]
        skip_neural: bool,

        /// Print a JSON object instead of text
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dry run: extract and print the text of a PDF
    Extract {
        /// Path to the PDF file
        file_path: PathBuf,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write the current effective settings to the platform config file
        #[arg(long)]
        save: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for summaries and JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let file = config_file::load_config();
    let mut config = config_file::resolve(&file);
    config.apply_env();

    match cli.command {
        Command::Summarize {
            file_path,
            max_length,
            ratio,
            words,
            max_input_chars,
            model,
            skip_neural,
            json,
            no_color,
            output,
        } => {
            if let Some(n) = max_input_chars {
                config.max_input_chars = n;
            }
            if let Some(m) = model {
                config.model = m;
            }
            let opts = SummarizeOptions {
                max_length: max_length.unwrap_or(config.default_params.max_length),
                ratio: ratio.unwrap_or(config.default_params.ratio),
                words,
                skip_neural,
                json,
                color: ColorMode(!no_color && !json && output.is_none()),
            };
            summarize(&config, &file_path, opts, output).await
        }
        Command::Extract { file_path, output } => extract(&config, &file_path, output).await,
        Command::Config { save, no_color } => show_config(&config, save, ColorMode(!no_color)),
    }
}

struct SummarizeOptions {
    max_length: usize,
    ratio: f64,
    words: Option<usize>,
    skip_neural: bool,
    json: bool,
    color: ColorMode,
}

fn open_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}

/// Read the PDF on the blocking pool.
async fn load_document(config: &Config, file_path: &Path) -> anyhow::Result<ExtractedText> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.pdf".to_string());

    let backend = MupdfBackend::from_config(config);
    let path = file_path.to_path_buf();
    let doc = tokio::task::spawn_blocking(move || extract_text(&path, &filename, &backend))
        .await
        .context("extraction task failed")?
        .with_context(|| format!("failed to read {}", file_path.display()))?;
    Ok(doc)
}

fn spinner(message: &'static str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn summarize(
    config: &Config,
    file_path: &Path,
    opts: SummarizeOptions,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let params = SummaryParams::new(opts.max_length, opts.ratio)
        .with_context(|| format!("allowed ranges: {}", output::param_ranges()))?;
    if opts.words == Some(0) {
        anyhow::bail!("--words must be greater than zero");
    }

    let mut writer = open_writer(output.as_deref())?;
    let color = opts.color;
    let show_spinner = !opts.json && output.is_none();

    let doc = load_document(config, file_path).await?;
    if doc.is_empty() {
        if opts.json {
            anyhow::bail!(output::NO_TEXT_MESSAGE);
        }
        output::print_no_text(&mut writer, color)?;
        return Ok(());
    }
    let doc = Arc::new(doc);
    if !opts.json {
        output::print_document_header(&mut writer, &doc, color)?;
    }

    let neural_summary = if opts.skip_neural {
        None
    } else {
        if config.api_token.is_none() {
            tracing::warn!("HF_API_TOKEN is not set; the inference endpoint may reject requests");
        }
        let client = reqwest::Client::new();
        let neural =
            NeuralSummarizer::new(Arc::new(HfInferenceBackend::from_config(client, config)))
                .with_max_input_chars(config.max_input_chars)
                .with_min_length(config.min_length);

        let pb = spinner("Generating neural summary...", show_spinner);
        let result = neural.summarize(&doc.text, params.max_length).await;
        pb.finish_and_clear();
        let summary = result.context("neural summary failed")?;

        if !opts.json {
            output::print_summary(&mut writer, "Neural Summary", &summary, color)?;
        }
        Some(summary)
    };

    let graph_rank = GraphRankSummarizer::from_config(config);
    let pb = spinner("Generating TextRank summary...", show_spinner);
    let graph_summary = match opts.words {
        Some(words) => {
            let doc = doc.clone();
            tokio::task::spawn_blocking(move || {
                graph_rank.summarize_with(&doc.text, SummaryLength::Words(words))
            })
            .await
            .context("TextRank task failed")??
        }
        None => graph_rank.summarize_document(doc.clone(), params.ratio).await?,
    };
    pb.finish_and_clear();

    if opts.json {
        let report = JsonReport {
            filename: &doc.filename,
            pages: doc.pages,
            chars: doc.char_count(),
            max_length: params.max_length,
            ratio: opts.words.is_none().then_some(params.ratio),
            words: opts.words,
            neural: neural_summary.as_deref(),
            graph_rank: &graph_summary,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        output::print_summary(&mut writer, "TextRank Summary", &graph_summary, color)?;
    }

    Ok(())
}

async fn extract(config: &Config, file_path: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut writer = open_writer(output.as_deref())?;
    let doc = load_document(config, file_path).await?;
    if doc.is_empty() {
        output::print_no_text(&mut writer, ColorMode(false))?;
        return Ok(());
    }
    write!(writer, "{}", doc.text)?;
    if !doc.text.ends_with('\n') {
        writeln!(writer)?;
    }
    Ok(())
}

fn show_config(config: &Config, save: bool, color: ColorMode) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    let path = config_file::config_path();
    output::print_config(&mut stdout, config, path.as_deref(), color)?;

    if save {
        let saved = config_file::save_config(&to_config_file(config))?;
        writeln!(stdout)?;
        writeln!(stdout, "Saved to {}", saved.display())?;
    }
    Ok(())
}

/// Snapshot of the effective settings, minus the API token.
fn to_config_file(config: &Config) -> config_file::ConfigFile {
    use config_file::{ConfigFile, NeuralConfig, PdfConfig, ServerConfig, SummaryConfig};

    ConfigFile {
        neural: Some(NeuralConfig {
            inference_url: Some(config.inference_url.clone()),
            model: Some(config.model.clone()),
            api_token: None,
            request_timeout_secs: Some(config.request_timeout_secs),
            wait_for_model: Some(config.wait_for_model),
            max_input_chars: Some(config.max_input_chars),
            min_length: Some(config.min_length),
        }),
        summary: Some(SummaryConfig {
            max_length: Some(config.default_params.max_length),
            ratio: Some(config.default_params.ratio),
            language: Some(config.language.clone()),
            additional_stopwords: Some(config.additional_stopwords.clone()),
            unwrap_lines: Some(config.unwrap_lines),
        }),
        pdf: Some(PdfConfig {
            footer_exclusion: config.footer_exclusion,
            header_exclusion: config.header_exclusion,
        }),
        server: Some(ServerConfig {
            bind: Some(config.bind.clone()),
            max_upload_mb: Some(config.max_upload_mb),
            session_ttl_secs: Some(config.session_ttl_secs),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summarize_flags() {
        let cli = Cli::try_parse_from([
            "novelsum",
            "summarize",
            "book.pdf",
            "--max-length",
            "200",
            "--ratio",
            "0.3",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Summarize {
                file_path,
                max_length,
                ratio,
                json,
                ..
            } => {
                assert_eq!(file_path, PathBuf::from("book.pdf"));
                assert_eq!(max_length, Some(200));
                assert_eq!(ratio, Some(0.3));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ratio_and_words_conflict() {
        let err = Cli::try_parse_from([
            "novelsum", "summarize", "book.pdf", "--ratio", "0.3", "--words", "100",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn max_input_chars_must_be_positive() {
        let parse = |n: &str| {
            Cli::try_parse_from(["novelsum", "summarize", "book.pdf", "--max-input-chars", n])
        };
        assert!(parse("0").is_err());
        match parse("1").unwrap().command {
            Command::Summarize {
                max_input_chars, ..
            } => assert_eq!(max_input_chars, Some(1)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn saved_config_omits_token() {
        let config = Config {
            api_token: Some("hf_secret".into()),
            ..Config::default()
        };
        let file = to_config_file(&config);
        assert!(file.neural.as_ref().unwrap().api_token.is_none());
        let round = config_file::resolve(&file);
        assert_eq!(round.model, config.model);
        assert_eq!(round.default_params, config.default_params);
    }
}
