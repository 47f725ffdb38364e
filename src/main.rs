use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rustydigest::{
    api,
    config::{self, SummaryMode},
    extraction, logging,
    processing::{DigestService, SummaryOptions, SummaryOutcome},
};
use tokio::net::TcpListener;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "rustydigest",
    version,
    about = "Summarize PDF documents with a chunk-then-reduce pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize PDF files, or every PDF under the given directories.
    Summarize {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// `single-stage` or `two-stage` (defaults to SUMMARY_MODE).
        #[arg(long, value_parser = parse_mode)]
        mode: Option<SummaryMode>,
        /// Chunk budget in the configured unit (defaults to CHUNK_MAX_SIZE).
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Skip the LaTeX/whitespace cleaner.
        #[arg(long)]
        no_clean: bool,
        /// Print one JSON object per document instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Print the text extracted from a PDF.
    Extract {
        path: PathBuf,
        /// Print the whole text instead of the preview.
        #[arg(long)]
        full: bool,
        /// Preview length in characters (defaults to PREVIEW_MAX_CHARS).
        #[arg(long, conflicts_with = "full")]
        max_chars: Option<usize>,
    },
    /// Run the HTTP API.
    Serve,
}

fn parse_mode(raw: &str) -> Result<SummaryMode, String> {
    raw.parse()
        .map_err(|_| format!("unknown mode '{raw}' (expected single-stage or two-stage)"))
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config().context("invalid configuration")?;
    logging::init_tracing();

    match cli.command {
        Command::Summarize {
            paths,
            mode,
            chunk_size,
            no_clean,
            json,
        } => {
            let options = SummaryOptions {
                mode,
                chunk_size,
                clean: no_clean.then_some(false),
            };
            summarize(&paths, options, json).await
        }
        Command::Extract {
            path,
            full,
            max_chars,
        } => extract(&path, full, max_chars).await,
        Command::Serve => serve().await,
    }
}

async fn summarize(paths: &[PathBuf], options: SummaryOptions, json: bool) -> Result<()> {
    let documents = collect_pdfs(paths)?;
    if documents.is_empty() {
        bail!("no PDF files found");
    }

    let service = DigestService::new();
    let mut failures = 0usize;
    for path in &documents {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                failures += 1;
                eprintln!("error: failed to read {}: {err}", path.display());
                continue;
            }
        };
        match service.summarize_pdf(bytes, options).await {
            Ok(outcome) => print_summary(path, &outcome, json)?,
            Err(err) => {
                failures += 1;
                eprintln!("error: {}: {err}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} documents failed", documents.len());
    }
    Ok(())
}

fn print_summary(path: &Path, outcome: &SummaryOutcome, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(outcome).context("failed to encode summary")?;
        if let Some(map) = value.as_object_mut() {
            map.insert("path".into(), path.display().to_string().into());
        }
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    println!("== {} ==", path.display());
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning.message);
    }
    println!("{}", outcome.summary);
    println!();
    Ok(())
}

/// Expand directories into the PDFs they contain, keeping explicit files as given.
fn collect_pdfs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if !path.is_dir() {
            documents.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && is_pdf(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        documents.extend(found);
    }
    Ok(documents)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn extract(path: &Path, full: bool, max_chars: Option<usize>) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let service = DigestService::new();
    let document = service
        .extract(bytes)
        .await
        .with_context(|| format!("failed to extract {}", path.display()))?;

    if full {
        println!("{}", document.text);
    } else {
        let limit = max_chars.unwrap_or(service.config().preview_max_chars);
        println!("{}", extraction::preview(&document.text, limit).text);
    }
    eprintln!("{} pages", document.page_count);
    Ok(())
}

async fn serve() -> Result<()> {
    let app = api::create_router(Arc::new(DigestService::new()));

    let (listener, port) = bind_listener().await.context("failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4100..=4199;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4100-4199",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn summarize_flags_parse() {
        let cli = Cli::try_parse_from([
            "rustydigest",
            "summarize",
            "a.pdf",
            "docs",
            "--mode",
            "single",
            "--chunk-size",
            "200",
            "--no-clean",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::Summarize {
                paths,
                mode,
                chunk_size,
                no_clean,
                json,
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(mode, Some(SummaryMode::SingleStage));
                assert_eq!(chunk_size, Some(200));
                assert!(no_clean);
                assert!(!json);
            }
            _ => panic!("expected summarize"),
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["rustydigest", "summarize", "a.pdf", "--mode", "x"]).is_err());
    }

    #[test]
    fn pdf_extension_check_ignores_case() {
        assert!(is_pdf(Path::new("report.PDF")));
        assert!(is_pdf(Path::new("dir/report.pdf")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }
}
