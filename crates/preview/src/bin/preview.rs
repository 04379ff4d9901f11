// ABOUTME: CLI binary for the link preview pipeline.
// ABOUTME: Fetches URLs (or reads an HTML file) and prints PreviewRecord JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use digests_preview::{Pipeline, PreviewRecord};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "preview")]
#[command(about = "Extract link previews from web pages")]
struct Args {
    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// HTML file to extract from (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Source URL for the HTML file (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Maximum images per preview
    #[arg(long = "max-images", default_value_t = 5)]
    max_images: usize,

    /// Maximum sentences in the summary
    #[arg(long = "max-sentences", default_value_t = 3)]
    max_sentences: usize,

    /// Maximum characters in the summary
    #[arg(long = "max-chars", default_value_t = 280)]
    max_chars: usize,

    /// Omit reading time from article previews
    #[arg(long = "no-reading-time")]
    no_reading_time: bool,

    /// Per-attempt fetch timeout in seconds
    #[arg(long = "timeout", default_value_t = 5)]
    timeout: u64,

    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,

    /// Single-line JSON instead of pretty-printed
    #[arg(long = "compact")]
    compact: bool,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// URLs to preview (fetch mode)
    #[arg()]
    urls: Vec<String>,
}

fn format_output(records: &[PreviewRecord], compact: bool) -> serde_json::Result<String> {
    match (records, compact) {
        ([single], true) => serde_json::to_string(single),
        ([single], false) => serde_json::to_string_pretty(single),
        (many, true) => serde_json::to_string(many),
        (many, false) => serde_json::to_string_pretty(many),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let html_mode = match (&args.html, &args.url) {
        (Some(path), Some(url)) => Some((path, url)),
        (Some(_), None) => {
            eprintln!("error: --url is required when using --html");
            return ExitCode::from(2);
        }
        (None, _) => None,
    };
    if html_mode.is_none() && args.urls.is_empty() {
        eprintln!("error: at least one URL is required, or use --html with --url");
        return ExitCode::from(2);
    }
    if html_mode.is_some() && !args.urls.is_empty() {
        eprintln!("error: cannot use both --html and positional URLs");
        return ExitCode::from(2);
    }

    let pipeline = Pipeline::builder()
        .max_images(args.max_images)
        .max_sentences(args.max_sentences)
        .max_chars(args.max_chars)
        .include_reading_time(!args.no_reading_time)
        .timeout(Duration::from_secs(args.timeout))
        .allow_private_networks(args.allow_private_networks)
        .build();

    let start = Instant::now();
    let mut records: Vec<PreviewRecord> = Vec::new();

    if let Some((html_path, url)) = html_mode {
        match fs::read_to_string(html_path) {
            Ok(html) => records.push(pipeline.extract(&html, url)),
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                return ExitCode::from(1);
            }
        }
    } else {
        let fetcher = match pipeline.http_fetcher() {
            Ok(fetcher) => fetcher,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        };
        for url in &args.urls {
            records.push(pipeline.preview(&fetcher, url).await);
        }
    }

    let elapsed = start.elapsed();
    let mut had_error = records.iter().any(PreviewRecord::is_error);

    match format_output(&records, args.compact) {
        Ok(output) => {
            if let Some(output_path) = &args.output {
                if let Err(e) = fs::write(output_path, &output) {
                    eprintln!("error writing to {:?}: {}", output_path, e);
                    had_error = true;
                }
            } else {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("error serializing output: {}", e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
