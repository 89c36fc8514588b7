//! hengban - horizontal Traditional Chinese ebook converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hengban::{CommandConverter, ConversionConfig, Converter, LineHeight, OutputKind};

#[derive(Parser)]
#[command(name = "hengban")]
#[command(version, about = "Restyle EPUB/PDF for horizontal Traditional Chinese, or flatten to Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    hengban book.epub                       Restyle to book_轉換完成.epub
    hengban book.epub book.md               Flatten to Markdown
    hengban scan.pdf --format epub          Rebuild a PDF as EPUB
    hengban book.epub --line-height 1.8 --converter-command 'opencc -c s2tw.json'
    hengban -i book.epub                    Show book metadata")]
struct Cli {
    /// Input file (EPUB or PDF)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file; defaults to INPUT_轉換完成.<format> next to the input
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output format: epub or md (default: from OUTPUT's extension, else epub)
    #[arg(short, long)]
    format: Option<OutputKind>,

    /// Line height applied to restyled pages
    #[arg(short, long)]
    line_height: Option<LineHeight>,

    /// JSON file with conversion settings; flags take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// External Simplified → Traditional filter reading stdin, writing stdout
    #[arg(long, value_name = "CMD")]
    converter_command: Option<String>,

    /// Show book metadata without converting
    #[arg(short, long)]
    info: bool,

    /// Print metadata as JSON (with --info)
    #[arg(long, requires = "info")]
    json: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let result = if cli.info { show_info(&cli) } else { convert(&cli) };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_converter(cli: &Cli, output: OutputKind) -> hengban::Result<Converter> {
    let mut config = match cli.config {
        Some(ref path) => ConversionConfig::from_json_file(path)?,
        None => ConversionConfig::default(),
    };
    config = config.with_output(output);
    if let Some(ref line_height) = cli.line_height {
        config = config.with_line_height(line_height.clone());
    }

    let converter = Converter::new(config)?;
    Ok(match cli.converter_command {
        Some(ref command) => {
            converter.with_script_converter(Box::new(CommandConverter::from_command_line(command)?))
        }
        None => converter,
    })
}

/// Output kind: `--format`, then OUTPUT's extension, then the config file.
fn resolve_output_kind(cli: &Cli) -> hengban::Result<OutputKind> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    if let Some(ref output) = cli.output
        && let Some(ext) = output.extension().and_then(|e| e.to_str())
    {
        if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") {
            return Ok(OutputKind::StructuredText);
        }
        return Ok(OutputKind::Archive);
    }
    match cli.config {
        Some(ref path) => Ok(ConversionConfig::from_json_file(path)?.output),
        None => Ok(OutputKind::default()),
    }
}

fn default_output_path(input: &Path, output: OutputKind) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = match output {
        OutputKind::Archive => "epub",
        OutputKind::StructuredText => "md",
    };
    input.with_file_name(format!("{stem}_轉換完成.{ext}"))
}

fn convert(cli: &Cli) -> hengban::Result<()> {
    let kind = resolve_output_kind(cli)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, kind));
    let converter = build_converter(cli, kind)?;

    converter.convert_file(&cli.input, &output)?;

    if !cli.quiet {
        let size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
        println!(
            "{} -> {} ({}, line height {}, {})",
            cli.input.display(),
            output.display(),
            match kind {
                OutputKind::Archive => "EPUB",
                OutputKind::StructuredText => "Markdown",
            },
            converter.config().line_height,
            format_size(size)
        );
    }
    Ok(())
}

fn show_info(cli: &Cli) -> hengban::Result<()> {
    let converter = build_converter(cli, OutputKind::default())?;
    let data = std::fs::read(&cli.input)?;
    let name = cli.input.to_string_lossy();
    let format = hengban::SourceFormat::detect(&data, Some(&name))?;
    let metadata = converter.inspect(&data, Some(&name))?;

    if cli.json {
        let value = serde_json::json!({
            "file": cli.input.display().to_string(),
            "format": format.to_string(),
            "title": metadata.title,
            "author": metadata.author,
        });
        println!("{value:#}");
        return Ok(());
    }

    println!("File: {}", cli.input.display());
    println!("Format: {format}");
    println!("Title: {}", metadata.title);
    if let Some(ref author) = metadata.author {
        println!("Author: {author}");
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
