//! pkgfmt: canonical formatter and editor for PKGBUILD files.
//!
//! - **stdin mode**: `pkgfmt < PKGBUILD` prints the formatted recipe
//! - **file mode**: `pkgfmt -w pkgs/*/PKGBUILD` rewrites files in place,
//!   `pkgfmt --check pkgs/` lists files that are not in canonical layout

use anyhow::{bail, Context, Result};
use clap::Parser;
use pkgfmt::parser::quote::{scan_value, Scan};
use pkgfmt::render::create_renderer;
use pkgfmt::{parse, Document, Style, Tables};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "pkgfmt",
    about = "Format and edit PKGBUILD files in a canonical layout"
)]
struct Cli {
    /// PKGBUILD files, directories containing one, or glob patterns.
    /// If omitted, reads from stdin.
    files: Vec<String>,

    /// Rewrite files in place instead of printing them
    #[arg(short = 'w', long, conflicts_with = "check")]
    write: bool,

    /// List files whose layout is not canonical and exit with status 1
    #[arg(long)]
    check: bool,

    /// Output format: pkgbuild (default), json
    #[arg(short = 'f', long, default_value = "pkgbuild")]
    format: String,

    /// Treat NAME as a known variable laid out as STYLE (NAME=STYLE).
    /// Can be specified multiple times.
    #[arg(long = "style", value_name = "NAME=STYLE", value_parser = parse_style)]
    styles: Vec<(String, Style)>,

    /// Set a variable before rendering, e.g. --set pkgrel=2 or
    /// --set 'depends=(glibc zlib)'. Can be specified multiple times.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    set: Vec<Assignment>,

    /// Remove every entry with this name before rendering
    #[arg(long = "unset", value_name = "NAME")]
    unset: Vec<String>,

    /// Log parsing details to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// A `--set` argument: raw words, and whether they were parenthesized.
#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    name: String,
    values: Vec<String>,
    array: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let tables = cli
        .styles
        .iter()
        .fold(Tables::standard().clone(), |t, (name, style)| {
            t.with_style(name, *style)
        });

    if cli.files.is_empty() {
        stdin_mode(&cli, &tables)?;
        return Ok(ExitCode::SUCCESS);
    }

    file_mode(&cli, &tables)
}

fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();
}

/// stdin mode: read one recipe from stdin, write the result to stdout.
fn stdin_mode(cli: &Cli, tables: &Tables) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    print!("{}", process(cli, tables, &input).context("<stdin>")?);
    Ok(())
}

/// file mode: format every matched file, then print, rewrite or check it.
fn file_mode(cli: &Cli, tables: &Tables) -> Result<ExitCode> {
    if (cli.write || cli.check) && cli.format != "pkgbuild" {
        bail!("--write and --check only apply to the pkgbuild format");
    }
    let input_files = expand_globs(&cli.files)?;
    let mut unformatted = 0;

    for path in &input_files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let output = process(cli, tables, &content)
            .with_context(|| format!("failed to format {}", path.display()))?;

        if cli.check {
            if output != content {
                println!("{}", path.display());
                unformatted += 1;
            }
        } else if cli.write {
            if output != content {
                fs::write(path, &output)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                log::info!("reformatted {}", path.display());
            }
        } else {
            print!("{}", output);
        }
    }

    if unformatted > 0 {
        log::warn!("{} of {} files need formatting", unformatted, input_files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse, apply the requested edits and render one recipe.
fn process(cli: &Cli, tables: &Tables, input: &str) -> Result<String> {
    let mut doc = parse(input, tables)?;
    apply_edits(&mut doc, cli, tables);
    let renderer = create_renderer(&cli.format, tables)?;
    renderer.render(&doc)
}

fn apply_edits(doc: &mut Document, cli: &Cli, tables: &Tables) {
    for name in &cli.unset {
        if doc.remove_all(name) == 0 {
            log::warn!("--unset {}: no such entry", name);
        }
    }
    for set in &cli.set {
        let values: Vec<&str> = set.values.iter().map(String::as_str).collect();
        doc.set_variable(tables, &set.name, &values, set.array);
    }
}

fn split_key_value(arg: &str) -> Result<(&str, &str), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(format!("expected NAME=VALUE, got {}", arg)),
    }
}

fn parse_style(arg: &str) -> Result<(String, Style), String> {
    let (name, style) = split_key_value(arg)?;
    Ok((name.to_string(), style.parse()?))
}

fn parse_assignment(arg: &str) -> Result<Assignment, String> {
    let (name, value) = split_key_value(arg)?;
    match scan_value(value) {
        Scan::Complete { array, tokens } => Ok(Assignment {
            name: name.to_string(),
            values: tokens,
            array,
        }),
        _ => Err(format!("not a plain shell value: {}", value)),
    }
}

/// Expand glob patterns into a list of real file paths.
/// A directory stands for the PKGBUILD inside it.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let candidate = path.join("PKGBUILD");
            if !candidate.is_file() {
                bail!("no PKGBUILD in directory: {}", path.display());
            }
            files.push(candidate);
            continue;
        }
        // Try as glob
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            log::warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}
