//! docpy CLI - Generate API documentation from Python sources.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use docpy::builder::Docpy;
use docpy::errors::{exit_code, DocpyError};
use docpy::output::OutputFormat;
use docpy::scanner::DEFAULT_TAB_WIDTH;
use docpy::walker::{is_module_path, WalkOptions};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "docpy")]
#[command(about = "Generate Markdown/HTML documentation for a Python module or package")]
#[command(version)]
struct Cli {
    /// Module (.py) or package directory to document
    #[arg(required_unless_present = "completions")]
    path: Option<PathBuf>,

    /// Output Markdown instead of HTML
    #[arg(short, long)]
    md: bool,

    /// Document all objects, including those without docstrings
    #[arg(short, long)]
    all: bool,

    /// Output JSON to stdout
    #[arg(long, conflicts_with = "md")]
    json: bool,

    /// Columns a tab advances indentation to
    #[arg(long, default_value_t = DEFAULT_TAB_WIDTH)]
    tab_width: usize,

    /// Skip paths matching this glob (package mode, repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Include hidden files and directories (package mode)
    #[arg(long)]
    include_hidden: bool,

    /// Directory for package pages [default: <package>_docs]
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "docpy", &mut std::io::stdout());
        return;
    }

    let json_output = cli.json;
    if let Err(e) = run(cli) {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
                code: i32,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
                code: exit_code(&e),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<(), DocpyError> {
    let Some(path) = cli.path else {
        return Ok(());
    };
    if !path.exists() {
        return Err(DocpyError::PathNotFound(path));
    }

    let format = if cli.json {
        OutputFormat::Json
    } else if cli.md {
        OutputFormat::Markdown
    } else {
        OutputFormat::Html
    };

    let walk_options = WalkOptions {
        include_hidden: cli.include_hidden,
        ..Default::default()
    }
    .exclude(&cli.exclude)?;

    let mut docpy = Docpy::new(&path)
        .format(format)
        .document_all(cli.all)
        .tab_width(cli.tab_width)
        .walk_options(walk_options);
    if let Some(dir) = cli.output_dir {
        docpy = docpy.output_dir(dir);
    }

    if path.is_file() {
        if !is_module_path(&path) {
            log::warn!("{} has no .py extension; documenting anyway", path.display());
        }
        let text = docpy.module_text()?;
        if !text.is_empty() {
            println!("{}", text.trim_end());
        }
        return Ok(());
    }

    if format == OutputFormat::Json {
        println!("{}", docpy.package_json()?);
        return Ok(());
    }

    let (docs, written) = docpy.write_package()?;
    for path in &written {
        println!("{}", path.display());
    }
    if !docs.skipped.is_empty() {
        eprintln!("skipped {} unreadable module(s)", docs.skipped.len());
    }
    Ok(())
}
