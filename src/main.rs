//! # Pagewright CLI
//!
//! Usage:
//!   pagewright brief.json -o brief.pdf --input-kind project
//!   echo '{ ... }' | pagewright -o out.pdf
//!   pagewright report.json --input-kind analysis      (saved under uploads/pdfs)
//!   pagewright full.json --input-kind detailed-analysis --prefix detailed-ai-report
//!   pagewright --example > brief.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use pagewright::{DocumentAssembler, GeneratorConfig, InputKind, PdfStore};

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(version)]
#[command(about = "Render project briefs and analysis reports to PDF", long_about = None)]
struct Cli {
    /// JSON input; read from stdin when omitted
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the PDF here instead of the configured output directory
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Generator configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// What the input describes
    #[arg(long, value_enum, default_value = "document")]
    input_kind: CliInputKind,

    /// Filename prefix when saving to the output directory
    #[arg(long, default_value = "document")]
    prefix: String,

    /// Print a sample project bundle and exit
    #[arg(long)]
    example: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliInputKind {
    Document,
    Project,
    Analysis,
    DetailedAnalysis,
}

impl From<CliInputKind> for InputKind {
    fn from(kind: CliInputKind) -> Self {
        match kind {
            CliInputKind::Document => InputKind::Document,
            CliInputKind::Project => InputKind::Project,
            CliInputKind::Analysis => InputKind::Analysis,
            CliInputKind::DetailedAnalysis => InputKind::DetailedAnalysis,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.example {
        print!("{}", example_project_json());
        return Ok(());
    }

    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::default(),
    };
    let kind = InputKind::from(cli.input_kind);
    kind.apply_footer_defaults(&mut config);

    let spec = kind.to_spec(&input, Utc::now())?;
    let store = PdfStore::from_config(&config.output);
    let rendered = DocumentAssembler::new(config).generate(&spec)?;

    match &cli.output {
        Some(path) => {
            rendered.write_to(path)?;
            eprintln!(
                "Written {} pages ({} bytes) to {}",
                rendered.page_count,
                rendered.bytes.len(),
                path.display()
            );
        }
        None => {
            let stored = store.save(&rendered, &cli.prefix)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
    }
    Ok(())
}

fn example_project_json() -> &'static str {
    r##"{
  "project": {
    "_id": "65f1c0ffee",
    "title": "Acme Site",
    "description": "A marketing site for Acme Inc, a family bakery opening its second shop. The site should present the menu, take pre-orders for celebration cakes and tell the story of the founders. Visitors are mostly local parents browsing on their phones in the evening, so pages must load fast and the ordering flow must fit on a small screen.",
    "client": { "name": "Acme Inc" },
    "category": "Web Development",
    "priority": "high",
    "startDate": "2024-03-04",
    "endDate": "2024-05-31",
    "budget": 12000,
    "currency": "MAD"
  },
  "questions": [
    {
      "question": "Who is the main audience?",
      "answer": "Parents in Casablanca planning birthdays.",
      "section": "audience",
      "sectionName": "Audience",
      "type": "text",
      "order": 1
    },
    {
      "question": "Primary color?",
      "answer": "#ff0000, #00ff00",
      "section": "branding",
      "sectionName": "Branding",
      "type": "color",
      "order": 1
    }
  ],
  "template": {
    "title": "Bakery Classic",
    "shortDesc": "Warm, photo-led layout with a sticky order button.",
    "colors": ["#131313", "#f5e6d3", "#c2410c"],
    "structure": "TEMPLATE 1 (PAGE 1: HOME)\nheader:\n  - logo left\n  - order button right\nhero:\n  - full-width photo\nbackground: #f5e6d3"
  }
}
"##
}
