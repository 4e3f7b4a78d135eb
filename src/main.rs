mod dispatch;
mod inspect;
mod parser;
mod pie;
mod pivot;
mod remap;
mod rows;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dispatch::{ChartInput, ChartState};
use serde::Serialize;
use std::io::{self, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum InputFormat {
    Auto,
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "chartprep")]
#[command(about = "Prepare tabular data for charting using a pipeline DSL", long_about = None)]
struct Args {
    /// Chart DSL string (e.g., 'chart(type: line, x: year, y: volume) | legend(region)')
    dsl: String,

    /// Input format; auto detects JSON by a leading bracket
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    input_format: InputFormat,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct PreparedChart {
    chart_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(flatten)]
    state: ChartState,
}

fn read_rows(text: &str, format: InputFormat) -> Result<Vec<rows::Row>> {
    let is_json = match format {
        InputFormat::Json => true,
        InputFormat::Csv => false,
        InputFormat::Auto => text.trim_start().starts_with('['),
    };
    if is_json {
        let value = serde_json::from_str(text).context("Failed to parse JSON input")?;
        rows::rows_from_json(&value)
    } else {
        rows::rows_from_csv(text)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Parse the DSL string
    let spec = match parser::parse_chart_spec(&args.dsl) {
        Ok((remaining, spec)) => {
            if !remaining.trim().is_empty() {
                eprintln!("Warning: unparsed input: '{}'", remaining);
            }
            spec
        }
        Err(e) => {
            eprintln!("Parse error: {:?}", e);
            std::process::exit(1);
        }
    };

    // Read data from stdin
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read data from stdin")?;
    let data = read_rows(&text, args.input_format).context("Failed to read input data")?;

    let state = dispatch::evaluate(&ChartInput {
        rows: Some(&data),
        loading: false,
        chart_type: spec.chart_type,
        config: &spec.config,
        aggregation: spec.aggregation,
    });

    let prepared = PreparedChart {
        chart_type: spec.chart_type.as_str().to_string(),
        title: spec.title,
        state,
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&prepared)
    } else {
        serde_json::to_string(&prepared)
    }
    .context("Failed to encode output")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", output).context("Failed to write output")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
