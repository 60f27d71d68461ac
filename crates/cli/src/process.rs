use anyhow::{Context, Result};
use clap::Parser;
use mealforge::{process_ai_response_str, ProcessedResponse};
use serde_json::{json, Value};
use std::io::Read;
use tracing::info;

#[derive(Parser, Debug)]
pub struct ProcessArgs {
    /// The operation the text answers (meal_generation, food_analysis, ...)
    #[arg(long, default_value = "meal_generation")]
    kind: String,
    /// The file holding the model's text; read from stdin when omitted
    path: Option<String>,
    /// Wrap the record with the pipeline state and accepting strategy
    #[arg(long)]
    debug: bool,
}

pub fn handle_process(args: &ProcessArgs) -> Result<()> {
    let text = match &args.path {
        Some(path) => {
            info!("Processing file: {}", path);
            std::fs::read_to_string(path).with_context(|| format!("Failed to read '{path}'"))?
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let processed = process_ai_response_str(&text, &args.kind);
    println!("{}", render(processed, args.debug)?);
    Ok(())
}

/// Pretty JSON of the record, optionally wrapped with how it was produced.
pub fn render(processed: ProcessedResponse, debug: bool) -> Result<String> {
    let output = if debug {
        json!({
            "state": processed.state,
            "strategy": processed.strategy,
            "record": processed.record,
        })
    } else {
        Value::Object(processed.record)
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
