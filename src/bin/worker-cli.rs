use std::io::Write;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::{json, Map, Value};

use kobold_worker::proxy::sse::{LineDecoder, DATA_PREFIX, EVENT_PREFIX};
use kobold_worker::proxy::{DECODE_FAILURE_EVENT, DONE_EVENT, FAILED_EVENT};

#[derive(Parser)]
#[command(name = "worker-cli")]
#[command(about = "Submit jobs to a running kobold-worker", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job and print its result envelope
    Runsync {
        api_name: String,
        /// Extra input fields as a JSON object
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Run a job and print output chunks as they arrive
    Stream {
        api_name: String,
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Check that the worker is serving
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Runsync { api_name, input } => {
            let res = client
                .post(format!("{}/runsync", cli.url))
                .json(&job_body(&api_name, input.as_deref())?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stream { api_name, input } => {
            let res = client
                .post(format!("{}/stream", cli.url))
                .json(&job_body(&api_name, input.as_deref())?)
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            print_events(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn job_body(api_name: &str, input: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut fields = match input {
        Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)?,
        None => Map::new(),
    };
    fields.insert("api_name".to_string(), Value::String(api_name.to_string()));
    Ok(json!({ "input": fields }))
}

async fn print_events(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let mut decoder = LineDecoder::new();
    let mut body = res.bytes_stream();
    let mut event_name: Option<String> = None;

    while let Some(bytes) = body.next().await {
        for line in decoder.push(&bytes?) {
            if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
                event_name = Some(name.trim().to_string());
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                if line.is_empty() {
                    event_name = None;
                }
                continue;
            };

            let event: Value = serde_json::from_str(payload.trim_start())?;
            match event_name.as_deref() {
                Some(DONE_EVENT) => {
                    println!();
                    return Ok(());
                }
                Some(FAILED_EVENT) => {
                    println!();
                    eprintln!("Error: {}", event["error"].as_str().unwrap_or("stream broke off"));
                    return Ok(());
                }
                Some(DECODE_FAILURE_EVENT) => eprint!("[decode error]"),
                _ => match &event["output"] {
                    Value::String(s) => print!("{}", s),
                    other => println!("{}", serde_json::to_string_pretty(other)?),
                },
            }
            std::io::stdout().flush()?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: worker returned status {}", status);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
