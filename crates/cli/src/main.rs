use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecochat_agent::{ChatProvider, ModelState, ProviderConfig, Responder, DEFAULT_BASE_URL};
use ecochat_core::{normalize_text, ModelMode};
use ecochat_ml::trainer::train_and_persist;
use ecochat_ml::{load_artifacts, IntentClassifier};
use ecochat_observability::{init_tracing, AppMetrics, LogFormat};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "ecochat")]
#[command(about = "EcoChat trainer and offline tools")]
struct Cli {
    #[arg(long, env = "ECOCHAT_MODEL_PATH", default_value = "model.json", global = true)]
    model_path: PathBuf,

    #[arg(long, env = "ECOCHAT_INTENTS_PATH", default_value = "intents_data.json", global = true)]
    intents_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit the classifier from an intents file and write both artifacts.
    Train {
        #[arg(long, env = "ECOCHAT_INTENTS_SOURCE", default_value = "data/intents.json")]
        intents: PathBuf,
    },
    /// Classify one message and print the full distribution.
    Predict { text: String },
    /// Interactive chat through the same responder the server uses.
    Chat {
        #[arg(long, env = "MODEL_NAME", default_value = "local")]
        model_name: String,
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
        #[arg(long, env = "ECOCHAT_SEED")]
        seed: Option<u64>,
    },
}

#[derive(Debug, Serialize)]
struct PredictionReport {
    text: String,
    normalized: String,
    tag: String,
    confidence: Option<f64>,
    distribution: Vec<TagProbability>,
}

#[derive(Debug, Serialize)]
struct TagProbability {
    tag: String,
    probability: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("ecochat_cli", LogFormat::Compact);
    let cli = Cli::parse();

    match cli.command {
        Command::Train { intents } => {
            let summary = train_and_persist(&intents, &cli.model_path, &cli.intents_path)?;
            println!("Trained on {} samples across {} intents.", summary.samples, summary.classes);
            println!("Vocabulary size: {}", summary.vocabulary);
            println!("Model saved to {}", summary.model_path.display());
            println!("Intents data saved to {}", summary.intents_path.display());
        }
        Command::Predict { text } => {
            let artifacts = load_artifacts(&cli.model_path, &cli.intents_path)
                .context("failed loading model artifacts")?;
            let normalized = normalize_text(&text);
            let prediction = artifacts.model.predict(&normalized)?;

            let mut distribution = artifacts
                .model
                .distribution(&normalized)
                .unwrap_or_default()
                .into_iter()
                .map(|(tag, probability)| TagProbability { tag, probability })
                .collect::<Vec<_>>();
            distribution.sort_by(|a, b| b.probability.total_cmp(&a.probability));

            let report = PredictionReport {
                text,
                normalized,
                tag: prediction.tag,
                confidence: prediction.confidence,
                distribution,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Chat {
            model_name,
            api_key,
            base_url,
            seed,
        } => {
            let mode = ModelMode::from_model_name(Some(&model_name));
            let model = ModelState::load(&cli.model_path, &cli.intents_path);
            let mut responder = Responder::new(mode.clone(), model, AppMetrics::shared());
            if matches!(mode, ModelMode::Provider(_)) {
                responder = responder.with_provider(ChatProvider::new(ProviderConfig {
                    api_key,
                    base_url,
                })?);
            }
            if let Some(seed) = seed {
                responder = responder.with_seed(seed);
            }
            run_chat(responder).await?;
        }
    }

    Ok(())
}

async fn run_chat(responder: Responder) -> Result<()> {
    println!("EcoChat chat mode ({}). type 'exit' to quit.", responder.mode().label());

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = responder.respond(message).await;
        println!("\n{}\n", reply.text);
        if let Some(tag) = reply.tag {
            println!("[{tag} {:.2}]\n", reply.confidence);
        }
    }

    Ok(())
}
