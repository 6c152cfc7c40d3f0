// VahtaChat backend entry point
// Local intent answers first, remote completion second, generic template last

mod actors;
mod brain;
mod config;
mod error;
mod history;
mod models;
mod server;
mod telemetry;

#[cfg(test)]
mod tests;

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use actors::supervisor::SupervisorHandle;
use brain::{JobBoard, JobListing, Reply};
use config::AppConfig;
use history::{HistoryStore, HISTORY_KEY};
use models::{AskRequest, CommunityContext};
use server::AppState;

#[derive(Parser)]
#[command(name = "vahtachat", version, about = "Chat assistant for a shift-work community")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Address to bind, overrides BIND_ADDR / PORT
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Answer one question and print the JSON body
    Ask {
        question: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Interactive terminal chat with persistent history
    Chat {
        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(clap::Args)]
struct ContextArgs {
    /// JSON file with the community description
    #[arg(long)]
    community: Option<PathBuf>,
    /// JSON file mapping job categories to listings
    #[arg(long)]
    jobs: Option<PathBuf>,
}

impl ContextArgs {
    fn load(&self) -> anyhow::Result<(Option<CommunityContext>, Option<JobBoard>)> {
        let community: Option<CommunityContext> =
            self.community.as_deref().map(read_json).transpose()?;
        let jobs: Option<JobBoard> = self.jobs.as_deref().map(read_json).transpose()?;
        Ok((community, jobs))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("invalid configuration")?;
    telemetry::init_tracing(config.log_format);

    let supervisor = SupervisorHandle::new(&config);

    match cli.command.unwrap_or(Command::Serve { addr: None }) {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or(config.bind_addr);
            info!(gateway = supervisor.gateway_configured(), "Starting VahtaChat backend");
            server::serve(addr, AppState { supervisor }).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask { question, context } => {
            let (community, jobs) = context.load()?;
            let request = AskRequest {
                question,
                community,
                jobs,
                history: Vec::new(),
            };
            match supervisor.ask(request).await {
                Ok(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.to_body())?);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Chat { context } => {
            let (community, jobs) = context.load()?;
            let mut store = HistoryStore::open(&config.data_dir, HISTORY_KEY)?;
            run_chat(&supervisor, &mut store, community, jobs).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_chat(
    supervisor: &SupervisorHandle,
    store: &mut HistoryStore,
    community: Option<CommunityContext>,
    jobs: Option<JobBoard>,
) -> anyhow::Result<()> {
    println!("VahtaChat. /clear очищает историю, /exit завершает работу.");
    for entry in store.entries() {
        println!("> {}\n{}\n", entry.user, entry.bot);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/exit" => break,
            "/clear" => {
                store.clear()?;
                println!("История очищена.");
                continue;
            }
            _ => {}
        }

        let request = AskRequest {
            question: line.to_string(),
            community: community.clone(),
            jobs: jobs.clone(),
            history: store.turns(),
        };
        match supervisor.ask(request).await {
            Ok(response) => {
                let text = render_reply(&response.answer);
                println!("{}\n", text);
                store.append(response.question, text, response.timestamp)?;
            }
            Err(e) => {
                let body = e.to_body();
                match body.message {
                    Some(message) => println!("{}. {}\n", body.error, message),
                    None => println!("{}\n", body.error),
                }
            }
        }
    }
    Ok(())
}

fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Text(text) => text.clone(),
        Reply::Jobs(listings) if listings.is_empty() => {
            "Подходящих вакансий сейчас нет.".to_string()
        }
        Reply::Jobs(listings) => listings
            .iter()
            .map(render_listing)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_listing(listing: &JobListing) -> String {
    let title = if listing.title.is_empty() {
        "Вакансия"
    } else {
        listing.title.as_str()
    };
    let details: Vec<&str> = [&listing.salary, &listing.location, &listing.schedule]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .collect();
    if details.is_empty() {
        format!("• {}", title)
    } else {
        format!("• {} ({})", title, details.join(", "))
    }
}
