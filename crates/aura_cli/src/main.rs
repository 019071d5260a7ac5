use anyhow::Context;
use aura_core::config::AuraConfig;
use aura_core::prompt::PromptSet;
use aura_gateway::AppState;
use aura_memory::profile::{ProfileDefaults, ProfileStore};
use aura_memory::sqlite::SqliteStore;
use aura_reasoning::providers::GeminiClient;
use aura_reasoning::session::{Session, SessionConfig, SessionContext};
use aura_reasoning::tools::{ToolRegistry, WebSearchTool};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "aura.toml")]
    config: String,

    /// Override the database path
    #[arg(long)]
    db: Option<String>,

    /// User id for this conversation
    #[arg(short, long, default_value = "local_user")]
    user: String,

    /// Override the dialogue model
    #[arg(short, long)]
    model: Option<String>,

    /// Run the HTTP gateway instead of the terminal REPL
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AuraConfig::load_or_default(&args.config);
    if let Some(db) = args.db {
        config.db_path = Some(db);
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }

    let space = config
        .emotion
        .to_space()
        .context("invalid emotion configuration")?;
    let prompts = PromptSet::build(&config.prompts).context("invalid prompt templates")?;

    info!("Connecting to store at {}...", config.db_path());
    let store = Arc::new(SqliteStore::connect(config.db_path()).await?);
    let profile = Arc::new(ProfileStore::new(
        store,
        space,
        ProfileDefaults {
            first_contact_stub: config.memory.first_contact_stub.clone(),
            sensitivity: config.limbic.default_sensitivity,
        },
    ));

    let base_url = config.llm.base_url.as_deref();
    let dialogue = Arc::new(GeminiClient::new(&config.llm.model, base_url)?);
    let scorer = Arc::new(GeminiClient::new(&config.limbic.model, base_url)?);
    let summarizer = Arc::new(GeminiClient::new(&config.memory.model, base_url)?);

    let mut tools = ToolRegistry::new();
    if config.search.enabled {
        tools.register(Box::new(WebSearchTool::new(&config.search)));
    }

    let ctx = Arc::new(SessionContext {
        dialogue,
        scorer,
        summarizer,
        profile,
        tools: Arc::new(tools),
        prompts,
        config: SessionConfig::from_config(&config),
    });

    if args.serve {
        let state = AppState::new(ctx);
        return aura_gateway::serve(
            state,
            &config.gateway.host,
            config.gateway.port,
            config.gateway.allowed_origin.as_deref(),
        )
        .await;
    }

    let persona = config.persona.name.clone();
    println!("{} is here. Type 'quit' to end the conversation.\n", persona);
    let mut session = Session::open(ctx, &args.user).await?;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            let close = session.end().await;
            println!(
                "(memory saved: {}, emotions saved: {})",
                close.memory_saved, close.emotions_saved
            );
            break;
        }

        match session.send(trimmed).await {
            Ok(chunks) if chunks.is_empty() => {
                println!("({} says nothing)", persona);
            }
            Ok(chunks) => {
                for chunk in chunks {
                    println!("{}: {}", persona, chunk);
                }
            }
            Err(e) => {
                tracing::error!("turn failed: {}", e);
                println!("[error] {}", e);
            }
        }
    }

    Ok(())
}
