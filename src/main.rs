use std::collections::HashMap;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ragserve::{
    ChatRepository, ChatSession, Connector, ConnectorRepository, Container, ContainerConfig,
    ResponseEvent, Source, TriggerRequest,
};

#[derive(Parser)]
#[command(name = "ragserve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    mock_embeddings: bool,

    #[arg(long, global = true)]
    embedding_url: Option<String>,

    #[arg(long, global = true)]
    llm_url: Option<String>,

    #[arg(long, global = true, default_value = "gpt-4o-mini")]
    llm_model: String,

    #[arg(long, global = true)]
    no_llm: bool,

    #[arg(long, global = true)]
    static_chunking: bool,

    #[arg(long, global = true, default_value = "default")]
    collection: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and executor loops until interrupted.
    Serve {
        /// Seed a web connector for this URL before starting.
        #[arg(long)]
        url: Option<String>,

        /// Refresh frequency for the seeded connector, in seconds.
        #[arg(long, default_value = "600")]
        refresh: u64,

        /// Scheduler reload interval, in seconds.
        #[arg(long, default_value = "30")]
        reload_interval: u64,
    },

    /// Ask one question, optionally ingesting a URL first.
    Chat {
        message: String,

        /// Ingest this URL before answering.
        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value = "5")]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve {
            url,
            refresh,
            reload_interval,
        } => {
            let container = Container::new(ContainerConfig {
                mock_embeddings: cli.mock_embeddings,
                embedding_url: cli.embedding_url,
                llm_url: cli.llm_url,
                llm_model: cli.llm_model,
                no_llm: cli.no_llm,
                static_chunking: cli.static_chunking,
                reload_interval_secs: reload_interval,
                collection: cli.collection,
                ..ContainerConfig::default()
            });

            if let Some(url) = url {
                seed_web_connector(&container, &url, refresh).await?;
                println!("Seeded web connector for {}", url);
            }

            let loops = container.spawn_loops();
            info!("Serving; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            container.shutdown(loops).await;
        }

        Commands::Chat { message, url, top_k } => {
            let container = Container::new(ContainerConfig {
                mock_embeddings: cli.mock_embeddings,
                embedding_url: cli.embedding_url,
                llm_url: cli.llm_url,
                llm_model: cli.llm_model,
                no_llm: cli.no_llm,
                static_chunking: cli.static_chunking,
                collection: cli.collection,
                top_k,
                ..ContainerConfig::default()
            });

            if let Some(url) = url {
                seed_web_connector(&container, &url, 600).await?;
                container
                    .executor()
                    .execute_trigger(&TriggerRequest::new(1))
                    .await?;
                println!("Ingested {}", url);
            }

            let session = ChatSession::new("cli".to_string());
            container.chat_repo().save_session(&session).await?;

            let responder = container.responder();
            let (_placeholder, mut events) = responder.execute(session.id(), &message).await?;

            while let Some(event) = events.recv().await {
                match event {
                    ResponseEvent::Document(doc) => {
                        let excerpt: String = doc.content.chars().take(120).collect();
                        println!(
                            "[doc {}#{} score {:.3}] {}",
                            doc.document_id, doc.chunk_index, doc.score, excerpt
                        );
                    }
                    ResponseEvent::Message(msg) => {
                        println!("\n{}", msg.content());
                    }
                    ResponseEvent::Error(msg) => {
                        println!("\nGeneration failed: {}", msg.error().unwrap_or("unknown"));
                    }
                }
            }
        }
    }

    Ok(())
}

async fn seed_web_connector(container: &Container, url: &str, refresh: u64) -> Result<()> {
    let config = HashMap::from([("url".to_string(), json!(url))]);
    let connector = Connector::new(
        1,
        "cli-web".to_string(),
        Source::Web,
        config,
        refresh,
        "cli".to_string(),
    )?;
    container.connector_repo().save(&connector).await?;
    Ok(())
}
