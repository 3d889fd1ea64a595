mod config;
mod lyrics;
mod server;
mod soundcloud;
mod storage;

use anyhow::Context;
use clap::{Parser, Subcommand};
use soundcloud::TrackSource;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "scproxy", version, about = "SoundCloud proxy with multi-provider lyrics")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Bind address, e.g. 0.0.0.0:3000.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Resolve lyrics and print LRC to stdout (headless).
    Lyrics {
        /// Track title, or "artist - title".
        title: String,
        #[arg(long)]
        artist: Option<String>,
    },
    /// Search SoundCloud tracks and print to stdout (headless).
    Search {
        query: String,
        #[arg(long, default_value_t = config::defaults::SEARCH_LIMIT)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
            let storage = storage::StorageHandle::new(cfg.database_path());
            storage.init().context("init database")?;

            let pipeline = lyrics::LyricsPipeline::from_config(&cfg.lyrics).context("build lyrics pipeline")?;
            tracing::info!(providers = ?pipeline.provider_names(), "lyrics pipeline ready");

            let state = server::AppState {
                tracks: Arc::new(soundcloud::SoundcloudClient::new(&cfg.soundcloud)?),
                lyrics: Arc::new(pipeline),
                storage,
            };
            server::serve(state, &bind).await?;
        }
        Command::Lyrics { title, artist } => {
            let query = lyrics::TrackQuery::from_parts(&title, artist.as_deref())?;
            let pipeline = lyrics::LyricsPipeline::from_config(&cfg.lyrics)?;
            let result = pipeline.resolve(&query).await?;
            eprintln!(
                "{} - {} [{}, {:?}, {}]",
                query.artist, query.title, result.source, result.sync_type, result.language
            );
            println!("{}", result.to_lrc());
        }
        Command::Search { query, limit } => {
            let client = soundcloud::SoundcloudClient::new(&cfg.soundcloud)?;
            let tracks = client.search(&query, limit).await?;
            print_tracks(&tracks);
        }
    }

    Ok(())
}

fn print_tracks(tracks: &[soundcloud::Track]) {
    for (i, t) in tracks.iter().enumerate() {
        let artist = if t.artist.is_empty() {
            String::new()
        } else {
            format!(" - {}", t.artist)
        };
        println!("{:02}. {}{}  (id={})", i + 1, t.title, artist, t.id);
    }
}
