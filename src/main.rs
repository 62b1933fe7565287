//! # Memoria CLI
//!
//! Command-line interface for the memorial page editor.
//!
//! ## Usage
//!
//! ```bash
//! # Run the editor server with pages kept in memory
//! memoria serve
//!
//! # Run against a REST backend
//! memoria serve --backend-url https://xyz.supabase.co --api-key ...
//!
//! # Rasterize a saved canvas snapshot
//! memoria render scene.json -o scene.png
//!
//! # Validate and normalize a block export
//! memoria check blocks.json
//!
//! # List built-in templates
//! memoria templates
//! ```

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memoria::{
    MemoriaError,
    blocks::{IdGenerator, editor::parse_blocks, html, templates},
    canvas::{AssetResolver, Scene, render},
    config::{BackendConfig, ServerConfig},
    server,
};

/// Memoria - Memorial page editor
#[derive(Parser, Debug)]
#[command(name = "memoria")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// REST backend base URL (pages are kept in memory when omitted)
        #[arg(long, env = "MEMORIA_BACKEND_URL")]
        backend_url: Option<String>,

        /// REST backend API key
        #[arg(long, env = "MEMORIA_API_KEY", default_value = "")]
        api_key: String,

        /// Backend table holding pages
        #[arg(long, env = "MEMORIA_TABLE", default_value = "memorial_pages")]
        table: String,

        /// Disable auto-save in the editor shell
        #[arg(long)]
        no_autosave: bool,
    },

    /// Render a canvas snapshot to PNG
    Render {
        /// Scene snapshot (JSON)
        scene: PathBuf,

        /// Output PNG file
        #[arg(short, long, value_name = "FILE", default_value = "scene.png")]
        output: PathBuf,
    },

    /// Validate a block export and print it normalized
    Check {
        /// Block array (JSON)
        blocks: PathBuf,

        /// Print the blocks as HTML instead of JSON
        #[arg(long)]
        html: bool,
    },

    /// List built-in templates
    Templates,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memoria=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), MemoriaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            backend_url,
            api_key,
            table,
            no_autosave,
        } => {
            let mut config = ServerConfig::new(listen);
            config.backend = backend_url.map(|url| BackendConfig {
                url,
                api_key,
                table,
            });
            config.editor.autosave = !no_autosave;
            server::serve(config).await?;
        }

        Commands::Render { scene, output } => {
            let text = std::fs::read_to_string(&scene)?;
            let scene = Scene::from_snapshot(&text)?;

            println!(
                "Rendering {} objects ({}x{})...",
                scene.objects.len(),
                scene.width,
                scene.height
            );

            let resolver = AssetResolver::new(Arc::new(RwLock::new(HashMap::new())))?;
            let images = resolver.resolve(&scene).await;
            let png_bytes = render::render_png(&scene, &images)?;
            std::fs::write(&output, png_bytes)?;

            println!("Saved to {}", output.display());
        }

        Commands::Check { blocks, html: as_html } => {
            let text = std::fs::read_to_string(&blocks)?;
            let mut ids = IdGenerator::new();
            let blocks = parse_blocks(&text, || ids.next_id())?;

            if as_html {
                println!("{}", html::render_blocks(&blocks));
            } else {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            }
            eprintln!("{} valid blocks", blocks.len());
        }

        Commands::Templates => {
            println!("Available templates:");
            for template in templates::all() {
                println!(
                    "  {:<12} {} ({} blocks)",
                    template.name,
                    template.description,
                    template.blocks.len()
                );
            }
        }
    }

    Ok(())
}
