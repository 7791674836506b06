use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_atlas::config::{Config, SourceConfig};
use feature_atlas::explorer::{Explorer, PrefsUpdate};
use feature_atlas::models::{ChartView, GraphMode};
use feature_atlas::search::SearchMode;
use feature_atlas::{api, tree::render::render_tree};

#[derive(Parser)]
#[command(name = "fatlas")]
#[command(about = "Explore feature models extracted from a codebase")]
struct Cli {
    /// Read feature documents from this directory
    #[arg(long, global = true, conflicts_with = "url")]
    dir: Option<PathBuf>,

    /// Read feature documents from a host bridge at this URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve every projection over HTTP
    Serve {
        /// Port for HTTP API (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the feature tree
    Tree {
        /// Print the tree view model as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the treemap view model
    Treemap,
    /// Print the tangling graph
    Tangling {
        /// Use the force layout instead of the circular one
        #[arg(long)]
        normal: bool,
    },
    /// Search feature names and identifiers
    Search {
        query: String,
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        case_sensitive: bool,
        /// Do not match identifiers
        #[arg(long)]
        hide_ids: bool,
        /// View whose index space the matches are reported in
        #[arg(long, default_value = "tree", value_parser = parse_view)]
        view: ChartView,
    },
    /// Print the detail panel of a feature
    Show { id: String },
    /// Print the scattering graph of a feature
    Scattering { id: String },
    /// Print the feature timeline, optionally restricted to some features
    Timeline {
        #[arg(long = "select", value_name = "NAME")]
        select: Vec<String>,
    },
    /// Print the deleted features
    Deleted,
}

fn parse_view(s: &str) -> Result<ChartView, String> {
    ChartView::from_str(s).ok_or_else(|| format!("unknown view: {}", s))
}

/// Initialize tracing with output to stderr (when stdout carries JSON) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "feature_atlas=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve(explorer: Arc<Explorer>, config: &Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting feature-atlas server on port {}", port);

    // Serve anyway; views answer 503 until a refresh succeeds.
    if let Err(e) = explorer.refresh().await {
        tracing::warn!("Initial fetch failed: {}", e);
    }
    if let Some(minutes) = config.auto_fetch_minutes {
        tracing::info!("Refreshing every {} minutes", minutes);
        explorer
            .clone()
            .spawn_auto_fetch(Duration::from_secs(minutes * 60));
    }

    let app = api::create_router(explorer);
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("feature-atlas listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve { port: None });

    // Projection commands print JSON, so logs go to stderr
    let use_stderr = !matches!(command, Commands::Serve { .. });
    init_tracing(use_stderr);

    let mut config = Config::load();
    if let Some(dir) = cli.dir {
        config.source = SourceConfig::Dir(dir);
    }
    if let Some(url) = cli.url {
        config.source = SourceConfig::Url(url);
    }

    let explorer = Arc::new(Explorer::new(
        config.source.build(),
        config.validation,
        config.display_prefs(),
    ));

    if !matches!(command, Commands::Serve { .. }) {
        explorer.refresh().await?;
    }

    match command {
        Commands::Serve { port } => serve(explorer, &config, port.unwrap_or(config.port)).await?,
        Commands::Tree { json: false } => {
            let epoch = explorer.epoch()?;
            print!("{}", render_tree(epoch.tree.features()));
        }
        Commands::Tree { json: true } => print_json(&explorer.activate(ChartView::Tree).await?)?,
        Commands::Treemap => print_json(&explorer.activate(ChartView::Treemap).await?)?,
        Commands::Tangling { normal } => {
            if normal {
                explorer.update_prefs(PrefsUpdate {
                    tangling_mode: Some(GraphMode::Normal),
                    ..PrefsUpdate::default()
                })?;
            }
            print_json(&explorer.activate(ChartView::TanglingGraph).await?)?;
        }
        Commands::Search {
            query,
            regex,
            exact,
            case_sensitive,
            hide_ids,
            view,
        } => {
            if hide_ids {
                explorer.update_prefs(PrefsUpdate {
                    show_identifiers: Some(false),
                    ..PrefsUpdate::default()
                })?;
            }
            explorer.activate(view).await?;
            let mode = SearchMode {
                use_regex: regex,
                exact_match: exact,
                case_sensitive,
            };
            let matches = explorer.search(&query, mode)?;
            print_json(&serde_json::json!({
                "view": view,
                "highlight": matches.indices_for(view),
                "matches": matches,
            }))?;
        }
        Commands::Show { id } => print_json(&explorer.feature_detail(&id)?)?,
        Commands::Scattering { id } => print_json(&explorer.scattering(&id)?)?,
        Commands::Timeline { select } => {
            let view = explorer.activate(ChartView::Timeline).await?;
            if select.is_empty() {
                print_json(&view)?;
            } else {
                print_json(&explorer.filter_timeline(&select)?)?;
            }
        }
        Commands::Deleted => print_json(&explorer.activate(ChartView::DeletedFeatures).await?)?,
    }

    Ok(())
}
