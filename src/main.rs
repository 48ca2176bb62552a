use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod controller;
mod loader;
mod render;
mod schema;
mod topology;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "streaming-dashboard")]
#[command(about = "Streaming topology dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the topology and write the streaming page as HTML.
    Report {
        #[command(flatten)]
        source: config::SourceArgs,

        #[arg(short = 'o', long)]
        out: String,

        /// Reload this many times while the load keeps failing.
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// Load the topology and print a summary plus data-quality warnings.
    Check {
        #[command(flatten)]
        source: config::SourceArgs,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level, e.g. RUST_LOG=streaming_dashboard=debug
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Report {
            source,
            out,
            retries,
        } => {
            let page = controller::PageController::new(source.build());
            page.mount().await.context("topology load task")?;

            let mut attempt = 0;
            while attempt < retries && page.state().phase == controller::Phase::Error {
                attempt += 1;
                tracing::info!(attempt, retries, "reloading topology");
                page.reload().await.context("topology reload task")?;
            }

            let view = page.view();
            if let Some(message) = &view.error {
                tracing::error!(%message, "rendering page with error banner");
            }
            let html = render::render_page(&view)?;
            page.unmount();

            std::fs::write(&out, html).with_context(|| format!("write {}", out))?;
            println!("Wrote {}", out);
        }
        Commands::Check { source } => {
            let source = source.build();
            let snapshot = loader::load_snapshot(source.as_ref())
                .await
                .with_context(|| format!("load topology from {}", source.describe()))?;

            let s = snapshot.summary();
            println!(
                "{} nodes, {} actors, {} edges, {} fragments, {} materialized views",
                s.nodes, s.actors, s.edges, s.fragments, s.materialized_views
            );
            for group in snapshot.actor_groups() {
                println!("node {}: {} actors", group.node, group.actors.len());
            }
            for fragment in snapshot.fragments() {
                let kind = if fragment.kind.is_empty() {
                    "-"
                } else {
                    fragment.kind.as_str()
                };
                println!(
                    "fragment {} ({}): actors {:?}",
                    fragment.id, kind, fragment.actor_ids
                );
            }
            for mv in snapshot.materialized_views() {
                println!(
                    "materialized view {} ({}): fragments {:?}",
                    mv.name, mv.id, mv.fragment_ids
                );
            }
            for warning in snapshot.warnings() {
                println!("warning: {}", warning);
            }
            if !snapshot.is_renderable() {
                println!("nothing to render: first node has no actors");
            }
        }
    }

    Ok(())
}
