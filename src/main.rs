use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use habitual_core::{Database, EffectSink, HabitEngine, SystemClock, TracingSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use habitual::{api, mcp, scheduler};

#[derive(Parser)]
#[command(name = "habitual")]
#[command(about = "Habit streak and completion tracking")]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and the background reconciler
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Seconds between reconciliation passes
        #[arg(long, default_value = "3600")]
        reconcile_interval_secs: u64,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Run the day-rollover jobs once and exit
    Reconcile,
    /// Request reminders for habits still open today and exit
    Remind,
}

fn open_engine(path: Option<PathBuf>) -> anyhow::Result<HabitEngine> {
    let db = match path {
        Some(path) => Database::open(&path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(HabitEngine::new(db, Arc::new(SystemClock)))
}

async fn serve(engine: HabitEngine, port: u16, reconcile_interval: Duration) -> anyhow::Result<()> {
    tracing::info!("Starting Habitual server on port {}", port);

    let sink: Arc<dyn EffectSink> = Arc::new(TracingSink);
    let (shutdown_tx, reconciler) =
        scheduler::spawn_reconciler(engine.clone(), Arc::clone(&sink), reconcile_interval);

    let app = api::create_router(api::AppState::new(engine, sink));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Habitual server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    drop(shutdown_tx);
    reconciler.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "habitual=debug,habitual_core=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let engine = open_engine(cli.db)?;

    match cli.command {
        Some(Commands::Serve {
            port,
            reconcile_interval_secs,
        }) => {
            serve(engine, port, Duration::from_secs(reconcile_interval_secs)).await?;
        }
        Some(Commands::Mcp) => {
            mcp::run_stdio_server(engine, Arc::new(TracingSink)).await?;
        }
        Some(Commands::Reconcile) => {
            let summary = scheduler::run_pass(&engine, &TracingSink)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Some(Commands::Remind) => {
            let sent = engine.send_due_reminders()?.dispatch(&TracingSink);
            println!("Requested {} reminders", sent);
        }
        None => {
            serve(engine, 3000, Duration::from_secs(3600)).await?;
        }
    }

    Ok(())
}
