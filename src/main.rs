use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use d8tl::{api, auth, config, logging, notifier, ops};
use d8tl_core::Database;

#[derive(Parser)]
#[command(name = "d8tl")]
#[command(about = "League operations server for the District 8 Travel League")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct DataDirArg {
    /// Data directory override (defaults to ./data, then the platform data dir)
    #[arg(long, env = "D8TL_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the league server
    Serve {
        /// Port for the HTTP API
        #[arg(short, long, default_value = "8080", env = "D8TL_PORT")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1", env = "D8TL_BIND")]
        bind: String,

        #[command(flatten)]
        data: DataDirArg,

        /// Turn the coach portal endpoints off
        #[arg(long, env = "D8TL_DISABLE_COACH_PORTAL")]
        disable_coach_portal: bool,

        /// Assemble notifications but do not hand them off
        #[arg(long, env = "D8TL_DISABLE_NOTIFICATIONS")]
        disable_notifications: bool,
    },
    /// Check the deployment; exit 0 on success, 1 on failures, 2 on warnings
    HealthCheck {
        #[command(flatten)]
        data: DataDirArg,
    },
    /// Scan for leftover development secrets; exit 0/1/2 as health-check
    SecurityCheck {
        #[command(flatten)]
        data: DataDirArg,
    },
    /// Write a consistent snapshot of the database
    Backup {
        /// Snapshot file to create
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        data: DataDirArg,
    },
    /// Replace the database with a snapshot (stop the server first)
    Restore {
        /// Snapshot file to restore from
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        data: DataDirArg,
    },
    /// Print an Argon2 hash for seeding the portal password settings
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            port,
            bind,
            data,
            disable_coach_portal,
            disable_notifications,
        }) => {
            serve(
                port,
                bind,
                data.data_dir,
                disable_coach_portal,
                disable_notifications,
            )
            .await
        }
        Some(Commands::HealthCheck { data }) => {
            logging::init_minimal();
            let (paths, _) = config::resolve_paths(data.data_dir.as_deref())?;
            let results = ops::health::run(&paths);
            ops::print_results(&results);
            std::process::exit(ops::exit_code(&results));
        }
        Some(Commands::SecurityCheck { data }) => {
            logging::init_minimal();
            let (paths, layout) = config::resolve_paths(data.data_dir.as_deref())?;
            let results = ops::security::run(&paths, layout);
            ops::print_results(&results);
            std::process::exit(ops::exit_code(&results));
        }
        Some(Commands::Backup { output, data }) => {
            logging::init_minimal();
            let (paths, _) = config::resolve_paths(data.data_dir.as_deref())?;
            ops::backup::backup(&paths.db_path, &output)
        }
        Some(Commands::Restore { input, data }) => {
            logging::init_minimal();
            let (paths, _) = config::resolve_paths(data.data_dir.as_deref())?;
            ops::backup::restore(&paths.db_path, &input)
        }
        Some(Commands::HashPassword { password }) => {
            println!("{}", auth::hash_password(&password)?);
            Ok(())
        }
        None => {
            // Default: start the server with defaults.
            serve(8080, "127.0.0.1".into(), None, false, false).await
        }
    }
}

async fn serve(
    port: u16,
    bind: String,
    data_dir: Option<PathBuf>,
    disable_coach_portal: bool,
    disable_notifications: bool,
) -> anyhow::Result<()> {
    let (paths, layout) = config::resolve_paths(data_dir.as_deref())?;

    let db = Database::open(&paths.db_path)?;
    db.migrate()?;

    let level = db.setting_or("log_level", "info")?;
    let log_ctl = logging::init(&paths.log_dir, &level)?;

    let config = Arc::new(config::Config {
        app_name: config::APP_NAME,
        version: config::VERSION,
        bind,
        port,
        paths,
        layout,
        coach_portal_enabled: !disable_coach_portal,
        notifications_enabled: !disable_notifications,
    });
    tracing::info!(
        version = config.version,
        layout = ?config.layout,
        data_dir = %config.paths.data_dir.display(),
        "starting District 8 Travel League server"
    );

    let bind_addr = config.bind_addr();
    let state = api::AppState {
        db,
        config,
        notifier: Arc::new(notifier::TracingNotifier),
        log_ctl,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("D8TL server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
