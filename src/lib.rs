pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod state;
pub mod store;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::auth::credentials;
use crate::models::{Identity, IdentityKind, Module};
pub use config::Config;

#[derive(Parser)]
#[command(name = "painel")]
#[command(author, version, about = "Department BI report portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the portal server
    Serve,

    /// Create the initial admin identity if it does not exist
    SeedAdmin {
        /// Email for the admin account
        email: String,

        /// Password for the admin (omitted: a strong one is generated and printed)
        #[arg(long)]
        password: Option<String>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config);

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::SeedAdmin { email, password } => seed_admin(config, &email, password).await,
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // The secret is the trust root for every token; refusing to start
    // without it beats silently issuing forgeable sessions.
    let signing_secret = config::load_signing_secret()?;

    let port = config.server.port;
    let state = api::create_app_state_from_config(config, &signing_secret).await?;
    let app = api::router(state).await;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Portal listening on :{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}

async fn seed_admin(config: Config, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let store = store::Store::open(config.general.data_path.as_str()).await?;

    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        anyhow::bail!("Invalid admin email: {email}");
    }

    if store.find_user_by_email(&email).await.is_some() {
        println!("Admin already exists: {email}");
        return Ok(());
    }

    let (plain, generated) = match password {
        Some(p) => (p, false),
        None => (credentials::generate_temp_password(), true),
    };

    let password_hash = credentials::hash_password(plain.clone(), config.security.clone()).await?;

    let admin = Identity {
        id: uuid::Uuid::new_v4().to_string(),
        name: "Admin".to_string(),
        email: email.clone(),
        kind: IdentityKind::Pj,
        cpf: String::new(),
        active: true,
        admin: true,
        modules: Module::ALL.into_iter().collect(),
        department_ids: vec![],
        password_hash,
        reset_code_hash: None,
        reset_code_expires_at: None,
    };

    store.insert_user(admin).await?;

    if generated {
        println!("Admin created: {email}");
        println!("Generated password: {plain}");
        println!("Ask the admin to change it after first login.");
    } else {
        println!("Admin created: {email}");
    }

    Ok(())
}
