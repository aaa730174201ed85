use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use todo_dashboard::client::{repl, ApiClient, Dashboard, SessionFile, View};
use todo_dashboard::config::{ClientConfig, Config};
use todo_dashboard::routes::routes;
use todo_dashboard::state::AppState;
use todo_dashboard::store::PgStore;
use todo_dashboard::token::TokenKeys;

#[derive(Parser)]
#[command(name = "todo-dashboard")]
#[command(about = "Personal todo list: API server and terminal dashboard")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Base URL of the todo API (default: $TODO_API_URL)")]
    api_url: Option<String>,

    #[arg(long, global = true, help = "Where the login session is kept (default: $TODO_SESSION_FILE)")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve,

    #[command(about = "Create an account")]
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    #[command(about = "Log in and remember the session")]
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    #[command(about = "End the remembered session")]
    Logout,

    #[command(about = "Open the interactive todo dashboard")]
    Dashboard,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let client = || -> anyhow::Result<(ApiClient, SessionFile)> {
        let defaults = ClientConfig::from_env();
        let api = ApiClient::new(cli.api_url.as_deref().unwrap_or(&defaults.api_url))?;
        let session_file = SessionFile::new(cli.session_file.clone().unwrap_or(defaults.session_file));
        Ok((api, session_file))
    };

    match &cli.command {
        Commands::Serve => serve().await?,
        Commands::Register { name, email, password } => {
            let (api, _) = client()?;
            let user = api.register(name, email, password).await?;
            println!("Registered {} <{}>. Log in with `todo-dashboard login`.", user.name, user.email);
        }
        Commands::Login { email, password } => {
            let (api, session_file) = client()?;
            let mut session = session_file.load().await?;
            session.populate(api.login(email, password).await?);
            session_file.save(&session).await?;
            if let Some(user) = session.user() {
                println!("Welcome, {}", user.name);
            }
        }
        Commands::Logout => {
            let (api, session_file) = client()?;
            let mut session = session_file.load().await?;
            if let Err(e) = api.logout(&session).await {
                tracing::warn!(error = %e, "Logout error");
            }
            session.clear();
            session_file.save(&session).await?;
            println!("Logged out.");
        }
        Commands::Dashboard => {
            let (api, session_file) = client()?;
            let session = session_file.load().await?;
            let mut dashboard = Dashboard::new(api, session);

            if dashboard.mount().await == View::RedirectToLogin {
                session_file.save(dashboard.session()).await?;
                println!("Not logged in. Run `todo-dashboard login` first.");
                return Ok(());
            }

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let exit = repl::run(&mut dashboard, stdin, tokio::io::stdout()).await?;
            tracing::debug!(?exit, "dashboard closed");
            session_file.save(dashboard.session()).await?;
        }
    }

    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl_hours);

    let state = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await.context("Error connecting DB")?;
            store.migrate().await.context("Error running migrations")?;
            AppState::new(Arc::new(store), tokens)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, todos are kept in memory and lost on exit");
            AppState::in_memory(tokens)
        }
    };

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>().context("CORS_ORIGIN is not a valid origin")?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let app = routes(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;

    tracing::info!(addr = %config.addr(), "server is listening");

    axum::serve(listener, app).await?;
    Ok(())
}
