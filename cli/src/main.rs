mod storage;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use milsabores::config::ApiConfig;
use milsabores::error::{ApiError, ConfigError, ValidationError};
use milsabores::net::auth::AuthService;
use milsabores::net::client::{ApiClient, Navigate};
use milsabores::net::products::ProductService;
use milsabores::net::transport::TransportError;
use milsabores::net::types::{Credentials, ProductDraft, RegistrationForm};
use milsabores::session::controller::{SessionController, SessionStatus};
use milsabores::session::store::SessionStore;
use milsabores::validation::{validate_credentials, validate_registration};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::storage::FileStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
    #[error("not signed in; run `milsabores login` first")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "milsabores", about = "Pastelería Mil Sabores storefront API CLI")]
struct Cli {
    /// API base URL including the `/api` prefix.
    #[arg(long, env = "MILSABORES_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "MILSABORES_SESSION_FILE", default_value = ".milsabores-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MILSABORES_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    /// Validate the stored session against the backend and print the user.
    Whoami,
    Logout,
    /// List registered users (ADMIN only).
    Users,
    Products(ProductsCommand),
    /// Check that the backend answers.
    Ping,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "MILSABORES_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, env = "MILSABORES_CONFIRM_PASSWORD", hide_env_values = true)]
    confirm_password: String,
    #[arg(long)]
    nombre: String,
    #[arg(long)]
    apellido: Option<String>,
    #[arg(long)]
    telefono: Option<String>,
}

#[derive(Args, Debug)]
struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProductsSubcommand {
    List,
    Get { id: String },
    Category { name: String },
    Search { name: String },
    /// Products with stock available.
    Stock,
    /// Create a product from a JSON draft (ADMIN only).
    Create {
        #[arg(long)]
        data: String,
    },
    /// Replace a product from a JSON draft (ADMIN only).
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Delete a product (ADMIN only).
    Delete { id: String },
}

struct CliContext {
    session: SessionController,
    products: ProductService,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = build_context(&cli)?;

    match cli.command {
        Command::Login { email, password } => run_login(&ctx, Credentials { email, password }).await,
        Command::Register(args) => run_register(&ctx, args).await,
        Command::Whoami => run_whoami(&ctx).await,
        Command::Logout => {
            ctx.session.logout();
            eprintln!("signed out");
            Ok(())
        }
        Command::Users => {
            require_session(&ctx)?;
            let users = ctx.session.auth().list_users().await?;
            print_json(&serde_json::to_value(users)?)
        }
        Command::Products(products) => run_products(&ctx, products).await,
        Command::Ping => run_ping(&ctx).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn build_context(cli: &Cli) -> Result<CliContext, CliError> {
    let mut config = ApiConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url);
    }

    let store = SessionStore::new(Arc::new(FileStorage::new(&cli.session_file)));
    let navigate: Navigate = Arc::new(|path: &str| {
        tracing::warn!(path, "session cleared; sign in again");
    });
    let client = ApiClient::native(config, store, navigate)?;

    Ok(CliContext {
        session: SessionController::new(AuthService::new(client.clone())),
        products: ProductService::new(client),
    })
}

fn require_session(ctx: &CliContext) -> Result<(), CliError> {
    if ctx.session.store().has_token() { Ok(()) } else { Err(CliError::NotSignedIn) }
}

async fn run_login(ctx: &CliContext, credentials: Credentials) -> Result<(), CliError> {
    validate_credentials(&credentials)?;
    let response = ctx
        .session
        .login(credentials.email.trim(), &credentials.password)
        .await
        .map_err(CliError::Auth)?;
    print_json(&serde_json::to_value(response.user)?)
}

async fn run_register(ctx: &CliContext, args: RegisterArgs) -> Result<(), CliError> {
    let form = registration_form(args)?;
    let response = ctx.session.register(form).await.map_err(CliError::Auth)?;
    print_json(&serde_json::to_value(response.user)?)
}

fn registration_form(args: RegisterArgs) -> Result<RegistrationForm, CliError> {
    let form = RegistrationForm {
        email: args.email,
        password: args.password,
        nombre: args.nombre,
        apellido: args.apellido,
        telefono: args.telefono,
    };
    validate_registration(&form, &args.confirm_password)?;
    Ok(form)
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    ctx.session.restore().await;
    match ctx.session.state().status {
        SessionStatus::Authenticated(user) => print_json(&serde_json::to_value(user)?),
        SessionStatus::Anonymous | SessionStatus::Unknown => Err(CliError::NotSignedIn),
    }
}

async fn run_products(ctx: &CliContext, products: ProductsCommand) -> Result<(), CliError> {
    let service = &ctx.products;
    let json = match products.command {
        ProductsSubcommand::List => serde_json::to_value(service.list().await?)?,
        ProductsSubcommand::Get { id } => serde_json::to_value(service.get(&id).await?)?,
        ProductsSubcommand::Category { name } => serde_json::to_value(service.by_category(&name).await?)?,
        ProductsSubcommand::Search { name } => serde_json::to_value(service.search(&name).await?)?,
        ProductsSubcommand::Stock => serde_json::to_value(service.in_stock().await?)?,
        ProductsSubcommand::Create { data } => {
            require_session(ctx)?;
            serde_json::to_value(service.create(&parse_draft(&data)?).await?)?
        }
        ProductsSubcommand::Update { id, data } => {
            require_session(ctx)?;
            serde_json::to_value(service.update(&id, &parse_draft(&data)?).await?)?
        }
        ProductsSubcommand::Delete { id } => {
            require_session(ctx)?;
            service.delete(&id).await?;
            serde_json::json!({ "deleted": id })
        }
    };
    print_json(&json)
}

async fn run_ping(ctx: &CliContext) -> Result<(), CliError> {
    ctx.session.auth().test_connection().await?;
    println!("ok");
    Ok(())
}

fn parse_draft(data: &str) -> Result<ProductDraft, CliError> {
    Ok(serde_json::from_str(data)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
