use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use classroom_auth::bootstrap::{self, ROLE_ROUTES};
use classroom_auth::config::{AuthConfig, ConfigError, DEFAULT_STORE_PATH};
use classroom_auth::push::{PermissionStatus, PushOutcome, StaticPermissions};
use classroom_auth::store::{FileStore, KeyValueStore, MemorySessionStore, PUSH_TOKEN_KEY};
use classroom_auth::types::StoreError;
use classroom_auth::{AuthBootstrapper, AuthContext, Credentials, Role, SubmitError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("http client build failed: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("{0}")]
    Submit(#[from] SubmitError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("unknown role {0:?}; expected one of: teacher, parent")]
    UnknownRole(String),
}

#[derive(Parser, Debug)]
#[command(name = "classroom-auth", about = "Classroom login and push-registration client")]
struct Cli {
    /// School API origin; overrides `CLASSROOM_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Key-value file for the push token; overrides `CLASSROOM_STORE_PATH`.
    #[arg(long, global = true)]
    store: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and, for parents, register this device for push notifications.
    Login {
        #[arg(long)]
        role: String,
        #[arg(long, env = "CLASSROOM_EMAIL")]
        email: String,
        #[arg(long, env = "CLASSROOM_PASSWORD", hide_env_values = true)]
        password: String,
        /// Notification permission before prompting.
        #[arg(long, value_enum, default_value_t = PermissionArg::Undetermined)]
        permission: PermissionArg,
    },
    /// Print the stored push token.
    PushToken,
    /// Print login endpoint and destinations for a role, or all roles.
    Routes {
        #[arg(long)]
        role: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PermissionArg {
    Granted,
    Denied,
    Undetermined,
}

impl From<PermissionArg> for PermissionStatus {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Granted => Self::Granted,
            PermissionArg::Denied => Self::Denied,
            PermissionArg::Undetermined => Self::Undetermined,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Login { role, email, password, permission } => {
            let config = load_config(cli.api_url, cli.store)?;
            let sessions = Arc::new(MemorySessionStore::new());
            let permissions = Arc::new(StaticPermissions::new(permission.into()));
            let boot = AuthBootstrapper::from_config(&config, sessions, permissions)?;

            let outcome = boot
                .submit(&AuthContext::new(role), &Credentials::new(email, password))
                .await?;
            let push = match &outcome.push {
                PushOutcome::Registered(registration) => json!({ "status": "registered", "token": registration.token }),
                PushOutcome::Failed(e) => json!({ "status": "failed", "error": e.to_string() }),
                other => json!({ "status": other.label() }),
            };
            print_json(&json!({
                "role": outcome.role,
                "user": outcome.session.user,
                "destination": outcome.destination,
                "push": push,
            }));
        }
        Command::PushToken => {
            let path = match cli.store {
                Some(path) => path,
                None => std::env::var("CLASSROOM_STORE_PATH")
                    .map_or_else(|_| DEFAULT_STORE_PATH.into(), Into::into),
            };
            let token = FileStore::new(path).get(PUSH_TOKEN_KEY).await?;
            print_json(&json!({ "pushToken": token }));
        }
        Command::Routes { role } => {
            let routes: Vec<_> = match role {
                Some(raw) => {
                    let role = raw.parse::<Role>().map_err(|e| CliError::UnknownRole(e.0))?;
                    vec![bootstrap::route(role)]
                }
                None => ROLE_ROUTES.to_vec(),
            };
            let rows: Vec<_> = routes
                .into_iter()
                .map(|r| {
                    json!({
                        "role": r.role,
                        "loginPath": r.login_path,
                        "home": r.home_route,
                        "register": r.register_route,
                        "registersPush": r.post_login == bootstrap::PostLoginAction::RegisterPush,
                    })
                })
                .collect();
            print_json(&json!(rows));
        }
    }
    Ok(())
}

fn load_config(api_url: Option<String>, store: Option<std::path::PathBuf>) -> Result<AuthConfig, ConfigError> {
    let mut config = AuthConfig::from_lookup(|key| match (key, &api_url) {
        ("CLASSROOM_API_URL", Some(url)) => Some(url.clone()),
        _ => std::env::var(key).ok(),
    })?;
    if let Some(path) = store {
        config.store_path = path;
    }
    Ok(config)
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!(error = %e, "output serialization failed"),
    }
}
