use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use classgate_core::AppError;
use tracing_subscriber::EnvFilter;


const MIN_BOOTSTRAP_TOKEN_LENGTH: usize = 16;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    ImportTree(PathBuf),
}

impl ApiCommand {
    /// Parses the command from process arguments, program name excluded.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self, AppError> {
        match args.next().as_deref() {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("import-tree") => args
                .next()
                .filter(|path| !path.trim().is_empty())
                .map(|path| Self::ImportTree(PathBuf::from(path)))
                .ok_or_else(|| {
                    AppError::Validation("usage: classgate-api import-tree <path.json>".to_owned())
                }),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected serve, migrate or import-tree"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub bootstrap_token: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub tree_cache_ttl: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::from_args(env::args().skip(1))?;

        let database_url = required_env("DATABASE_URL")?;
        let database_max_connections = parse_number_env(
            "DATABASE_MAX_CONNECTIONS",
            env::var("DATABASE_MAX_CONNECTIONS").ok(),
            10_u32,
        )?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let bootstrap_token = env::var("AUTH_BOOTSTRAP_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        if bootstrap_token
            .as_ref()
            .is_some_and(|token| token.len() < MIN_BOOTSTRAP_TOKEN_LENGTH)
        {
            return Err(AppError::Validation(format!(
                "AUTH_BOOTSTRAP_TOKEN must be at least {MIN_BOOTSTRAP_TOKEN_LENGTH} characters"
            )));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_number_env("API_PORT", env::var("API_PORT").ok(), 3001_u16)?;
        let cookie_secure = parse_flag(env::var("SESSION_COOKIE_SECURE").ok().as_deref());
        let tree_cache_ttl_seconds = parse_number_env(
            "CLASSIFICATION_TREE_CACHE_TTL_SECONDS",
            env::var("CLASSIFICATION_TREE_CACHE_TTL_SECONDS").ok(),
            300_u64,
        )?;

        Ok(Self {
            command,
            database_url,
            database_max_connections,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            tree_cache_ttl: Duration::from_secs(tree_cache_ttl_seconds),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value =
        env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn parse_number_env<T: FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{raw}': {error}"))),
    }
}
