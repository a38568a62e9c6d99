//! Service configuration.
//!
//! # Purpose
//! Load listener addresses, the storage backend and the token issuer settings
//! from environment variables, optionally overridden by a YAML file named by
//! `RENTALS_CONFIG`.
//!
//! # Key invariants
//! - The token issuer and audience are required; startup fails without them.
//! - Only asymmetric signing algorithms may be configured.
//! - When `RENTALS_STORAGE` is unset, Postgres is chosen iff `DATABASE_URL` is set.
use crate::auth::validator::is_asymmetric;
use anyhow::{Context, Result, bail};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_PG_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_JWKS_TTL_SECS: u64 = 3_600;
const DEFAULT_JWKS_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_JWKS_MIN_REFRESH_SECS: u64 = 10;
const DEFAULT_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct RentalsConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

/// Token issuer settings consumed by [`crate::auth::validator::TokenValidator`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Expected `iss`, e.g. `https://tenant.auth0.com/`.
    pub issuer: String,
    /// Expected `aud`.
    pub audience: String,
    pub jwks_url: String,
    pub algorithms: Vec<Algorithm>,
    pub jwks_ttl_secs: u64,
    pub jwks_timeout_ms: u64,
    pub jwks_min_refresh_secs: u64,
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Derive issuer and key-set URL from an Auth0-style domain.
    ///
    /// ```rust
    /// use rentals::config::AuthConfig;
    ///
    /// let auth = AuthConfig::from_domain("tenant.eu.auth0.com", "rentals");
    /// assert_eq!(auth.issuer, "https://tenant.eu.auth0.com/");
    /// assert_eq!(auth.jwks_url, "https://tenant.eu.auth0.com/.well-known/jwks.json");
    /// ```
    pub fn from_domain(domain: &str, audience: &str) -> Self {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        Self::from_issuer(&format!("https://{domain}/"), audience)
    }

    fn from_issuer(issuer: &str, audience: &str) -> Self {
        Self {
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            jwks_url: format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/')),
            algorithms: vec![Algorithm::RS256],
            jwks_ttl_secs: DEFAULT_JWKS_TTL_SECS,
            jwks_timeout_ms: DEFAULT_JWKS_TIMEOUT_MS,
            jwks_min_refresh_secs: DEFAULT_JWKS_MIN_REFRESH_SECS,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }
}

/// Optional YAML overrides. Every field takes precedence over its environment variable.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RentalsConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    database_url: Option<String>,
    pg_max_connections: Option<u32>,
    #[serde(default)]
    auth: AuthConfigOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthConfigOverride {
    domain: Option<String>,
    audience: Option<String>,
    issuer: Option<String>,
    jwks_url: Option<String>,
    algorithms: Option<Vec<String>>,
    jwks_ttl_secs: Option<u64>,
    jwks_timeout_ms: Option<u64>,
    jwks_min_refresh_secs: Option<u64>,
    leeway_secs: Option<u64>,
}

impl RentalsConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(RentalsConfigOverride::default())
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let Some(path) = env_var("RENTALS_CONFIG") else {
            return Self::from_env();
        };
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read RENTALS_CONFIG: {path}"))?;
        let override_cfg: RentalsConfigOverride =
            serde_yaml::from_str(&contents).with_context(|| "parse rentals config yaml")?;
        Self::load(override_cfg)
    }

    fn load(over: RentalsConfigOverride) -> Result<Self> {
        let bind_addr: SocketAddr = over
            .bind_addr
            .or_else(|| env_var("RENTALS_BIND"))
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse RENTALS_BIND")?;
        let metrics_bind: SocketAddr = over
            .metrics_bind
            .or_else(|| env_var("RENTALS_METRICS_BIND"))
            .unwrap_or_else(|| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse RENTALS_METRICS_BIND")?;

        let database_url = over.database_url.or_else(|| env_var("DATABASE_URL"));
        let storage: StorageBackend = match over.storage.or_else(|| env_var("RENTALS_STORAGE")) {
            Some(value) => value.parse().with_context(|| "parse RENTALS_STORAGE")?,
            None if database_url.is_some() => StorageBackend::Postgres,
            None => StorageBackend::Memory,
        };
        let postgres = match database_url {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: match over.pg_max_connections {
                    Some(value) => value,
                    None => env_parse("RENTALS_PG_MAX_CONNECTIONS", DEFAULT_PG_MAX_CONNECTIONS)?,
                },
                connect_timeout_ms: env_parse(
                    "RENTALS_PG_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "RENTALS_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_TIMEOUT_MS,
                )?,
            }),
            None => None,
        };

        let auth = load_auth(over.auth)?;
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            auth,
        })
    }
}

fn load_auth(over: AuthConfigOverride) -> Result<AuthConfig> {
    let audience = over
        .audience
        .or_else(|| env_var("API_AUDIENCE"))
        .context("API_AUDIENCE must be set")?;
    let domain = over.domain.or_else(|| env_var("AUTH0_DOMAIN"));
    let issuer = over.issuer.or_else(|| env_var("RENTALS_AUTH_ISSUER"));
    let mut auth = match (issuer, domain) {
        (Some(issuer), _) => AuthConfig::from_issuer(&issuer, &audience),
        (None, Some(domain)) => AuthConfig::from_domain(&domain, &audience),
        (None, None) => bail!("AUTH0_DOMAIN or RENTALS_AUTH_ISSUER must be set"),
    };
    if let Some(url) = over.jwks_url.or_else(|| env_var("RENTALS_AUTH_JWKS_URL")) {
        auth.jwks_url = url;
    }

    let algorithms = match over.algorithms {
        Some(list) => list,
        None => env_var("RENTALS_AUTH_ALGORITHMS")
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_else(|| vec!["RS256".to_string()]),
    };
    auth.algorithms = parse_algorithms(&algorithms)?;

    auth.jwks_ttl_secs = or_env(
        over.jwks_ttl_secs,
        "RENTALS_JWKS_TTL_SECS",
        DEFAULT_JWKS_TTL_SECS,
    )?;
    auth.jwks_timeout_ms = or_env(
        over.jwks_timeout_ms,
        "RENTALS_JWKS_TIMEOUT_MS",
        DEFAULT_JWKS_TIMEOUT_MS,
    )?;
    auth.jwks_min_refresh_secs = or_env(
        over.jwks_min_refresh_secs,
        "RENTALS_JWKS_MIN_REFRESH_SECS",
        DEFAULT_JWKS_MIN_REFRESH_SECS,
    )?;
    auth.leeway_secs = or_env(over.leeway_secs, "RENTALS_AUTH_LEEWAY_SECS", DEFAULT_LEEWAY_SECS)?;
    Ok(auth)
}

fn parse_algorithms(names: &[String]) -> Result<Vec<Algorithm>> {
    let mut algorithms = Vec::new();
    for name in names.iter().map(|name| name.trim()).filter(|name| !name.is_empty()) {
        let alg = Algorithm::from_str(name)
            .map_err(|_| anyhow::anyhow!("unknown signing algorithm: {name}"))?;
        if !is_asymmetric(alg) {
            bail!("symmetric signing algorithm {name} is not allowed");
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }
    if algorithms.is_empty() {
        bail!("RENTALS_AUTH_ALGORITHMS must name at least one algorithm");
    }
    Ok(algorithms)
}

/// Non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_var(name) {
        Some(value) => value.trim().parse().with_context(|| format!("parse {name}")),
        None => Ok(default),
    }
}

fn or_env(value: Option<u64>, name: &str, default: u64) -> Result<u64> {
    match value {
        Some(value) => Ok(value),
        None => env_parse(name, default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const VARS: &[&str] = &[
        "RENTALS_BIND",
        "RENTALS_METRICS_BIND",
        "RENTALS_STORAGE",
        "DATABASE_URL",
        "RENTALS_PG_MAX_CONNECTIONS",
        "RENTALS_PG_CONNECT_TIMEOUT_MS",
        "RENTALS_PG_ACQUIRE_TIMEOUT_MS",
        "AUTH0_DOMAIN",
        "API_AUDIENCE",
        "RENTALS_AUTH_ISSUER",
        "RENTALS_AUTH_JWKS_URL",
        "RENTALS_AUTH_ALGORITHMS",
        "RENTALS_JWKS_TTL_SECS",
        "RENTALS_JWKS_TIMEOUT_MS",
        "RENTALS_JWKS_MIN_REFRESH_SECS",
        "RENTALS_AUTH_LEEWAY_SECS",
        "RENTALS_CONFIG",
    ];

    /// Clears every variable this module reads and restores them on drop.
    struct CleanEnv(Vec<(&'static str, Option<String>)>);

    impl CleanEnv {
        fn new() -> Self {
            let saved = VARS
                .iter()
                .map(|key| (*key, std::env::var(key).ok()))
                .collect();
            for key in VARS {
                unsafe {
                    std::env::remove_var(key);
                }
            }
            Self(saved)
        }

        fn set(&self, key: &str, value: &str) {
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }

    impl Drop for CleanEnv {
        fn drop(&mut self) {
            for (key, value) in &self.0 {
                match value {
                    Some(value) => unsafe {
                        std::env::set_var(key, value);
                    },
                    None => unsafe {
                        std::env::remove_var(key);
                    },
                }
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_with_domain_and_audience() {
        let env = CleanEnv::new();
        env.set("AUTH0_DOMAIN", "tenant.auth0.com");
        env.set("API_AUDIENCE", "rentals");

        let config = RentalsConfig::from_env().expect("config");
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.metrics_bind, DEFAULT_METRICS_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.postgres.is_none());
        assert_eq!(config.auth.issuer, "https://tenant.auth0.com/");
        assert_eq!(
            config.auth.jwks_url,
            "https://tenant.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(config.auth.algorithms, vec![Algorithm::RS256]);
        assert_eq!(config.auth.leeway_secs, DEFAULT_LEEWAY_SECS);
    }

    #[test]
    #[serial]
    fn database_url_selects_postgres() {
        let env = CleanEnv::new();
        env.set("AUTH0_DOMAIN", "tenant.auth0.com");
        env.set("API_AUDIENCE", "rentals");
        env.set("DATABASE_URL", "postgres://localhost/rentals");
        env.set("RENTALS_PG_MAX_CONNECTIONS", "3");

        let config = RentalsConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.max_connections, 3);
        assert_eq!(pg.acquire_timeout_ms, DEFAULT_PG_TIMEOUT_MS);

        env.set("RENTALS_STORAGE", "memory");
        let config = RentalsConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    #[serial]
    fn issuer_and_audience_are_required() {
        let env = CleanEnv::new();
        env.set("AUTH0_DOMAIN", "tenant.auth0.com");
        let err = RentalsConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("API_AUDIENCE"));

        env.set("API_AUDIENCE", "rentals");
        unsafe {
            std::env::remove_var("AUTH0_DOMAIN");
        }
        let err = RentalsConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("AUTH0_DOMAIN"));
    }

    #[test]
    #[serial]
    fn symmetric_algorithms_are_rejected() {
        let env = CleanEnv::new();
        env.set("AUTH0_DOMAIN", "tenant.auth0.com");
        env.set("API_AUDIENCE", "rentals");
        env.set("RENTALS_AUTH_ALGORITHMS", "RS256,HS256");
        let err = RentalsConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("HS256"));

        env.set("RENTALS_AUTH_ALGORITHMS", "RS256, ES256,RS256");
        let config = RentalsConfig::from_env().expect("config");
        assert_eq!(
            config.auth.algorithms,
            vec![Algorithm::RS256, Algorithm::ES256]
        );
    }

    #[test]
    #[serial]
    fn explicit_issuer_and_jwks_url_override_domain() {
        let env = CleanEnv::new();
        env.set("AUTH0_DOMAIN", "tenant.auth0.com");
        env.set("API_AUDIENCE", "rentals");
        env.set("RENTALS_AUTH_ISSUER", "http://127.0.0.1:9999/");
        env.set("RENTALS_AUTH_JWKS_URL", "http://127.0.0.1:9999/keys");

        let config = RentalsConfig::from_env().expect("config");
        assert_eq!(config.auth.issuer, "http://127.0.0.1:9999/");
        assert_eq!(config.auth.jwks_url, "http://127.0.0.1:9999/keys");
    }

    #[test]
    #[serial]
    fn yaml_overrides_environment() {
        let env = CleanEnv::new();
        env.set("RENTALS_BIND", "127.0.0.1:1000");
        env.set("API_AUDIENCE", "from-env");

        let path = std::env::temp_dir().join(format!("rentals-config-{}.yaml", std::process::id()));
        let mut file = fs::File::create(&path).expect("create yaml");
        writeln!(
            file,
            "bind_addr: 127.0.0.1:2000\nauth:\n  domain: yaml.auth0.com\n  leeway_secs: 5\n"
        )
        .expect("write yaml");
        env.set("RENTALS_CONFIG", path.to_str().expect("path"));

        let config = RentalsConfig::from_env_or_yaml().expect("config");
        let _ = fs::remove_file(&path);
        assert_eq!(config.bind_addr, "127.0.0.1:2000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.auth.issuer, "https://yaml.auth0.com/");
        assert_eq!(config.auth.audience, "from-env");
        assert_eq!(config.auth.leeway_secs, 5);
    }

    #[test]
    fn from_domain_tolerates_scheme_and_trailing_slash() {
        let auth = AuthConfig::from_domain("https://tenant.auth0.com/", "rentals");
        assert_eq!(auth.issuer, "https://tenant.auth0.com/");
        assert_eq!(auth.audience, "rentals");
    }
}
