/*
 * Responsibility
 * - Load settings from environment variables (.env supported)
 * - Validate them up front: missing or invalid values fail startup
 */
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierKind {
    Firebase,
    SharedSecret,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub struct Config {
    pub host: String,
    pub port: u16,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub store_backend: StoreBackend,
    pub identity_verifier: VerifierKind,

    pub firebase_project_id: Option<String>,
    pub firebase_client_email: Option<String>,
    pub firebase_private_key_pem: Option<String>,
    pub firebase_token_uri: String,
    pub firestore_emulator_host: Option<String>,

    pub auth_shared_secret: Option<String>,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub auth_leeway_seconds: u64,

    pub register_require_auth: bool,
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (the process env in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values behave like unset ones.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8000,
        };

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let store_backend = match get("STORE_BACKEND").as_deref() {
            None | Some("firestore") => StoreBackend::Firestore,
            Some("memory") => StoreBackend::Memory,
            Some(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let identity_verifier = match get("IDENTITY_VERIFIER").as_deref() {
            None | Some("firebase") => VerifierKind::Firebase,
            Some("shared_secret") => VerifierKind::SharedSecret,
            Some(_) => return Err(ConfigError::Invalid("IDENTITY_VERIFIER")),
        };

        let firebase_project_id = get("FIREBASE_PROJECT_ID");
        let firebase_client_email = get("FIREBASE_CLIENT_EMAIL");
        // PEM keys usually arrive with escaped newlines in env files.
        let firebase_private_key_pem = get("FIREBASE_PRIVATE_KEY").map(|k| k.replace("\\n", "\n"));
        let firebase_token_uri =
            get("FIREBASE_TOKEN_URI").unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        let firestore_emulator_host = get("FIRESTORE_EMULATOR_HOST");

        if store_backend == StoreBackend::Firestore {
            if firebase_project_id.is_none() {
                return Err(ConfigError::Missing("FIREBASE_PROJECT_ID"));
            }
            if firestore_emulator_host.is_none() {
                if firebase_client_email.is_none() {
                    return Err(ConfigError::Missing("FIREBASE_CLIENT_EMAIL"));
                }
                if firebase_private_key_pem.is_none() {
                    return Err(ConfigError::Missing("FIREBASE_PRIVATE_KEY"));
                }
            }
        }

        let auth_shared_secret = get("AUTH_SHARED_SECRET");
        match identity_verifier {
            VerifierKind::Firebase if firebase_project_id.is_none() => {
                return Err(ConfigError::Missing("FIREBASE_PROJECT_ID"));
            }
            VerifierKind::SharedSecret if auth_shared_secret.is_none() => {
                return Err(ConfigError::Missing("AUTH_SHARED_SECRET"));
            }
            _ => {}
        }

        let auth_leeway_seconds = match get("AUTH_LEEWAY_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("AUTH_LEEWAY_SECONDS"))?,
            None => 60,
        };

        let register_require_auth = match get("REGISTER_REQUIRE_AUTH") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("REGISTER_REQUIRE_AUTH"))?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            app_env,
            cors_allowed_origins,
            store_backend,
            identity_verifier,
            firebase_project_id,
            firebase_client_email,
            firebase_private_key_pem,
            firebase_token_uri,
            firestore_emulator_host,
            auth_shared_secret,
            auth_issuer: get("AUTH_ISSUER"),
            auth_audience: get("AUTH_AUDIENCE"),
            auth_leeway_seconds,
            register_require_auth,
        })
    }

    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
