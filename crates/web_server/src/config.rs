use std::{env, fmt::Display, str::FromStr};

/// Which origins the CORS layer accepts
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigins {
    /// `CORS_ORIGIN=*` or unset
    Any,
    /// Explicit comma-separated list
    List(Vec<String>),
}

/// Server configuration read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string
    pub database_url: String,
    /// Pool size
    pub database_max_connections: u32,
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Deployment environment, `production` enables hardening
    pub app_env: String,
    /// Token signing secret
    pub jwt_secret: Option<String>,
    /// Allowed CORS origins
    pub cors_origins: CorsOrigins,
    /// Directory of the admin panel front end
    pub admin_static_dir: String,
    /// Directory of the public website
    pub public_static_dir: String,
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            database_url: text("DATABASE_URL", "postgres://localhost/yatra"),
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 5),
            host: text("HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 3000),
            app_env: text("APP_ENV", "development"),
            jwt_secret: lookup("JWT_SECRET"),
            cors_origins: parse_origins(lookup("CORS_ORIGIN").as_deref()),
            admin_static_dir: text("ADMIN_STATIC_DIR", "./admin"),
            public_static_dir: text("PUBLIC_STATIC_DIR", "./public"),
        }
    }

    /// Whether the server runs in production mode.
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("Invalid {} value '{}': {}, using {}", key, raw, e, default);
            default
        }),
    }
}

fn parse_origins(raw: Option<&str>) -> CorsOrigins {
    let origins: Vec<String> = raw
        .unwrap_or("*")
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.database_url, "postgres://localhost/yatra");
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert!(!config.is_production());
        assert_eq!(config.jwt_secret, None);
        assert_eq!(config.cors_origins, CorsOrigins::Any);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("APP_ENV", "Production"),
            ("JWT_SECRET", "s3cret"),
            ("CORS_ORIGIN", "https://yatra.org, https://admin.yatra.org"),
        ]);
        assert_eq!(config.port, 8080);
        assert!(config.is_production());
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(
            config.cors_origins,
            CorsOrigins::List(vec![
                "https://yatra.org".to_string(),
                "https://admin.yatra.org".to_string()
            ])
        );
    }

    #[test]
    fn test_bad_port_falls_back() {
        assert_eq!(config(&[("PORT", "eighty")]).port, 3000);
    }
}
