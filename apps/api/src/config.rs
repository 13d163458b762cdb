use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;

/// Which persistence backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Where uploaded resumes are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeBackend {
    Local,
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub port: u16,
    pub rust_log: String,
    pub resume_backend: ResumeBackend,
    pub upload_dir: String,
    pub max_resume_bytes: usize,
    pub allow_admin_signup: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend = match optional_env("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };
        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => optional_env("DATABASE_URL"),
        };

        let resume_backend = match optional_env("RESUME_STORAGE").as_deref() {
            None | Some("local") => ResumeBackend::Local,
            Some("s3") => ResumeBackend::S3 {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            },
            Some(other) => bail!("RESUME_STORAGE must be 'local' or 's3', got '{other}'"),
        };

        let jwt_expires_in = parse_expiry(
            &optional_env("JWT_EXPIRES_IN").unwrap_or_else(|| "30d".to_string()),
        )
        .context("JWT_EXPIRES_IN must look like 30d, 12h, 45m or 90s")?;

        Ok(Config {
            store_backend,
            database_url,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_expires_in,
            port: optional_env("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            resume_backend,
            upload_dir: optional_env("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            max_resume_bytes: optional_env("MAX_RESUME_BYTES")
                .unwrap_or_else(|| (5 * 1024 * 1024).to_string())
                .parse::<usize>()
                .context("MAX_RESUME_BYTES must be a byte count")?,
            allow_admin_signup: optional_env("ALLOW_ADMIN_SIGNUP")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a token lifetime such as `30d`, `12h`, `45m`, `90s` or `-1h`.
/// A bare number is read as seconds.
pub fn parse_expiry(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (number, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c)),
        Some(_) => (raw, None),
        None => bail!("empty duration"),
    };
    let n: i64 = number
        .parse()
        .map_err(|_| anyhow!("invalid duration '{raw}'"))?;
    let duration = match unit {
        None | Some('s') => Duration::try_seconds(n),
        Some('m') => Duration::try_minutes(n),
        Some('h') => Duration::try_hours(n),
        Some('d') => Duration::try_days(n),
        Some(u) => bail!("unknown duration unit '{u}'"),
    };
    duration.ok_or_else(|| anyhow!("duration '{raw}' is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_expiry("30d").unwrap(), Duration::days(30));
    }

    #[test]
    fn test_parse_negative_hours() {
        assert_eq!(parse_expiry("-1h").unwrap(), Duration::hours(-1));
    }

    #[test]
    fn test_parse_bare_seconds() {
        assert_eq!(parse_expiry("3600").unwrap(), Duration::seconds(3600));
    }

    #[test]
    fn test_parse_minutes_with_whitespace() {
        assert_eq!(parse_expiry(" 45m ").unwrap(), Duration::minutes(45));
    }

    #[test]
    fn test_reject_unknown_unit() {
        assert!(parse_expiry("2w").is_err());
    }

    #[test]
    fn test_reject_out_of_range() {
        assert!(parse_expiry("9223372036854775807d").is_err());
        assert!(parse_expiry("-9223372036854775807h").is_err());
    }

    #[test]
    fn test_reject_garbage() {
        assert!(parse_expiry("soon").is_err());
        assert!(parse_expiry("").is_err());
    }
}
