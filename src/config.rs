use std::path::PathBuf;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub projects_csv: PathBuf,
    pub host: String,
    pub port: u16,
    /// Interval of the page's refresh timer
    pub refresh_secs: u64,
    /// When set, synthesized impact is reseeded on every load and stays stable
    pub impact_seed: Option<u64>,
}

/// Longest accepted refresh interval (one day).
pub const MAX_REFRESH_SECS: u64 = 86_400;

impl Config {
    pub fn from_env() -> Self {
        Self {
            projects_csv: std::env::var("PROJECTS_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("projects.csv")),
            host: std::env::var("DASH_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("DASH_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8050),
            refresh_secs: parse_refresh_secs(std::env::var("REFRESH_SECS").ok().as_deref()),
            impact_seed: std::env::var("IMPACT_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Refresh interval in seconds; out-of-range or unparseable values fall back to 60.
pub fn parse_refresh_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|v| (1..=MAX_REFRESH_SECS).contains(v))
        .unwrap_or(60)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_csv: PathBuf::from("projects.csv"),
            host: "127.0.0.1".to_string(),
            port: 8050,
            refresh_secs: 60,
            impact_seed: None,
        }
    }
}
