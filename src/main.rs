use anyhow::{Context, Result};
use serde_json::json;
use std::net::TcpListener;

use impactboard::config::Config;
use impactboard::dashboard::Dashboard;
use impactboard::logging::{log, obj, v_str, Domain, Level};
use impactboard::server::Server;

fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("path", v_str(&cfg.projects_csv.display().to_string())),
            ("bind", v_str(&cfg.bind_addr())),
            ("refresh_secs", json!(cfg.refresh_secs)),
            ("impact_seed", json!(cfg.impact_seed)),
        ]),
    );

    let mut dashboard = Dashboard::from_config(&cfg);
    // Initial load so the first log lines show what the page will see.
    dashboard.refresh();

    let listener = TcpListener::bind(cfg.bind_addr())
        .with_context(|| format!("failed to bind {}", cfg.bind_addr()))?;
    Server::new(dashboard, cfg.refresh_secs).serve(listener)
}
