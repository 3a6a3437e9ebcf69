//! Dashboard HTTP server.
//!
//! Plain HTTP/1.1 over a blocking `TcpListener`, one connection at a time, so
//! triggers from the page are handled strictly in arrival order.
//!
//! Endpoints:
//!   GET /              - dashboard page
//!   GET /api/executors - dropdown options (reloads the table)
//!   GET /api/charts    - the five figures for `?executor=` (reloads the table)
//!   GET /api/report    - last load report
//!   GET /api/health    - health check

use anyhow::{Context, Result};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Instant;
use url::Url;

use crate::dashboard::Dashboard;
use crate::filter::ExecutorSelection;
use crate::logging::{log, log_request, obj, v_str, Domain, Level};

const PAGE_TEMPLATE: &str = include_str!("page.html");
/// Browsers fire `setInterval` immediately for delays above i32::MAX ms.
const MAX_TIMER_MS: u64 = i32::MAX as u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Cache-Control: no-store\r\n\
             Connection: close\r\n\
             Content-Length: {}\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

pub struct Server {
    dashboard: Dashboard,
    refresh_secs: u64,
}

impl Server {
    pub fn new(dashboard: Dashboard, refresh_secs: u64) -> Self {
        Self {
            dashboard,
            refresh_secs,
        }
    }

    /// Accept loop. Connection errors are logged and skipped.
    pub fn serve(&mut self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("listener has no local address")?;
        log(
            Level::Info,
            Domain::Server,
            "listening",
            obj(&[("msg", v_str(&format!("dashboard at http://{}", addr)))]),
        );

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(err) => {
                    log(
                        Level::Warn,
                        Domain::Server,
                        "accept_failed",
                        obj(&[("msg", v_str(&err.to_string()))]),
                    );
                    continue;
                }
            };
            if let Err(err) = self.handle_connection(stream) {
                log(
                    Level::Warn,
                    Domain::Server,
                    "connection_failed",
                    obj(&[("msg", v_str(&format!("{:#}", err)))]),
                );
            }
        }
        Ok(())
    }

    fn handle_connection(&mut self, mut stream: TcpStream) -> Result<()> {
        let started = Instant::now();
        let Some((method, target)) = read_request(&stream)? else {
            return Ok(());
        };

        let response = self.handle(&method, &target);
        stream
            .write_all(response.to_http().as_bytes())
            .context("failed to write response")?;
        log_request(
            &method,
            &target,
            response.status,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(())
    }

    /// Route a single request.
    pub fn handle(&mut self, method: &str, target: &str) -> Response {
        if method != "GET" {
            return Response::text(405, "Method Not Allowed");
        }
        if !target.starts_with('/') {
            return Response::text(400, "Bad Request");
        }
        let url = match Url::parse(&format!("http://localhost{}", target)) {
            Ok(u) => u,
            Err(_) => return Response::text(400, "Bad Request"),
        };
        let executor = url
            .query_pairs()
            .find(|(k, _)| k == "executor")
            .map(|(_, v)| v.into_owned());

        match url.path() {
            "/" | "/index.html" => Response {
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: render_page(self.refresh_secs),
            },
            "/api/executors" => {
                let options = self.dashboard.refresh_executors(executor.as_deref());
                Response::json(json!(options))
            }
            "/api/charts" => {
                let selection = ExecutorSelection::parse(executor.as_deref());
                let charts = self.dashboard.refresh_charts(&selection);
                Response::json(json!(charts))
            }
            "/api/report" => Response::json(json!(self.dashboard.last_report())),
            "/api/health" => Response::json(json!({"status": "ok"})),
            _ => Response::text(404, "Not Found"),
        }
    }
}

/// Method and target of the request line. Headers are drained and ignored.
fn read_request(stream: &TcpStream) -> Result<Option<(String, String)>> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    loop {
        let mut header = String::new();
        let n = reader.read_line(&mut header)?;
        if n == 0 || header.trim().is_empty() {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();
    Ok(Some((method, target)))
}

/// Page with the timer interval filled in, clamped to what `setInterval` accepts.
pub fn render_page(refresh_secs: u64) -> String {
    let refresh_ms = refresh_secs.saturating_mul(1000).clamp(1000, MAX_TIMER_MS);
    PAGE_TEMPLATE.replace("{{REFRESH_MS}}", &refresh_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn server_with(csv: Option<&str>) -> (TempDir, Server) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.csv");
        if let Some(text) = csv {
            fs::write(&path, text).unwrap();
        }
        let server = Server::new(Dashboard::new(&path), 60);
        (dir, server)
    }

    const CSV: &str = "ID,Name,Problem,Initiator,Deadline,Status,Executor\n\
                       1,Park,Ecology,Ivan,2025-05-01,Active,Anna Petrova\n\
                       2,Library,Education,Olga,2025-06-01,Done,Boris\n";

    #[test]
    fn page_embeds_refresh_interval() {
        let (_dir, mut server) = server_with(None);
        let resp = server.handle("GET", "/");
        assert_eq!(resp.status, 200);
        assert!(resp.content_type.starts_with("text/html"));
        assert!(resp.body.contains("60000"));
        assert!(!resp.body.contains("{{REFRESH_MS}}"));
    }

    #[test]
    fn page_timer_never_overflows() {
        let page = render_page(u64::MAX);
        assert!(page.contains(&MAX_TIMER_MS.to_string()));
        assert!(render_page(0).contains("1000"));
    }

    #[test]
    fn charts_endpoint_decodes_executor() {
        let (_dir, mut server) = server_with(Some(CSV));
        let resp = server.handle("GET", "/api/charts?executor=Anna%20Petrova");
        assert_eq!(resp.status, 200);
        let v: Value = serde_json::from_str(&resp.body).unwrap();
        let title = v["status_histogram"]["layout"]["title"]["text"].as_str().unwrap();
        assert!(title.ends_with("(Executor: Anna Petrova)"));
    }

    #[test]
    fn missing_file_serves_sentinel_only() {
        let (_dir, mut server) = server_with(None);
        let resp = server.handle("GET", "/api/executors");
        let v: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(v["options"].as_array().unwrap().len(), 1);
        assert_eq!(v["value"], "all");

        let report = server.handle("GET", "/api/report");
        let v: Value = serde_json::from_str(&report.body).unwrap();
        assert!(v["error"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn rejects_unknown_routes_and_methods() {
        let (_dir, mut server) = server_with(None);
        assert_eq!(server.handle("GET", "/nope").status, 404);
        assert_eq!(server.handle("POST", "/api/charts").status, 405);
        assert_eq!(server.handle("GET", "api").status, 400);
        assert_eq!(server.handle("GET", "/api/health").body, r#"{"status":"ok"}"#);
    }

    #[test]
    fn http_response_has_content_length() {
        let resp = Response::text(404, "Not Found");
        let raw = resp.to_http();
        assert!(raw.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(raw.contains("Content-Length: 9\r\n"));
    }
}
