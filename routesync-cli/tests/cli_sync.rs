use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Minimal listing server
// ---------------------------------------------------------------------------

/// Serves `GET /users/<id>/routes.json` pages from a shared route list and
/// records every request target.
struct ListingServer {
    base_url: String,
    routes: Arc<Mutex<Vec<(u64, String)>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ListingServer {
    fn start(routes: &[(u64, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listing server");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let routes = Arc::new(Mutex::new(
            routes.iter().map(|(id, t)| (*id, t.to_string())).collect(),
        ));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let shared_routes = Arc::clone(&routes);
        let shared_requests = Arc::clone(&requests);
        std::thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                serve(stream, &shared_routes, &shared_requests);
            }
        });

        Self {
            base_url,
            routes,
            requests,
        }
    }

    fn set_routes(&self, routes: &[(u64, &str)]) {
        *self.routes.lock().unwrap() = routes.iter().map(|(id, t)| (*id, t.to_string())).collect();
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(
    stream: TcpStream,
    routes: &Mutex<Vec<(u64, String)>>,
    requests: &Mutex<Vec<String>>,
) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Drain headers.
    let mut header = String::new();
    while reader.read_line(&mut header).map(|n| n > 0).unwrap_or(false) {
        if header == "\r\n" || header == "\n" {
            break;
        }
        header.clear();
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or_default().to_string();
    requests.lock().unwrap().push(target.clone());

    let offset = query_param(&target, "offset").unwrap_or(0);
    let limit = query_param(&target, "limit").unwrap_or(100);
    let routes = routes.lock().unwrap().clone();
    let page: Vec<String> = routes
        .iter()
        .skip(offset)
        .take(limit)
        .map(|(id, t)| format!(r#"{{"id":{id},"updated_at":"{t}","name":"route {id}"}}"#))
        .collect();
    let body = format!(
        r#"{{"results":[{}],"results_count":{}}}"#,
        page.join(","),
        routes.len()
    );

    let mut stream = stream;
    let _ = write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.flush();
}

fn query_param(target: &str, key: &str) -> Option<usize> {
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const T1: &str = "2023-01-01T00:00:00Z";
const T2: &str = "2023-02-01T00:00:00Z";

/// Temp HOME with a config that disables the simulated download delay.
fn home_with_config() -> TempDir {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".routesync");
    std::fs::create_dir_all(&dir).expect("config dir");
    std::fs::write(dir.join("config.yaml"), "download_delay_ms: 0\nrequest_timeout_secs: 5\n")
        .expect("write config");
    home
}

fn routesync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("routesync").expect("routesync binary");
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn sync_cmd(home: &Path, base_url: &str, index: &Path) -> Command {
    let mut cmd = routesync(home);
    cmd.args(["-k", "the-key", "-t", "the-token", "-u", "42"])
        .arg("--base-url")
        .arg(base_url)
        .arg("--index-file")
        .arg(index);
    cmd
}

fn index_path(home: &TempDir) -> PathBuf {
    home.path().join("index.txt")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn missing_required_flags_fail() {
    let home = home_with_config();
    routesync(home.path())
        .args(["-k", "the-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--auth-token"));
}

#[test]
fn non_numeric_user_id_fails() {
    let home = home_with_config();
    routesync(home.path())
        .args(["-k", "the-key", "-t", "the-token", "-u", "alice"])
        .assert()
        .failure();
}

#[test]
fn sync_then_resync_is_up_to_date() {
    let home = home_with_config();
    let server = ListingServer::start(&[(1, T1), (2, T1), (3, T2)]);
    let index = index_path(&home);

    sync_cmd(home.path(), &server.base_url, &index)
        .assert()
        .success()
        .stdout(predicate::str::contains("found 3 routes"))
        .stdout(predicate::str::contains("updated 3 routes"));

    let written = std::fs::read_to_string(&index).expect("index written");
    assert_eq!(
        written,
        "1,2023-01-01T00:00:00+00:00\n2,2023-01-01T00:00:00+00:00\n3,2023-02-01T00:00:00+00:00\n"
    );

    sync_cmd(home.path(), &server.base_url, &index)
        .assert()
        .success()
        .stdout(predicate::str::contains("up-to-date!"));

    let requests = server.requests();
    assert_eq!(requests.len(), 2, "one page per pass: {requests:?}");
    assert!(requests[0].starts_with("/users/42/routes.json?"));
    assert!(requests[0].contains("offset=0"));
    assert!(requests[0].contains("limit=100"));
    assert!(requests[0].contains("apikey=the-key"));
    assert!(requests[0].contains("auth_token=the-token"));
}

#[test]
fn remote_changes_are_fetched_and_purged() {
    let home = home_with_config();
    let server = ListingServer::start(&[(1, T1), (2, T1)]);
    let index = index_path(&home);
    sync_cmd(home.path(), &server.base_url, &index).assert().success();

    server.set_routes(&[(1, T2)]);
    sync_cmd(home.path(), &server.base_url, &index)
        .assert()
        .success()
        .stdout(predicate::str::contains("updated 1 routes"))
        .stdout(predicate::str::contains("purged 1 orphan routes"));

    assert_eq!(
        std::fs::read_to_string(&index).expect("index"),
        "1,2023-02-01T00:00:00+00:00\n"
    );
}

#[test]
fn dry_run_json_reports_plan_and_writes_nothing() {
    let home = home_with_config();
    let server = ListingServer::start(&[(7, T1), (8, T1)]);
    let index = index_path(&home);

    let output = sync_cmd(home.path(), &server.base_url, &index)
        .args(["--dry-run", "--json"])
        .output()
        .expect("run routesync");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary json");
    assert_eq!(summary["dry_run"], true);
    assert_eq!(summary["fetched_count"], 2);
    assert_eq!(summary["total_remote"], 2);
    assert!(!index.exists(), "dry run must not write the index");
}

#[test]
fn corrupt_index_fails_without_contacting_remote() {
    let home = home_with_config();
    let server = ListingServer::start(&[(1, T1)]);
    let index = index_path(&home);
    std::fs::write(&index, "1,2023-01-01\n").expect("write corrupt index");

    sync_cmd(home.path(), &server.base_url, &index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt index"));

    assert!(server.requests().is_empty());
    assert_eq!(std::fs::read_to_string(&index).expect("index"), "1,2023-01-01\n");
}

#[test]
fn unreachable_remote_fails_and_keeps_index() {
    let home = home_with_config();
    let index = index_path(&home);
    std::fs::write(&index, "5,2023-01-01T00:00:00+00:00\n").expect("seed index");

    sync_cmd(home.path(), "http://127.0.0.1:1", &index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("transport error"))
        .stderr(predicate::str::contains("the-key").not());

    assert_eq!(
        std::fs::read_to_string(&index).expect("index"),
        "5,2023-01-01T00:00:00+00:00\n"
    );
}

#[test]
fn invalid_config_file_fails() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("bad.yaml");
    std::fs::write(&config, "page_size: 0\n").expect("write config");

    routesync(home.path())
        .args(["-k", "the-key", "-t", "the-token", "-u", "42", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));
}
