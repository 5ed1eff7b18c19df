//! End-to-end tests of the position server over a real socket.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use etalon::server::{self, ServerState};
use etalon::{AuditLog, PositionController};
use hardware::SimulatedFilterWheel;

const SLOTS: [i64; 4] = [100, 300, 500, 700];

struct TestServer {
    base_url: String,
    audit_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn audit_messages(&self) -> Vec<String> {
        std::fs::read_to_string(&self.audit_path)
            .unwrap_or_default()
            .lines()
            .map(|line| line.split_once(":: ").unwrap().1.to_string())
            .collect()
    }
}

fn start_server(wheel: SimulatedFilterWheel, temperature_csv: Option<&str>) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("server.log");
    let csv_path = dir.path().join("temperature.csv");
    if let Some(contents) = temperature_csv {
        std::fs::write(&csv_path, contents).unwrap();
    }

    let audit = AuditLog::new(&audit_path);
    let controller = PositionController::new(wheel, audit.clone());
    let state = Arc::new(ServerState::new(controller, &csv_path, audit));

    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            server::serve(listener, server::router(state)).await.unwrap();
        });
    });
    let addr = rx.recv().unwrap();

    TestServer {
        base_url: format!("http://{addr}"),
        audit_path,
        _dir: dir,
    }
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

fn post(server: &TestServer, form: &[(&str, &str)]) -> (u16, String) {
    let mut response = agent()
        .post(&server.url("/"))
        .send_form(form.iter().copied())
        .unwrap();
    let body = response.body_mut().read_to_string().unwrap();
    (response.status().as_u16(), body)
}

fn wheel_at(offset: i64) -> SimulatedFilterWheel {
    SimulatedFilterWheel::new(SLOTS, 0).starting_at(offset)
}

#[test]
fn test_set_then_query_position() {
    let server = start_server(wheel_at(100), None);

    let (status, body) = post(&server, &[("command", "filterwheel"), ("position", "2")]);
    assert_eq!(status, 200);
    assert_eq!(body, "");

    let (status, body) = post(&server, &[("command", "filterwheel"), ("status", "")]);
    assert_eq!(status, 200);
    assert_eq!(body, "2");

    let messages = server.audit_messages();
    assert!(messages.contains(&"POSITION REQUESTED 2 (OLD:unknown)".to_string()));
    assert!(messages.contains(&"CURRENT POSITION 2".to_string()));
}

#[test]
fn test_every_position_round_trips() {
    let server = start_server(wheel_at(0), None);
    for position in ["0", "1", "2", "3", "1"] {
        let (status, _) = post(&server, &[("command", "filterwheel"), ("position", position)]);
        assert_eq!(status, 200);

        let (_, body) = post(&server, &[("command", "filterwheel"), ("status", "")]);
        assert_eq!(body, position);
    }
}

#[test]
fn test_home_lands_on_slot_zero() {
    let server = start_server(wheel_at(0), None);

    let (status, body) = post(&server, &[("command", "filterwheel"), ("home", "")]);
    assert_eq!(status, 200);
    assert_eq!(body, "");

    let (_, body) = post(&server, &[("command", "filterwheel"), ("status", "")]);
    assert_eq!(body, "0");

    let messages = server.audit_messages();
    assert!(messages.contains(&"REQUESTED HOMING SEQUENCE".to_string()));
    assert!(messages.contains(&"SUCCESS REACHING HOME".to_string()));
}

#[test]
fn test_invalid_position_is_rejected() {
    let server = start_server(wheel_at(500), None);

    for bad in ["4", "-1", "red", ""] {
        let (status, body) = post(&server, &[("command", "filterwheel"), ("position", bad)]);
        assert_eq!(status, 400, "position={bad}");
        assert!(!body.is_empty());
    }

    // Wheel untouched
    let (_, body) = post(&server, &[("command", "filterwheel"), ("status", "")]);
    assert_eq!(body, "2");
}

#[test]
fn test_desync_is_an_error() {
    let server = start_server(wheel_at(301), None);

    let (status, body) = post(&server, &[("command", "filterwheel"), ("status", "")]);
    assert_eq!(status, 500);
    assert!(body.contains("301"));
    assert!(server
        .audit_messages()
        .iter()
        .any(|line| line.starts_with("ERROR")));
}

#[test]
fn test_hardware_fault_is_an_error() {
    let mut wheel = wheel_at(300);
    wheel.fail_next("stall");
    let server = start_server(wheel, None);

    let (status, body) = post(&server, &[("command", "filterwheel"), ("position", "3")]);
    assert_eq!(status, 500);
    assert!(body.contains("stall"));
}

#[test]
fn test_unknown_commands_are_ignored() {
    let server = start_server(wheel_at(100), None);

    assert_eq!(post(&server, &[("command", "shutter"), ("open", "")]), (200, String::new()));
    assert_eq!(post(&server, &[("command", "filterwheel")]), (200, String::new()));
    assert_eq!(post(&server, &[("position", "2")]), (200, String::new()));

    let (_, body) = post(&server, &[("command", "filterwheel"), ("status", "")]);
    assert_eq!(body, "0");
}

#[test]
fn test_log_download() {
    let csv = "date,value,std,temp,std\n2021/09/16 12:00:30,1000,0.000,24.498,0.000\n";
    let server = start_server(wheel_at(100), Some(csv));

    let mut response = agent().get(&server.url("/log.txt")).call().unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html"
    );
    assert_eq!(response.body_mut().read_to_string().unwrap(), csv);
    assert!(server.audit_messages().contains(&"log.txt dumped".to_string()));
}

#[test]
fn test_missing_log_is_an_error() {
    let server = start_server(wheel_at(100), None);

    let response = agent().get(&server.url("/log.txt")).call().unwrap();
    assert_eq!(response.status().as_u16(), 500);
}

#[test]
fn test_other_get_and_head() {
    let server = start_server(wheel_at(100), None);

    let mut response = agent().get(&server.url("/index.html")).call().unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.body_mut().read_to_string().unwrap(), "");

    let response = agent().head(&server.url("/")).call().unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html"
    );
}

#[test]
fn test_unsupported_method() {
    let server = start_server(wheel_at(100), None);

    let response = agent().delete(&server.url("/")).call().unwrap();
    assert_eq!(response.status().as_u16(), 501);
}
