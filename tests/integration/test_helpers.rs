//! Shared fakes for supervisor-level tests.
//!
//! `FakeConnector` records subcommand invocations and spawns a real
//! `sleep` child in place of the connector, so exit races run against
//! genuine process handles without the external binary.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::process::{Child, Command};

use socket_sentry::config::{CiContext, RunConfig};
use socket_sentry::connector::liveness::Liveness;
use socket_sentry::connector::ConnectorCli;
use socket_sentry::models::session::SessionMode;
use socket_sentry::{AppError, Result};

/// Records connector invocations; stands in a `sleep` child for connect.
pub struct FakeConnector {
    /// Names passed to `create_session`, in call order.
    pub created: Mutex<Vec<String>>,
    /// Names passed to `delete_session`, in call order.
    pub deleted: Mutex<Vec<String>>,
    /// Names passed to `spawn_connector`, in call order.
    pub connected: Mutex<Vec<String>>,
    /// Seconds the stand-in child sleeps before exiting.
    pub connector_lifetime_secs: String,
    /// When set, `delete_session` fails after recording the call.
    pub fail_delete: bool,
}

impl FakeConnector {
    pub fn new(connector_lifetime_secs: &str) -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            connected: Mutex::new(Vec::new()),
            connector_lifetime_secs: connector_lifetime_secs.to_owned(),
            fail_delete: false,
        }
    }

    pub fn failing_delete(connector_lifetime_secs: &str) -> Self {
        Self {
            fail_delete: true,
            ..Self::new(connector_lifetime_secs)
        }
    }

    pub fn delete_count(&self) -> usize {
        self.deleted.lock().expect("lock").len()
    }
}

impl ConnectorCli for FakeConnector {
    fn create_session(
        &self,
        name: &str,
        _username: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let name = name.to_owned();
        Box::pin(async move {
            self.created.lock().expect("lock").push(name);
            Ok(())
        })
    }

    fn spawn_connector(
        &self,
        name: &str,
        _username: &str,
        _mode: SessionMode,
    ) -> Pin<Box<dyn Future<Output = Result<Child>> + Send + '_>> {
        let name = name.to_owned();
        Box::pin(async move {
            self.connected.lock().expect("lock").push(name);
            Command::new("sleep")
                .arg(&self.connector_lifetime_secs)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|err| AppError::Launch(format!("failed to spawn sleep: {err}")))
        })
    }

    fn delete_session(&self, name: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let name = name.to_owned();
        Box::pin(async move {
            self.deleted.lock().expect("lock").push(name);
            if self.fail_delete {
                Err(AppError::Api("delete rejected".into()))
            } else {
                Ok(())
            }
        })
    }
}

/// Minimal control-plane HTTP stub on an ephemeral port. GETs answer
/// with `socket_json`; PUTs answer `{}` or, when `fail_tag_update` is
/// set, a 500. Returns the base URL to point the client at.
pub async fn control_plane_stub(socket_json: String, fail_tag_update: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_one(stream, socket_json.clone(), fail_tag_update));
        }
    });
    format!("http://{addr}")
}

async fn serve_one(mut stream: TcpStream, socket_json: String, fail_tag_update: bool) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    let header_end = loop {
        let Ok(n) = stream.read(&mut chunk).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let Ok(n) = stream.read(&mut chunk).await else { return };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let (status, payload) = if head.starts_with("PUT") {
        if fail_tag_update {
            ("500 Internal Server Error", "{}".to_owned())
        } else {
            ("200 OK", "{}".to_owned())
        }
    } else {
        ("200 OK", socket_json)
    };
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Probe that always answers the same.
pub struct StaticLiveness(pub bool);

impl Liveness for StaticLiveness {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let answer = self.0;
        Box::pin(async move { answer })
    }
}

/// Config pointing the marker store at `state_dir`; no env access.
pub fn test_config(state_dir: PathBuf) -> RunConfig {
    RunConfig {
        access_token: "test-token".into(),
        slack_webhook_url: None,
        background: false,
        cleanup_only: false,
        wait_minutes: 0,
        state_dir,
        connector_bin: PathBuf::from("./border0"),
        ssh_username: "runner".into(),
        ci: CiContext {
            repository: "acme/widgets".into(),
            run_id: "42".into(),
            run_attempt: "1".into(),
            workflow: "build".into(),
            server_url: "https://github.com".into(),
            actor: "octocat".into(),
            job_status: "Success".into(),
        },
    }
}
