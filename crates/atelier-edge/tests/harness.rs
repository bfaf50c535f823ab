use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;
use tempfile::TempDir;
use tokio::time::sleep;
use wiremock::MockServer;

/// One edge process wired to per-test service doubles: `auth_server` plays
/// the session authority, `data_server` plays the role table and the
/// conversation store, `llm_server` plays the generation API.
pub struct EdgeProcess {
    child: Child,
    pub base_url: String,
    pub auth_server: MockServer,
    pub data_server: MockServer,
    pub llm_server: MockServer,
    _dir: TempDir,
}

impl EdgeProcess {
    pub async fn spawn() -> Self {
        let auth_server = MockServer::start().await;
        let data_server = MockServer::start().await;
        let llm_server = MockServer::start().await;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test port");
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = format!(
            r#"
[server]
address = "127.0.0.1"
port = {port}

[gate.sessions]
base_url = "{auth}"
api_key = "anon-test-key"

[gate.roles]
base_url = "{data}"
service_key = "service-test-key"

[relay.provider]
api_key = "llm-test-key"
base_url = "{llm}"
model = "gemini-1.5-flash"

[relay.store]
base_url = "{data}"
service_key = "service-test-key"
"#,
            port = port,
            auth = auth_server.uri(),
            data = data_server.uri(),
            llm = llm_server.uri(),
        );

        let tmp_dir = TempDir::new().expect("temp dir");
        let config_path = write_config(tmp_dir.path(), &config);

        let mut child = Command::new(env!("CARGO_BIN_EXE_atelier-edge"))
            .env("EDGE_CONFIG_FILE", &config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn edge process");

        let base_url = format!("http://127.0.0.1:{port}");
        wait_for_ready(&base_url, &mut child).await;

        Self {
            child,
            base_url,
            auth_server,
            data_server,
            llm_server,
            _dir: tmp_dir,
        }
    }
}

impl Drop for EdgeProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Redirects stay visible to the tests; the gate's decision is the thing
/// under assertion.
pub fn edge_client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("build test client")
}

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("edge.toml");
    std::fs::write(&path, contents).expect("write config");
    path
}

async fn wait_for_ready(base_url: &str, child: &mut Child) {
    let client = Client::new();
    for _ in 0..100 {
        if let Some(status) = child.try_wait().expect("check edge child status") {
            panic!("edge process exited early with status {status}");
        }
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("edge did not become ready at {base_url}");
}
