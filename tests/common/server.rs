//! Test server management.
//!
//! Spawns and manages eurekad instances for integration testing.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: PathBuf,
}

impl TestServer {
    /// Spawn a server on `port` with `admin` as its bootstrap administrator.
    pub async fn spawn(port: u16, admin: &str) -> anyhow::Result<Self> {
        let data_dir = std::env::temp_dir().join(format!("eurekad-test-{}", port));
        let _ = std::fs::remove_dir_all(&data_dir);
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.eureka"
listen = "127.0.0.1:{}"

[database]
path = "{}/test.db"

[header]
site_label_template = "<b>%SITELABEL%</b>"
site_label = "TEST SYSTEM"

[bootstrap]
administrators = ["{}"]
"#,
            port,
            data_dir.display(),
            admin
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_eurekad"))
            .arg(&config_path)
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Base URL of the server.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// A client acting as `account`, or anonymously when `None`.
    pub fn client(&self, account: Option<&str>) -> super::client::ApiClient {
        super::client::ApiClient::new(self.base_url(), account)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
