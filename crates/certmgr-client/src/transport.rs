//! Request transports.
//!
//! `Http` sends requests in-process with reqwest. `Curl` hands each request to
//! `curl --negotiate -u :`, which picks up the Kerberos credential cache of the
//! calling user. Both return the raw status and body; status interpretation is
//! left to the client.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::error::ClientError;

/// HTTP methods used by the certmgr API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// Status code and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// How requests reach the API.
#[derive(Debug)]
pub enum Transport {
    Http(reqwest::Client),
    Curl(CurlTransport),
}

impl Transport {
    /// In-process transport with a per-request timeout.
    pub fn http(timeout: Duration) -> Result<Self, ClientError> {
        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .user_agent(format!("certmgr/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::Http(http))
    }

    pub fn curl(bin: impl Into<PathBuf>) -> Self {
        Self::Curl(CurlTransport { bin: bin.into() })
    }

    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, ClientError> {
        debug!(method = method.as_str(), %url, "Sending certmgr request");
        match self {
            Self::Http(http) => send_http(http, method, url, body).await,
            Self::Curl(curl) => curl.send(method, url, body).await,
        }
    }
}

async fn send_http(
    http: &reqwest::Client,
    method: Method,
    url: &Url,
    body: Option<&serde_json::Value>,
) -> Result<RawResponse, ClientError> {
    let mut req = match method {
        Method::Get => http.get(url.clone()),
        Method::Post => http.post(url.clone()),
        Method::Delete => http.delete(url.clone()),
    };
    if let Some(body) = body {
        req = req.json(body);
    }
    let resp = req.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok(RawResponse { status, body })
}

/// Delegates requests to a `curl` binary.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    bin: PathBuf,
}

impl CurlTransport {
    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, ClientError> {
        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.args(["-s", "-S", "--negotiate", "-u", ":", "-X", method.as_str()])
            .args(["-w", "\n%{http_code}"]);
        if let Some(body) = body {
            cmd.args(["-H", "Content-Type: application/json", "-d"])
                .arg(body.to_string());
        }
        cmd.arg(url.as_str());

        let output = cmd.output().await.map_err(|e| {
            ClientError::Subprocess(format!("failed to run {}: {e}", self.bin.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Subprocess(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }

        parse_curl_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Split curl's stdout into body and the status line appended by `-w`.
pub(crate) fn parse_curl_output(stdout: &str) -> Result<RawResponse, ClientError> {
    let (body, code) = stdout.rsplit_once('\n').unwrap_or(("", stdout));
    let status = code.trim().parse::<u16>().map_err(|_| {
        ClientError::Subprocess(format!("unexpected curl output: {stdout:?}"))
    })?;
    Ok(RawResponse {
        status,
        body: body.to_string(),
    })
}
