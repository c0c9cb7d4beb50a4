#![allow(missing_docs)]

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

use super::SaveReceipt;
use crate::{document::AppDocument, error::StoreError};

/// Client for the `GET/POST {base}/data` endpoints.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Use a preconfigured client.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn data_url(&self) -> String {
        format!("{}/data", self.base_url)
    }

    pub async fn load(&self) -> Result<AppDocument, StoreError> {
        let response = self.client.get(self.data_url()).send().await?;
        let body = success_body(response).await?;
        debug!(bytes = body.len(), "fetched document");
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn save(&self, document: &AppDocument) -> Result<SaveReceipt, StoreError> {
        let response = self
            .client
            .post(self.data_url())
            .json(document)
            .send()
            .await?;
        let body = success_body(response).await?;
        let receipt: SaveReceipt = serde_json::from_str(&body)?;
        if !receipt.success {
            return Err(StoreError::Rejected);
        }
        Ok(receipt)
    }
}

/// Body of a 2xx response; anything else becomes [`StoreError::Status`]
/// carrying the body as detail.
async fn success_body(response: Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            detail: body,
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Serve one canned HTTP response and hand back the raw request.
    async fn respond_once(status: &str, body: &str) -> Result<(String, JoinHandle<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base = format!("http://{}/api", listener.local_addr()?);
        let reply = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return String::new();
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let Ok(read) = socket.read(&mut buf).await else {
                    break;
                };
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
                if request_complete(&request) {
                    break;
                }
            }
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        Ok((base, handle))
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + length
    }

    fn store(base: &str) -> Result<HttpStore> {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(HttpStore::with_client(base, client))
    }

    #[tokio::test]
    async fn load_fetches_the_data_endpoint() -> Result<()> {
        let body = serde_json::to_string(&AppDocument::default())?;
        let (base, server) = respond_once("200 OK", &body).await?;
        let document = store(&base)?.load().await?;
        assert_eq!(document, AppDocument::default());
        let request = server.await?;
        assert!(request.starts_with("GET /api/data "));
        Ok(())
    }

    #[tokio::test]
    async fn save_posts_the_whole_document() -> Result<()> {
        let (base, server) = respond_once(
            "200 OK",
            r#"{"success":true,"lastSaved":"2025-03-01T09:30:00.000Z"}"#,
        )
        .await?;
        let receipt = store(&base)?.save(&AppDocument::default()).await?;
        assert!(receipt.success);
        assert_eq!(receipt.last_saved.to_rfc3339(), "2025-03-01T09:30:00+00:00");

        let request = server.await?;
        assert!(request.starts_with("POST /api/data "));
        assert!(request.contains("\"schedule\""));
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_carries_body_detail() -> Result<()> {
        let (base, _server) = respond_once("500 Internal Server Error", "disk full").await?;
        match store(&base)?.load().await {
            Err(StoreError::Status { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail, "disk full");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn unsuccessful_receipt_is_rejected() -> Result<()> {
        let (base, _server) = respond_once(
            "200 OK",
            r#"{"success":false,"lastSaved":"2025-03-01T09:30:00Z"}"#,
        )
        .await?;
        let result = store(&base)?.save(&AppDocument::default()).await;
        assert!(matches!(result, Err(StoreError::Rejected)));
        Ok(())
    }
}
