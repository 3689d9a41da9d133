//! Thin JSON-RPC client for the recall daemon
//!
//! A parameter-shaping and request-dispatch shim: no retries, no pooling
//! policy beyond reqwest's defaults, no state. Tenant identity travels in
//! the `x-tenant-id` header on every call.

use serde_json::Value;
use url::Url;
use uuid::Uuid;

use recall_server::rpc::{RpcRequest, RpcResponse};

use crate::error::{CliError, CliResult};

pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    tenant: String,
}

impl RpcClient {
    pub fn new(server: &str, tenant: &str) -> CliResult<Self> {
        let base = Url::parse(server)?;
        let endpoint = base.join("rpc")?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            tenant: tenant.to_string(),
        })
    }

    /// Call one RPC method and return its result mapping
    pub async fn call(&self, method: &str, params: Value) -> CliResult<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::String(Uuid::new_v4().to_string())),
            method: method.to_string(),
            params,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("x-tenant-id", &self.tenant)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError(format!("server returned HTTP {status}")));
        }

        let parsed: RpcResponse = response.json().await?;
        if let Some(error) = parsed.error {
            return Err(CliError(format!("{} (code {})", error.message, error.code)));
        }
        parsed
            .result
            .ok_or_else(|| CliError("response carried neither result nor error".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_call_sends_tenant_header_and_unwraps_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(header("x-tenant-id", "team-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": "any",
                "result": {"count": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RpcClient::new(&server.uri(), "team-a").unwrap();
        let result = client.call("memory_stats", json!({})).await.unwrap();
        assert_eq!(result["count"], 3);
    }

    #[tokio::test]
    async fn test_call_surfaces_rpc_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": "any",
                "error": {"code": -32001, "message": "Memory not found: 7"}
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(&server.uri(), "team-a").unwrap();
        let error = client.call("memory_get", json!({"id": 7})).await.unwrap_err();
        assert!(error.to_string().contains("Memory not found"));
        assert!(error.to_string().contains("-32001"));
    }

    #[tokio::test]
    async fn test_call_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = RpcClient::new(&server.uri(), "team-a").unwrap();
        let error = client.call("memory_stats", json!({})).await.unwrap_err();
        assert!(error.to_string().contains("502"));
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(RpcClient::new("not a url", "t").is_err());
    }
}
