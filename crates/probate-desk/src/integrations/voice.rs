use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::VoiceConfig;

#[derive(Debug, thiserror::Error)]
pub enum VoiceCallError {
    #[error("voice vendor is not configured: {0} missing")]
    NotConfigured(&'static str),
    #[error("voice vendor did not respond within {0:?}")]
    Timeout(Duration),
    #[error("voice vendor request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("voice vendor returned {status}")]
    Status { status: StatusCode, body: String },
    #[error("voice vendor response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Outbound call request. `metadata` is echoed back on every webhook for this call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhoneCallRequest {
    pub to_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(
        rename = "retell_llm_dynamic_variables",
        skip_serializing_if = "Option::is_none"
    )]
    pub dynamic_variables: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PhoneCall {
    pub call_id: String,
    #[serde(default)]
    pub call_status: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Serialize)]
struct CreatePhoneCallBody<'a> {
    from_number: &'a str,
    to_number: &'a str,
    override_agent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retell_llm_dynamic_variables: Option<&'a Value>,
}

/// Thin client for the voice vendor's REST API.
#[derive(Clone)]
pub struct RetellClient {
    http: Client,
    base_url: String,
    api_key: String,
    agent_id: String,
    from_number: String,
    timeout: Duration,
}

impl RetellClient {
    pub fn from_config(config: &VoiceConfig) -> Result<Self, VoiceCallError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(VoiceCallError::NotConfigured("RETELL_API_KEY"))?;
        let agent_id = config
            .agent_id
            .clone()
            .ok_or(VoiceCallError::NotConfigured("RETELL_AGENT_ID"))?;
        let from_number = config
            .from_number
            .clone()
            .ok_or(VoiceCallError::NotConfigured("RETELL_FROM_NUMBER"))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VoiceCallError::Transport)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            agent_id,
            from_number,
            timeout: config.timeout,
        })
    }

    /// Starts an outbound intake call. Never retried here; the caller decides.
    pub async fn create_phone_call(
        &self,
        request: &PhoneCallRequest,
    ) -> Result<PhoneCall, VoiceCallError> {
        let body = CreatePhoneCallBody {
            from_number: &self.from_number,
            to_number: &request.to_number,
            override_agent_id: &self.agent_id,
            metadata: request.metadata.as_ref(),
            retell_llm_dynamic_variables: request.dynamic_variables.as_ref(),
        };

        let response = self
            .http
            .post(format!("{}/v2/create-phone-call", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "voice vendor rejected call request");
            return Err(VoiceCallError::Status { status, body });
        }

        let call: PhoneCall = response.json().await.map_err(|err| {
            if err.is_timeout() {
                VoiceCallError::Timeout(self.timeout)
            } else {
                VoiceCallError::Decode(err)
            }
        })?;
        info!(call_id = %call.call_id, "outbound intake call created");
        Ok(call)
    }

    fn classify(&self, err: reqwest::Error) -> VoiceCallError {
        if err.is_timeout() {
            VoiceCallError::Timeout(self.timeout)
        } else {
            VoiceCallError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str, timeout: Duration) -> VoiceConfig {
        VoiceConfig {
            api_key: Some("key_test".to_string()),
            base_url: base_url.to_string(),
            timeout,
            agent_id: Some("agent_intake".to_string()),
            from_number: Some("+16045550100".to_string()),
        }
    }

    fn request() -> PhoneCallRequest {
        PhoneCallRequest {
            to_number: "+12505550199".to_string(),
            metadata: Some(json!({ "matter_id": "m-100" })),
            dynamic_variables: None,
        }
    }

    #[test]
    fn missing_credentials_are_reported() {
        let mut incomplete = config("http://localhost", Duration::from_secs(8));
        incomplete.agent_id = None;
        assert!(matches!(
            RetellClient::from_config(&incomplete),
            Err(VoiceCallError::NotConfigured("RETELL_AGENT_ID"))
        ));
    }

    #[tokio::test]
    async fn creates_call_with_agent_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/create-phone-call"))
            .and(header_is("authorization", "Bearer key_test"))
            .and(body_partial_json(json!({
                "override_agent_id": "agent_intake",
                "to_number": "+12505550199",
                "metadata": { "matter_id": "m-100" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "call_id": "call_abc",
                "call_status": "registered"
            })))
            .mount(&server)
            .await;

        let client = RetellClient::from_config(&config(&server.uri(), Duration::from_secs(8)))
            .expect("client builds");
        let call = client.create_phone_call(&request()).await.expect("call created");
        assert_eq!(call.call_id, "call_abc");
        assert_eq!(call.call_status.as_deref(), Some("registered"));
    }

    #[tokio::test]
    async fn vendor_errors_carry_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient balance"))
            .mount(&server)
            .await;

        let client = RetellClient::from_config(&config(&server.uri(), Duration::from_secs(8)))
            .expect("client builds");
        match client.create_phone_call(&request()).await {
            Err(VoiceCallError::Status { status, body }) => {
                assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
                assert_eq!(body, "insufficient balance");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_vendor_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "call_id": "late" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = RetellClient::from_config(&config(&server.uri(), Duration::from_millis(50)))
            .expect("client builds");
        assert!(matches!(
            client.create_phone_call(&request()).await,
            Err(VoiceCallError::Timeout(_))
        ));
    }
}
