use crate::error::{ServiceFailure, SweepError};
use crate::grid::Combination;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// One generation call: the prompt plus the sampling parameters to use
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub combination: Combination,
}

/// What the service returned for a successful call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReply {
    pub text: String,
    pub tokens_used: u32,
}

/// A text generation backend
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationReply, ServiceFailure>;
}

/// OpenAI-compatible chat completions endpoint
pub struct OpenAiService {
    http: reqwest::Client,
    api_endpoint: String,
    api_key: SecretString,
}

impl OpenAiService {
    pub fn new(api_endpoint: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_endpoint: api_endpoint.into(),
            api_key,
        }
    }

    /// Read the API key from the named environment variable once, up front
    pub fn from_env(api_endpoint: impl Into<String>, env_var_api_key: &str) -> Result<Self, SweepError> {
        match std::env::var(env_var_api_key) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(api_endpoint, SecretString::new(key))),
            _ => Err(SweepError::MissingCredential {
                var: env_var_api_key.to_string(),
            }),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_endpoint.trim_end_matches('/'))
    }

    fn authorization(&self) -> Result<HeaderValue, ServiceFailure> {
        HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|e| ServiceFailure::InvalidCredential(e.to_string()))
    }

    /// Build the chat completion request body
    fn build_request(&self, request: &GenerationRequest<'_>) -> Result<CreateChatCompletionRequest, ServiceFailure> {
        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.to_string())
            .build()
            .map_err(|e| ServiceFailure::InvalidRequest(e.to_string()))?
            .into();

        let combination = request.combination;
        CreateChatCompletionRequestArgs::default()
            .model(request.model)
            .messages([user_message])
            .temperature(combination.temperature as f32)
            .top_p(combination.top_p as f32)
            // grid expansion bounds max_tokens to 4096
            .max_tokens(combination.max_tokens as u16)
            .build()
            .map_err(|e| ServiceFailure::InvalidRequest(e.to_string()))
    }

    /// Extract the reply from the API response
    fn extract_reply(&self, response: CreateChatCompletionResponse) -> GenerationReply {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let tokens_used = response.usage.map(|usage| usage.total_tokens).unwrap_or(0);

        GenerationReply { text, tokens_used }
    }
}

#[async_trait]
impl GenerationService for OpenAiService {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationReply, ServiceFailure> {
        let body = self.build_request(request)?;
        let authorization = self.authorization()?;

        let response = self
            .http
            .post(self.completions_url())
            .header(AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content = response.text().await.map_err(transport_failure)?;
        let parsed: CreateChatCompletionResponse = serde_json::from_str(&content)
            .map_err(|e| ServiceFailure::MalformedResponse(e.to_string()))?;

        Ok(self.extract_reply(parsed))
    }
}

/// Classify a reqwest error by what went wrong rather than by its message
fn transport_failure(error: reqwest::Error) -> ServiceFailure {
    if error.is_builder() || error.is_redirect() {
        ServiceFailure::InvalidRequest(error.to_string())
    } else if error.is_decode() {
        ServiceFailure::MalformedResponse(error.to_string())
    } else {
        ServiceFailure::Network(error.to_string())
    }
}
