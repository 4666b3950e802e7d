use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::conversation::ChatRequest;
use crate::error::GatewayError;
use crate::gateway::{ChatGateway, ChatReply};
use crate::state::{Role, Source};

const SYSTEM_INSTRUCTION: &str = "You are CRG, an expert crypto regulatory compliance analyst. \
Answer questions about cryptocurrency regulation, anti-money-laundering (AML) and KYC obligations, \
licensing, taxation and cross-border compliance. Cite the relevant regulators and frameworks \
(for example MiCA, SEC, FATF, IOSCO) and use Google Search to ground answers in current rules. \
Be precise, structured and concise, use markdown, and remind the user that this is not legal advice \
when the stakes are high.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: serde_json::Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

fn text_content(role: Role, text: &str) -> GeminiContent {
    GeminiContent {
        role: Some(role.as_str().to_string()),
        parts: vec![GeminiPart {
            text: Some(text.to_string()),
        }],
    }
}

fn system_instruction(jurisdiction: Option<&str>) -> String {
    match jurisdiction {
        Some(country) => format!(
            "{SYSTEM_INSTRUCTION}\n\nThe user is asking specifically about {country}. \
Focus on the laws, regulators, licensing regimes and tax treatment that apply in {country}, \
and say so explicitly when a rule is set at a supranational level instead."
        ),
        None => SYSTEM_INSTRUCTION.to_string(),
    }
}

fn build_request(request: &ChatRequest) -> GeminiRequest {
    let mut contents: Vec<GeminiContent> = request
        .history
        .iter()
        .filter(|turn| !turn.text.is_empty())
        .map(|turn| text_content(turn.role, &turn.text))
        .collect();
    contents.push(text_content(Role::User, &request.message));

    GeminiRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(system_instruction(request.jurisdiction.as_deref())),
            }],
        },
        contents,
        tools: vec![GeminiTool {
            google_search: serde_json::json!({}),
        }],
    }
}

fn into_reply(response: GeminiResponse) -> Result<ChatReply, GatewayError> {
    let candidate = response.candidates.into_iter().next().ok_or(GatewayError::Empty)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GatewayError::Empty);
    }

    let mut seen = HashSet::new();
    let sources = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .filter_map(|web| {
            let uri = web.uri.filter(|u| !u.is_empty())?;
            let title = web.title.filter(|t| !t.is_empty()).unwrap_or_else(|| uri.clone());
            Some(Source { title, uri })
        })
        .filter(|source| seen.insert(source.uri.clone()))
        .collect();

    Ok(ChatReply { text, sources })
}

/// Chat gateway backed by the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ChatGateway for GeminiClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&build_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, text));
        }

        let body = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body)?;
        let reply = into_reply(gemini_response)?;
        tracing::debug!(model = %self.model, sources = reply.sources.len(), "gemini reply received");
        Ok(reply)
    }
}
