// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The remote translation capability.
//!
//! A [`Backend`] turns a [`CompletionRequest`] into a [`Completion`].
//! Failures are values, not errors: the caller decides how to
//! recover from them.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

/// Default chat-completion endpoint.
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// A single request sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    /// The source text being translated.
    pub source: &'a str,
    /// The full instruction sent to the model.
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Result of a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The backend answered with this text.
    Success(String),
    /// The backend asked us to slow down.
    RateLimited,
    /// Any other failure, with a message suitable for logging.
    Failed(String),
}

pub trait Backend {
    fn complete(&self, request: &CompletionRequest) -> Completion;
}

impl<F> Backend for F
where
    F: Fn(&CompletionRequest) -> Completion,
{
    fn complete(&self, request: &CompletionRequest) -> Completion {
        self(request)
    }
}

/// Backend talking to an OpenAI-compatible chat-completion API.
pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiBackend {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        OpenAiBackend {
            client: Client::new(),
            endpoint: String::from(endpoint),
            api_key: String::from(api_key),
            model: String::from(model),
        }
    }
}

impl Backend for OpenAiBackend {
    fn complete(&self, request: &CompletionRequest) -> Completion {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
        {
            Ok(response) => response,
            Err(err) => return Completion::Failed(err.to_string()),
        };

        let status = response.status();
        // Read the body as text first so error details are not lost
        // when it is not the JSON we expect.
        let text = match response.text() {
            Ok(text) => text,
            Err(err) => return Completion::Failed(err.to_string()),
        };
        parse_response(status, &text)
    }
}

/// Interpret the HTTP status and body returned by the API.
fn parse_response(status: StatusCode, body: &str) -> Completion {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Completion::RateLimited;
    }
    if !status.is_success() {
        return Completion::Failed(error_message(status, body));
    }

    match serde_json::from_str::<ChatResponse>(body) {
        Ok(response) => match response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        {
            Some(content) => Completion::Success(content),
            None => Completion::Failed(String::from(
                "Invalid response: missing choices[0].message.content",
            )),
        },
        Err(err) => Completion::Failed(format!("Invalid JSON in response: {err}")),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => format!("HTTP {status}: {}", response.error.message),
        Err(_) => format!("HTTP {status}: {}", body.trim()),
    }
}
