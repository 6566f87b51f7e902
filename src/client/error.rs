// This file is part of the terraform-provider-huaweicloud project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde_json::Value as Json;

/// Error returned by the REST client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API answered with an error status
    #[error("{method} {url} returned {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Http {
        status: u16,
        method: String,
        url: String,
        code: Option<String>,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unable to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unable to sign request: {0}")]
    Signing(String),
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    pub(crate) fn from_response(status: u16, method: &str, url: &str, body: &[u8]) -> Self {
        let (code, message) = match serde_json::from_slice::<Json>(body) {
            Ok(json) => extract_error(&json),
            Err(_) => (
                None,
                Some(String::from_utf8_lossy(body).trim().to_owned()).filter(|s| !s.is_empty()),
            ),
        };
        Self::Http {
            status,
            method: method.to_owned(),
            url: url.to_owned(),
            code,
            message,
        }
    }

    /// HTTP status of the error, if the API answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Vendor error code (`error_code`, `code`, ...)
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ApiError::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn has_status(&self, statuses: &[u16]) -> bool {
        self.status().is_some_and(|s| statuses.contains(&s))
    }
}

/// Find the error code and message in the many shapes the vendor uses
fn extract_error(json: &Json) -> (Option<String>, Option<String>) {
    let text = |json: &Json, keys: &[&str]| {
        keys.iter()
            .find_map(|key| json.get(*key))
            .and_then(|v| match v {
                Json::String(s) => Some(s.clone()),
                Json::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };
    let code_keys = ["error_code", "code", "type"];
    let message_keys = ["error_msg", "message", "error_description", "detail"];

    let code = text(json, &code_keys);
    let message = text(json, &message_keys);
    if code.is_some() || message.is_some() {
        return (code, message);
    }

    // Nested errors: {"error": {...}}, {"NeutronError": {...}}, ...
    if let Json::Object(map) = json {
        for nested in map.values().filter(|v| v.is_object()) {
            let code = text(nested, &code_keys);
            let message = text(nested, &message_keys);
            if code.is_some() || message.is_some() {
                return (code, message);
            }
        }
    }
    (None, None)
}
