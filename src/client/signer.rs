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

//! AK/SK request signing (`SDK-HMAC-SHA256`)
//!
//! The canonical request is built from the method, the path (every segment
//! escaped, always ending with `/`), the sorted query, the signed headers and
//! the hex-encoded SHA-256 of the body. The signature is the HMAC-SHA256 of
//! the string to sign, keyed with the secret key.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::{macros::format_description, OffsetDateTime};
use url::Url;

use super::ApiError;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "SDK-HMAC-SHA256";
pub const HEADER_DATE: &str = "X-Sdk-Date";

/// Format a timestamp the way `X-Sdk-Date` expects it
pub fn sdk_date(now: OffsetDateTime) -> Result<String, ApiError> {
    now.format(format_description!(
        "[year][month][day]T[hour][minute][second]Z"
    ))
    .map_err(|err| ApiError::Signing(err.to_string()))
}

#[derive(Clone)]
pub struct Signer {
    access_key: String,
    secret_key: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Compute the `Authorization` header of a request
    ///
    /// `headers` must contain every header to sign, including `Host` and `X-Sdk-Date`.
    pub fn authorization(
        &self,
        method: &str,
        url: &Url,
        headers: &BTreeMap<String, String>,
        body: &[u8],
    ) -> Result<String, ApiError> {
        let headers = lowercase(headers);
        let date = headers
            .get(&HEADER_DATE.to_ascii_lowercase())
            .ok_or_else(|| ApiError::Signing(format!("missing `{HEADER_DATE}` header")))?;
        let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
        let canonical = canonical_request(method, url, &headers, &signed_headers, body);
        let string_to_sign = format!("{ALGORITHM}\n{date}\n{}", hex_sha256(canonical.as_bytes()));

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|err| ApiError::Signing(err.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "{ALGORITHM} Access={}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key
        ))
    }
}

fn lowercase(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_owned()))
        .collect()
}

pub(crate) fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Build the canonical request
///
/// Headers are expected lower-cased: the map ordering gives the signing order.
pub(crate) fn canonical_request(
    method: &str,
    url: &Url,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    body: &[u8],
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();
    format!(
        "{method}\n{}\n{}\n{canonical_headers}\n{signed_headers}\n{}",
        canonical_uri(url),
        canonical_query(url),
        hex_sha256(body)
    )
}

fn canonical_uri(url: &Url) -> String {
    let mut uri = url
        .path()
        .split('/')
        .map(|segment| escape(&unescape(segment)))
        .collect::<Vec<_>>()
        .join("/");
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (escape(&k), escape(&v)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode everything but the RFC 3986 unreserved characters
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char)
            }
            _ => escaped.push_str(&format!("%{byte:02X}")),
        }
    }
    escaped
}

fn unescape(s: &str) -> String {
    url::form_urlencoded::parse(format!("x={}", s.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn headers(host: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Host".to_owned(), host.to_owned()),
            ("X-Sdk-Date".to_owned(), "20240102T030405Z".to_owned()),
        ])
    }

    #[test]
    fn date_format() {
        let date = sdk_date(datetime!(2024-01-02 03:04:05 UTC)).unwrap();
        assert_eq!(date, "20240102T030405Z");
    }

    #[test]
    fn canonical_request_layout() {
        let url = Url::parse("https://vpc.cn-north-4.example.com/v1/p1/vpcs?marker=b&limit=10")
            .unwrap();
        let headers = lowercase(&headers("vpc.cn-north-4.example.com"));
        let canonical = canonical_request("GET", &url, &headers, "host;x-sdk-date", b"");
        assert_eq!(
            canonical,
            format!(
                "GET\n/v1/p1/vpcs/\nlimit=10&marker=b\nhost:vpc.cn-north-4.example.com\nx-sdk-date:20240102T030405Z\n\nhost;x-sdk-date\n{EMPTY_SHA256}"
            )
        );
    }

    #[test]
    fn path_always_ends_with_slash() {
        let url = Url::parse("https://rds.example.com/").unwrap();
        assert_eq!(canonical_uri(&url), "/");
        let url = Url::parse("https://rds.example.com/v3/p/instances/").unwrap();
        assert_eq!(canonical_uri(&url), "/v3/p/instances/");
    }

    #[test]
    fn query_values_are_escaped() {
        let url = Url::parse("https://rds.example.com/v3?name=a%20b&id=x:y").unwrap();
        assert_eq!(canonical_query(&url), "id=x%3Ay&name=a%20b");
    }

    #[test]
    fn authorization_header() {
        let signer = Signer::new("AK", "SK");
        let url = Url::parse("https://vpc.example.com/v1/p/vpcs").unwrap();
        let headers = headers("vpc.example.com");
        let auth = signer
            .authorization("POST", &url, &headers, br#"{"vpc":{}}"#)
            .unwrap();
        assert!(auth.starts_with("SDK-HMAC-SHA256 Access=AK, SignedHeaders=host;x-sdk-date, Signature="));
        let signature = auth.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);

        // Same request, same signature; different secret, different signature
        let again = signer
            .authorization("POST", &url, &headers, br#"{"vpc":{}}"#)
            .unwrap();
        assert_eq!(auth, again);
        let other = Signer::new("AK", "other")
            .authorization("POST", &url, &headers, br#"{"vpc":{}}"#)
            .unwrap();
        assert_ne!(auth, other);
    }

    #[test]
    fn missing_date_is_an_error() {
        let signer = Signer::new("AK", "SK");
        let url = Url::parse("https://vpc.example.com/").unwrap();
        let headers = BTreeMap::from([("Host".to_owned(), "vpc.example.com".to_owned())]);
        assert!(signer.authorization("GET", &url, &headers, b"").is_err());
    }
}
