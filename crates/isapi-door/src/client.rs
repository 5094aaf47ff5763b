//! Async HTTP client for ISAPI endpoints.
//!
//! Wraps reqwest with per-request digest authentication. Every call is
//! independent: no auth state and no idle connections survive between
//! requests.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ClientConfig;
use crate::digest::{generate_cnonce, DigestChallenge};
use crate::types::{ConnectionTarget, Credentials, IsapiResponse, IsapiResult, Method};

const USER_AGENT: &str = concat!("isapi-door/", env!("CARGO_PKG_VERSION"));

/// Client bound to a single device.
#[derive(Clone)]
pub struct IsapiClient {
    http: reqwest::Client,
    target: ConnectionTarget,
    credentials: Credentials,
}

impl IsapiClient {
    pub fn new(
        target: ConnectionTarget,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> IsapiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            target,
            credentials,
        })
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// GET an ISAPI path.
    pub async fn get(&self, path: &str) -> IsapiResult<IsapiResponse> {
        self.send(Method::Get, path, None).await
    }

    /// POST an XML document to an ISAPI path.
    pub async fn post_xml(&self, path: &str, body: &str) -> IsapiResult<IsapiResponse> {
        self.send(Method::Post, path, Some(body)).await
    }

    /// Send a request, answering one digest challenge if the device asks.
    ///
    /// A 401 without a digest challenge is returned as-is.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> IsapiResult<IsapiResponse> {
        let url = self.target.url(path)?;
        let uri = match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_string(),
        };

        debug!(method = method.as_str(), %url, "sending ISAPI request");
        let first = self.build(method, url.clone(), body, None).send().await?;
        if first.status() != StatusCode::UNAUTHORIZED {
            return Self::into_response(first).await;
        }

        let challenge = first
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| {
                v.trim_start()
                    .get(..6)
                    .is_some_and(|s| s.eq_ignore_ascii_case("digest"))
            })
            .map(str::to_string);

        let Some(raw) = challenge else {
            debug!(%url, "401 without digest challenge");
            return Self::into_response(first).await;
        };

        let challenge = DigestChallenge::parse(&raw)?;
        let authorization = challenge.authorization(
            &self.credentials,
            method.as_str(),
            &uri,
            &generate_cnonce(),
        );

        debug!(%url, realm = %challenge.realm, algorithm = challenge.algorithm.as_str(), "answering digest challenge");
        let second = self
            .build(method, url, body, Some(authorization))
            .send()
            .await?;
        Self::into_response(second).await
    }

    fn build(
        &self,
        method: Method,
        url: url::Url,
        body: Option<&str>,
        authorization: Option<String>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method.into(), url);
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/xml")
                .body(body.to_string());
        }
        if let Some(auth) = authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder
    }

    async fn into_response(r: reqwest::Response) -> IsapiResult<IsapiResponse> {
        let status = r.status().as_u16();
        let url = r.url().to_string();
        let body = r.text().await.unwrap_or_default();
        debug!(%url, status, bytes = body.len(), "ISAPI response");
        Ok(IsapiResponse { url, status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scheme;

    #[test]
    fn test_client_creation() {
        let target = ConnectionTarget::new("192.0.2.1", 80, Scheme::Http);
        let client = IsapiClient::new(
            target.clone(),
            Credentials::new("admin", "pw"),
            &ClientConfig::default(),
        )
        .unwrap();
        assert_eq!(client.target(), &target);
    }

    #[test]
    fn test_insecure_client_creation() {
        let target = ConnectionTarget::new("192.0.2.1", 443, Scheme::Https);
        let config = ClientConfig::resolve(Some(2), true);
        assert!(IsapiClient::new(target, Credentials::new("a", "b"), &config).is_ok());
    }
}
