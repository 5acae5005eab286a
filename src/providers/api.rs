use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

const SECRET_PARAMS: &[&str] = &["key", "token", "access_token"];

/// Authenticated JSON client bound to one API root.
///
/// Every call merges the client-level parameters (API key, token) with the
/// call's own and fails with [`Error::Api`] on a status outside `200..300`.
/// No retries, no timeout beyond the transport default.
pub struct ApiClient {
    name: &'static str,
    root: String,
    http: reqwest::Client,
    base_params: Vec<(String, String)>,
    default_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(name: &'static str, root: impl Into<String>) -> Self {
        let mut root = root.into();
        if !root.ends_with('/') {
            root.push('/');
        }
        Self {
            name,
            root,
            http: reqwest::Client::new(),
            base_params: Vec::new(),
            default_headers: HeaderMap::new(),
        }
    }

    pub fn set_base_param(&mut self, key: &str, value: &str) {
        self.base_params.retain(|(k, _)| k != key);
        self.base_params.push((key.to_string(), value.to_string()));
    }

    pub fn set_default_header(&mut self, name: HeaderName, value: &str) -> Result<()> {
        self.default_headers.insert(name, header_value(value)?);
        Ok(())
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.root, path.trim_start_matches('/'))
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut query: Vec<(String, String)> = self.base_params.clone();
        query.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        log::debug!("{} {} {}", self.name, method, path);
        let mut request = self
            .http
            .request(method.clone(), self.url_for(path))
            .headers(self.default_headers.clone())
            .headers(headers)
            .query(&query);
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|source| Error::Transport {
            client: self.name.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                client: self.name.to_string(),
                method: method.to_string(),
                path: path.to_string(),
                params: redact(query),
                body: body.map(Value::to_string).unwrap_or_default(),
                status,
            });
        }

        let text = response.text().await.map_err(|source| Error::Transport {
            client: self.name.to_string(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn request_as<T>(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.request(method, path, headers, params, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_as(Method::GET, path, HeaderMap::new(), &[], None)
            .await
    }
}

pub fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| Error::InvalidHeader(err.to_string()))
}

fn redact(params: Vec<(String, String)>) -> Vec<(String, String)> {
    params
        .into_iter()
        .map(|(k, v)| {
            if SECRET_PARAMS.contains(&k.as_str()) {
                (k, "***".to_string())
            } else {
                (k, v)
            }
        })
        .collect()
}
