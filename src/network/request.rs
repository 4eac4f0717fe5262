// SPDX-License-Identifier: GPL-3.0-only
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Put => f.write_str("PUT"),
        }
    }
}

/// A backend request: method, path relative to the API base URL, and an
/// optional `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub method: HttpMethod,
    pub path: String,
    pub form_body: Option<String>,
}

impl NetworkRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            form_body: None,
        }
    }

    pub fn put_form(path: impl Into<String>, body: String) -> Self {
        Self {
            method: HttpMethod::Put,
            path: path.into(),
            form_body: Some(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let get = NetworkRequest::get("api/v1/collections");
        assert_eq!(get.method, HttpMethod::Get);
        assert_eq!(get.form_body, None);

        let put = NetworkRequest::put_form("api/v1/orders/1", "nfts=a".to_string());
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(put.path, "api/v1/orders/1");
        assert_eq!(put.form_body.as_deref(), Some("nfts=a"));
        assert_eq!(put.method.to_string(), "PUT");
    }
}
