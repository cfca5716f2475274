//! In-memory `Transport` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{status_error, GraphError, HttpBody, Transport, ACCEPT_JSON};

#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, Result<HttpBody, GraphError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(
            url.into(),
            Ok(HttpBody {
                content_type: Some(ACCEPT_JSON.into()),
                text: body.into(),
            }),
        );
        self
    }

    pub fn text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(
            url.into(),
            Ok(HttpBody {
                content_type: Some("text/csv".into()),
                text: body.into(),
            }),
        );
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16, body: &str) -> Self {
        self.routes
            .insert(url.into(), Err(status_error(status, body)));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, _accept: &str) -> Result<HttpBody, GraphError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        self.routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(status_error(404, "")))
    }
}

/// Graph-shaped error body.
pub fn graph_error(code: &str, message: &str) -> String {
    serde_json::json!({ "error": { "code": code, "message": message } }).to_string()
}
