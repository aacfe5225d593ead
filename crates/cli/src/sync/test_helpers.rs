// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use km_core::protocol::ErrorBody;
use km_core::{DeleteResponse, FileStore, FilesPage, PushRequest, PushResponse, RemoteFile};
use km_core::{HealthResponse, ProjectStatus};

use super::client::{SyncClient, SyncConfig};
use super::retry::RetryPolicy;
use super::transport::{
    HttpRequest, HttpResponse, Method, Transport, TransportError, TransportResult,
};

type BoxedResponse<'a> = Pin<Box<dyn Future<Output = TransportResult<HttpResponse>> + Send + 'a>>;

/// Mock transport that replays scripted responses and records requests.
///
/// Clones share the same script and log, so a test can keep a handle after
/// moving the transport into a client.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<TransportResult<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body.
    pub fn queue_response(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    /// Queue a response with a JSON body.
    pub fn queue_json(&self, status: u16, body: serde_json::Value) {
        self.queue_response(status, &body.to_string());
    }

    /// Queue a transport failure.
    pub fn queue_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get all requests that were sent.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: HttpRequest) -> BoxedResponse<'_> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        Box::pin(async move {
            next.unwrap_or_else(|| {
                Err(TransportError::ConnectionFailed(
                    "no scripted response".to_string(),
                ))
            })
        })
    }
}

/// Transport that serves the sync protocol from an in-memory [`FileStore`],
/// so client tests run against real store semantics without a socket.
#[derive(Clone)]
pub struct StoreTransport {
    store: Arc<Mutex<FileStore>>,
    /// Drop `hasMore` from page responses, like servers that omit it.
    omit_has_more: bool,
}

impl StoreTransport {
    pub fn new(store: FileStore) -> Self {
        StoreTransport {
            store: Arc::new(Mutex::new(store)),
            omit_has_more: false,
        }
    }

    pub fn omitting_has_more(mut self) -> Self {
        self.omit_has_more = true;
        self
    }

    pub fn with_store<R>(&self, f: impl FnOnce(&mut FileStore) -> R) -> R {
        f(&mut self.store.lock().unwrap())
    }

    fn handle(&self, request: &HttpRequest) -> (u16, serde_json::Value) {
        let path = request
            .url
            .split_once("://")
            .and_then(|(_, rest)| rest.find('/').map(|i| &rest[i..]))
            .unwrap_or("/");
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut store = self.store.lock().unwrap();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["health"]) => ok(HealthResponse {
                status: "ok".to_string(),
                version: "test".to_string(),
            }),
            (Method::Post, ["v1", "projects", id, "sync"]) => {
                let body: PushRequest =
                    serde_json::from_value(request.body.clone().unwrap()).unwrap();
                match store.apply_batch(id, &body.files, &body.deletions) {
                    Ok(outcome) => ok(PushResponse {
                        synced: outcome.synced,
                        deleted: outcome.deleted,
                        conflicts: Vec::new(),
                    }),
                    Err(e) => error(400, &e.to_string()),
                }
            }
            (Method::Get, ["v1", "projects", id, "files"]) => {
                let since = query_param(query, "since").unwrap_or(0);
                let limit = query_param(query, "limit").unwrap_or(100) as usize;
                let mut records = store.files_since(id, since, limit + 1).unwrap();
                let has_more = records.len() > limit;
                records.truncate(limit);
                let page = FilesPage {
                    files: records.iter().map(RemoteFile::from).collect(),
                    has_more,
                };
                let mut value = serde_json::to_value(page).unwrap();
                if self.omit_has_more {
                    value.as_object_mut().unwrap().remove("hasMore");
                }
                (200, value)
            }
            (Method::Get, ["v1", "projects", id, "status"]) => {
                ok(ProjectStatus::from(store.get_project_stats(id).unwrap()))
            }
            (Method::Delete, ["v1", "projects", id]) => ok(DeleteResponse {
                deleted: store.delete_project(id).unwrap(),
            }),
            _ => error(404, "not found"),
        }
    }
}

fn ok(body: impl serde::Serialize) -> (u16, serde_json::Value) {
    (200, serde_json::to_value(body).unwrap())
}

fn error(status: u16, message: &str) -> (u16, serde_json::Value) {
    let body = ErrorBody {
        error: message.to_string(),
    };
    (status, serde_json::to_value(body).unwrap())
}

fn query_param(query: &str, name: &str) -> Option<i64> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse().ok())
}

impl Transport for StoreTransport {
    fn execute(&self, request: HttpRequest) -> BoxedResponse<'_> {
        let (status, body) = self.handle(&request);
        Box::pin(async move {
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            })
        })
    }
}

/// Config pointing at a fake server with fast retries.
pub fn test_config(api_key: Option<&str>) -> SyncConfig {
    SyncConfig {
        url: "http://sync.test".to_string(),
        api_key: api_key.map(String::from),
        timeout: Duration::from_secs(1),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryPolicy::default()
        },
    }
}

/// Client over a mock transport, returning a handle to inspect it.
pub fn mock_client(api_key: Option<&str>) -> (SyncClient<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let client = SyncClient::with_transport(test_config(api_key), transport.clone());
    (client, transport)
}
