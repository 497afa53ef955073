//! Shared test fixtures: a scripted HTTP client and engine assembly.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use convoy_api::{ApiError, ApiRequest, ApiResponse, HttpApi};
use convoy_cluster::memory::{RecordingKubernetes, RecordingTransport};
use convoy_config::AdapterConfig;
use convoy_engine::Engine;

/// Plays back a scripted list of responses and records every request.
/// Once the script is exhausted it answers `200 {}`.
pub struct ScriptedApi {
    pub requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<Vec<Result<ApiResponse, ApiError>>>,
}

impl ScriptedApi {
    pub fn new(responses: Vec<Result<ApiResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        })
    }

    pub fn ok(status: u16, body: &str) -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse {
            status,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn refused(url: &str) -> Result<ApiResponse, ApiError> {
        Err(ApiError::Transport {
            method: "GET".into(),
            url: url.into(),
            message: "connection refused".into(),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpApi for ScriptedApi {
    async fn execute(&self, request: ApiRequest) -> convoy_api::Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ApiResponse {
                status: 200,
                body: b"{}".to_vec(),
            });
        }
        responses.remove(0)
    }
}

/// Everything a scenario needs to run and assert against.
pub struct Harness {
    pub engine: Engine,
    pub api: Arc<ScriptedApi>,
    pub kubernetes: Arc<RecordingKubernetes>,
    pub transport: Arc<RecordingTransport>,
}

pub fn harness(config: AdapterConfig, api: Arc<ScriptedApi>) -> Harness {
    let kubernetes = Arc::new(RecordingKubernetes::new());
    let transport = Arc::new(RecordingTransport::new("consumer-1"));

    let engine = Engine::builder()
        .config(config)
        .api(api.clone())
        .kubernetes(kubernetes.clone())
        .work_transport(transport.clone())
        .build()
        .expect("engine builds");

    Harness {
        engine,
        api,
        kubernetes,
        transport,
    }
}
