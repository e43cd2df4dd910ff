//! Posts the annotated features to the collection server.
//!
//! Points and polygons travel as two independent requests that are in flight
//! at the same time; the submission succeeds only if both do. Nothing is
//! retried.

use crate::geojson::{self, FeatureCollection};
use crate::layer::DrawLayer;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub const SUBMIT_PORT: u16 = 5000;
pub const SUBMIT_PATH: &str = "/upload-json";

pub fn endpoint_url(host: &str) -> String {
    format!("http://{host}:{SUBMIT_PORT}{SUBMIT_PATH}")
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("could not encode submission: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(String),
    #[error("{0}")]
    Transport(String),
    #[error("submission ended without a result")]
    Aborted,
}

pub type SubmitResult = Result<(), SubmitError>;

/// The two request bodies plus the combined collection that is saved to the
/// host store once both requests succeed.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionBatch {
    pub points: FeatureCollection,
    pub polygons: FeatureCollection,
    pub combined: FeatureCollection,
}

impl SubmissionBatch {
    pub fn from_layer(layer: &DrawLayer) -> Self {
        let (points, polygons) = layer.partition();
        Self {
            points: geojson::encode(points),
            polygons: geojson::encode(polygons),
            combined: geojson::encode(layer.iter()),
        }
    }

    /// `{"points": FeatureCollection}`
    pub fn points_body(&self) -> Result<Value, SubmitError> {
        wrap("points", &self.points)
    }

    /// `{"polygons": FeatureCollection}`
    pub fn polygons_body(&self) -> Result<Value, SubmitError> {
        wrap("polygons", &self.polygons)
    }
}

fn wrap(key: &str, collection: &FeatureCollection) -> Result<Value, SubmitError> {
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), serde_json::to_value(collection)?);
    Ok(Value::Object(body))
}

/// Something that can deliver one JSON body to a URL.
pub trait Transport: Send + Sync + 'static {
    fn post_json(&self, url: &str, body: &Value) -> impl Future<Output = SubmitResult> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> SubmitResult {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("POST {} -> {}", url, status);
            Ok(())
        } else {
            Err(SubmitError::Status(status.to_string()))
        }
    }
}

/// Sends both bodies concurrently and waits for both to finish. The first
/// failure (points before polygons) is reported; a failing request never
/// cuts the other one short.
pub async fn submit<T: Transport>(transport: &T, url: &str, batch: &SubmissionBatch) -> SubmitResult {
    let points = batch.points_body()?;
    let polygons = batch.polygons_body()?;

    info!(
        "Submitting {} point(s) and {} polygon(s) to {}",
        batch.points.len(),
        batch.polygons.len(),
        url
    );

    let (points_result, polygons_result) = tokio::join!(
        transport.post_json(url, &points),
        transport.post_json(url, &polygons)
    );

    match points_result.and(polygons_result) {
        Ok(()) => {
            info!("Submission accepted");
            Ok(())
        }
        Err(err) => {
            warn!("Submission failed: {}", err);
            Err(err)
        }
    }
}

/// Runs [`submit`] on the runtime; the outcome arrives on the returned
/// receiver.
pub fn spawn_submission<T: Transport>(
    transport: Arc<T>,
    url: String,
    batch: SubmissionBatch,
) -> oneshot::Receiver<SubmitResult> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = submit(transport.as_ref(), &url, &batch).await;
        if tx.send(result).is_err() {
            debug!("Submission result dropped: receiver gone");
        }
    });
    rx
}
