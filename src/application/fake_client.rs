// In-memory ImageryClient for tests
use crate::application::imagery_client::{ImageryClient, ImageryError, QueryOutcome};
use crate::domain::raster_query::RasterQuery;
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = dyn Fn(&RasterQuery) -> Result<QueryOutcome, ImageryError> + Send + Sync;

/// Answers every query through `responder` and records what it was asked.
pub struct FakeImageryClient {
    responder: Box<Responder>,
    calls: Mutex<Vec<RasterQuery>>,
}

impl FakeImageryClient {
    pub fn new(
        responder: impl Fn(&RasterQuery) -> Result<QueryOutcome, ImageryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RasterQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageryClient for FakeImageryClient {
    async fn execute(&self, query: &RasterQuery) -> Result<QueryOutcome, ImageryError> {
        self.calls.lock().unwrap().push(query.clone());
        (self.responder)(query)
    }
}
