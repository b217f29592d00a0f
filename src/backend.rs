//! Seams to the hosted backend. The session, trip fetches and object
//! storage are injected so the pipeline runs without a live service.

use std::future::Future;

use crate::error::TripGeoError;
use crate::trip::TripRecord;

/// The signed-in user the map is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Per-user trip summaries (id, title, lat/long, trip path).
pub trait TripSource {
    fn fetch_user_trips(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<TripRecord>, TripGeoError>>;
}

/// Object storage bucket. Failures are reported as
/// [`TripGeoError::Storage`].
pub trait ObjectStore {
    fn upload(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<(), TripGeoError>>;

    fn public_url(&self, key: &str) -> String;
}
