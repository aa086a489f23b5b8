use std::time::Duration;

use _model::{Address, AddressPatch, RawAddressRecord};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::validation::{validate, AddressQuery, ValidationError};

mod registry;

pub use registry::MockRegistry;

/// Lookups never answer faster than this, however quick the source is.
pub const MIN_LATENCY: Duration = Duration::from_millis(500);

pub trait AddressSource: Send + Sync {
    fn find(&self, postcode: &str, house_number: &str) -> Vec<RawAddressRecord>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    NotFound,
    Found(Vec<RawAddressRecord>),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    // DO NOT MODIFY MSG - clients match on it
    #[error("No results found!")]
    NotFound,
    /// An error body some remote lookup endpoint answered with.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
}

impl LookupError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Invalid(e) => e.status(),
            Self::NotFound => 404,
            Self::Rejected { status, .. } => *status,
            Self::Transport(_) => 502,
        }
    }
}

pub struct LookupService<S> {
    source: S,
    latency: Duration,
}

impl<S: AddressSource> LookupService<S> {
    pub fn new(source: S) -> Self {
        Self::with_latency(source, MIN_LATENCY)
    }

    pub fn with_latency(source: S, latency: Duration) -> Self {
        Self {
            source,
            latency: latency.max(MIN_LATENCY),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub async fn lookup(&self, query: &AddressQuery) -> LookupOutcome {
        let records = self.source.find(&query.postcode, &query.streetnumber);
        sleep(self.latency).await;

        if records.is_empty() {
            LookupOutcome::NotFound
        } else {
            LookupOutcome::Found(records)
        }
    }

    /// Validate, look up and transform in one go, the way the HTTP endpoint answers.
    pub async fn search(
        &self,
        postcode: Option<&str>,
        streetnumber: Option<&str>,
    ) -> Result<Vec<Address>, LookupError> {
        let query = validate(postcode, streetnumber).inspect_err(|e| {
            debug!(?postcode, ?streetnumber, "rejected lookup: {e}");
        })?;

        match self.lookup(&query).await {
            LookupOutcome::NotFound => {
                info!(postcode = %query.postcode, streetnumber = %query.streetnumber, "no results");
                Err(LookupError::NotFound)
            }
            LookupOutcome::Found(records) => {
                info!(
                    postcode = %query.postcode,
                    streetnumber = %query.streetnumber,
                    "found {} addresses",
                    records.len()
                );
                Ok(records
                    .iter()
                    .map(|x| Address::from_raw(x, AddressPatch::search_result()))
                    .collect())
            }
        }
    }
}
