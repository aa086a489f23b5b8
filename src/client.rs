use std::sync::Arc;

use _model::Address;
use async_trait::async_trait;
use tokio::task::spawn_blocking;
use tracing::warn;
use ureq::Agent;

use crate::{
    api::{ApiResponse, GET_ADDRESSES},
    lookup::{AddressSource, LookupError, LookupService},
};

/// How the search flow reaches the address lookup endpoint.
#[async_trait]
pub trait AddressClient: Send + Sync {
    async fn get_addresses(
        &self,
        postcode: &str,
        streetnumber: &str,
    ) -> Result<Vec<Address>, LookupError>;
}

/// Talks to a lookup service in the same process.
pub struct LocalClient<S> {
    service: Arc<LookupService<S>>,
}

impl<S> LocalClient<S> {
    pub fn new(service: Arc<LookupService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: AddressSource + 'static> AddressClient for LocalClient<S> {
    async fn get_addresses(
        &self,
        postcode: &str,
        streetnumber: &str,
    ) -> Result<Vec<Address>, LookupError> {
        self.service
            .search(Some(postcode), Some(streetnumber))
            .await
    }
}

pub struct HttpClient {
    agent: Agent,
    base_url: String,
}

impl HttpClient {
    /// `base_url` is used as given; only a trailing slash is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: Agent::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{GET_ADDRESSES}", self.base_url)
    }
}

fn fetch(
    agent: &Agent,
    url: &str,
    postcode: &str,
    streetnumber: &str,
) -> Result<Vec<Address>, LookupError> {
    let (status, response) = match agent
        .get(url)
        .query("postcode", postcode)
        .query("streetnumber", streetnumber)
        .call()
    {
        Ok(response) => (response.status(), response),
        Err(ureq::Error::Status(status, response)) => (status, response),
        Err(e) => return Err(LookupError::Transport(e.to_string())),
    };

    let body: ApiResponse = response
        .into_json()
        .map_err(|e| LookupError::Transport(e.to_string()))?;

    match body {
        ApiResponse::Ok { details } => Ok(details),
        ApiResponse::Error { .. } if status == 404 => Err(LookupError::NotFound),
        ApiResponse::Error { errormessage } => Err(LookupError::Rejected {
            status,
            message: errormessage,
        }),
    }
}

#[async_trait]
impl AddressClient for HttpClient {
    async fn get_addresses(
        &self,
        postcode: &str,
        streetnumber: &str,
    ) -> Result<Vec<Address>, LookupError> {
        let agent = self.agent.clone();
        let url = self.endpoint();
        let (postcode, streetnumber) = (postcode.to_string(), streetnumber.to_string());

        spawn_blocking(move || fetch(&agent, &url, &postcode, &streetnumber))
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?
            .inspect_err(|e| {
                if let LookupError::Transport(_) = e {
                    warn!("lookup request failed: {e}");
                }
            })
    }
}
