use std::sync::Arc;

use _model::Address;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::lookup::{AddressSource, LookupError, LookupService};

pub const GET_ADDRESSES: &str = "/api/getAddresses";

/// Body of every `/api/getAddresses` answer.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    Ok { details: Vec<Address> },
    Error { errormessage: String },
}

impl From<&LookupError> for ApiResponse {
    fn from(e: &LookupError) -> Self {
        Self::Error {
            errormessage: e.to_string(),
        }
    }
}

pub fn router<S: AddressSource + 'static>(service: Arc<LookupService<S>>) -> Router {
    Router::new()
        .route(GET_ADDRESSES, get(get_addresses::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(service)
}

// a parameter given more than once counts as missing
fn single<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    let mut values = params.iter().filter(|(k, _)| k == key);
    match (values.next(), values.next()) {
        (Some((_, v)), None) => Some(v.as_str()),
        _ => None,
    }
}

async fn get_addresses<S: AddressSource>(
    State(service): State<Arc<LookupService<S>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<ApiResponse>) {
    let result = service
        .search(single(&params, "postcode"), single(&params, "streetnumber"))
        .await;

    match result {
        Ok(details) => (StatusCode::OK, Json(ApiResponse::Ok { details })),
        Err(e) => (
            StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_REQUEST),
            Json(ApiResponse::from(&e)),
        ),
    }
}
