//! Custom axum extractors for Quizdesk

use axum::{
    extract::{rejection::QueryRejection, FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::Error;

/// Query-string extractor that validates the deserialized value automatically.
///
/// Replaces `Query<T>` + manual `.validate()` calls in handlers.
/// Requires `T: DeserializeOwned + Validate`.
///
/// All input errors (deserialization + validation) return 400.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

/// Rejection type for `ValidatedQuery`:
/// - query-string deserialization errors → 400 (via `Error::Validation`)
/// - validation errors → 400 (via `Error::Validation`)
#[derive(Debug)]
pub enum ValidatedQueryRejection {
    Query(QueryRejection),
    Validation(Error),
}

impl IntoResponse for ValidatedQueryRejection {
    fn into_response(self) -> Response {
        match self {
            ValidatedQueryRejection::Query(e) => Error::Validation(e.body_text()).into_response(),
            ValidatedQueryRejection::Validation(e) => e.into_response(),
        }
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedQueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidatedQueryRejection::Query)?;
        value.validate().map_err(|e| {
            ValidatedQueryRejection::Validation(Error::Validation(format!(
                "Validation failed: {}",
                e
            )))
        })?;
        Ok(ValidatedQuery(value))
    }
}
