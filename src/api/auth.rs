//! Acting-user extractor.
//!
//! Authentication happens upstream; the authenticating proxy forwards the user id in
//! the [`USER_ID_HEADER`] header. The extractor loads that user and turns it into the
//! [`Actor`] every core operation takes.

use crate::{
    api::AppState,
    core::{access::Actor, user::authenticate},
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

/// Header carrying the id of the authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

impl FromRequestParts<AppState> for Actor {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(actor) = parts.extensions.get::<Self>() {
            return Ok(*actor);
        }

        let Some(user_id) = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
        else {
            warn!(uri = %parts.uri, "Request without a valid acting user");
            return Err(Error::Unauthenticated);
        };

        let user = authenticate(&state.database, user_id).await.inspect_err(|e| {
            warn!(user_id, uri = %parts.uri, error = %e, "Authentication refused");
        })?;
        let actor = Self::from(&user);
        parts.extensions.insert(actor);
        Ok(actor)
    }
}
