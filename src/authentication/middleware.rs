use std::sync::Arc;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, SessionData};

#[derive(Debug)]
pub struct Unauthorized;

impl reject::Reject for Unauthorized {}

pub fn with_session(
    secret: Arc<String>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::<String>(SESSION_COOKIE).and_then(move |session: String| {
        let secret = secret.clone();
        async move {
            match verify_jwt_session(&session, &secret) {
                Ok(data) => Ok(SessionData::from(data)),
                Err(_) => {
                    log::warn!("rejected request with invalid session token");
                    Err(warp::reject::custom(Unauthorized))
                }
            }
        }
    })
}
