use chrono::{DateTime, Duration, TimeDelta, TimeZone, Utc};
use reqwest::{header, header::HeaderValue, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::trace;

use super::models::ClientError;
use super::{Auth, Error, Result};

// -------------------------------------------------------------------------------------------------
// Client
// -------------------------------------------------------------------------------------------------
/// A small REST client shared by the HTTP-based commit-time providers.
pub struct Client {
    pub(super) inner: reqwest::Client,
    pub(super) auth: Auth,
    pub(super) accept: &'static str,
}

impl Client {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self.auth, Auth::Unauthenticated)
    }

    /// Fetch `url` and decode its JSON body.
    ///
    /// A 404 response is not an error: it yields `Ok(None)`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        match self.get_url(url).await? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    async fn get_url(&self, url: Url) -> Result<Option<reqwest::Response>> {
        trace!("GET {url}");

        // build request, handling authentication if any
        let request_builder = self.inner.get(url).header(header::ACCEPT, self.accept);
        let request_builder = match &self.auth {
            Auth::Unauthenticated => request_builder,
            Auth::Bearer(token) => request_builder.bearer_auth(token.expose_secret()),
            Auth::PrivateToken(token) => {
                request_builder.header("PRIVATE-TOKEN", token.expose_secret())
            }
            Auth::Token(token) => request_builder
                .header(header::AUTHORIZATION, format!("token {}", token.expose_secret())),
            Auth::Basic { username, password } => {
                request_builder.basic_auth(username, Some(password.expose_secret()))
            }
        };

        // send request and wait for response
        let response = request_builder.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Check for rate limiting.
        //
        // GitHub signals it with 403 and `x-ratelimit-remaining: 0` or a `Retry-After` header;
        // GitLab, Bitbucket and Gitea use 429.
        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(retry_after) = response.headers().get(header::RETRY_AFTER) {
                let wait =
                    atoi::atoi::<i64>(retry_after.as_bytes()).and_then(TimeDelta::try_seconds);
                let client_error = client_error_from(response).await;
                return Err(Error::RateLimited { client_error, wait });
            }

            let exhausted = matches!(
                response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .map(HeaderValue::as_bytes),
                Some(b"0")
            );
            if exhausted || status == StatusCode::TOO_MANY_REQUESTS {
                let wait = || -> Option<Duration> {
                    let date = response.headers().get(header::DATE)?.to_str().ok()?;
                    let date = DateTime::parse_from_rfc2822(date).ok()?.with_timezone(&Utc);

                    let reset_time = response
                        .headers()
                        .get("x-ratelimit-reset")?
                        .to_str()
                        .ok()?
                        .parse::<i64>()
                        .ok()?;
                    let reset_time = Utc.timestamp_opt(reset_time, 0).single()?;

                    Some(reset_time - date)
                }();

                let client_error = client_error_from(response).await;
                return Err(Error::RateLimited { client_error, wait });
            }
        }

        let response = response.error_for_status()?;
        Ok(Some(response))
    }
}

async fn client_error_from(response: reqwest::Response) -> ClientError {
    let status = response.status();
    response.json().await.unwrap_or_else(|_| ClientError {
        message: format!("HTTP {status}"),
        documentation_url: None,
    })
}
