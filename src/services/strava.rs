use crate::error::{NotifierError, Result};
use crate::models::{AccessToken, ActivityInfo, TokenResponse};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped when an id is placed in a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The two Strava calls an invocation makes.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// Exchange the stored authorization code for an access token
    async fn exchange_token(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<AccessToken>;

    /// Fetch the current state of an activity
    async fn get_activity(&self, activity_id: &str, token: &AccessToken) -> Result<ActivityInfo>;
}

pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
}

impl StravaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    fn activity_endpoint(&self, activity_id: &str) -> String {
        format!(
            "{}/api/v3/activities/{}",
            self.base_url,
            utf8_percent_encode(activity_id, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl ActivityApi for StravaClient {
    async fn exchange_token(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<AccessToken> {
        let response = self
            .http
            .post(self.token_endpoint())
            .query(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| NotifierError::Authentication(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Authentication(format!(
                "token endpoint answered {}",
                status
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            NotifierError::Authentication(format!("unreadable token response: {}", e))
        })?;

        Ok(AccessToken::new(body.access_token))
    }

    async fn get_activity(&self, activity_id: &str, token: &AccessToken) -> Result<ActivityInfo> {
        let response = self
            .http
            .get(self.activity_endpoint(activity_id))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| {
                NotifierError::Lookup(format!("activity {} request failed: {}", activity_id, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Lookup(format!(
                "activity {} answered {}",
                activity_id, status
            )));
        }

        response.json::<ActivityInfo>().await.map_err(|e| {
            NotifierError::Lookup(format!("unreadable activity {}: {}", activity_id, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let client = StravaClient::new("https://www.strava.com");
        assert_eq!(client.token_endpoint(), "https://www.strava.com/oauth/token");
        assert_eq!(
            client.activity_endpoint("123"),
            "https://www.strava.com/api/v3/activities/123"
        );
        assert_eq!(
            client.activity_endpoint(""),
            "https://www.strava.com/api/v3/activities/"
        );
    }

    #[test]
    fn test_activity_id_stays_in_one_segment() {
        let client = StravaClient::new("https://www.strava.com");
        assert_eq!(
            client.activity_endpoint("12/../x?y"),
            "https://www.strava.com/api/v3/activities/12%2F..%2Fx%3Fy"
        );
        assert_eq!(
            client.activity_endpoint("1 2#3"),
            "https://www.strava.com/api/v3/activities/1%202%233"
        );
    }
}
