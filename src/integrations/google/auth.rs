//! OAuth access token resolution

use serde::Deserialize;

use super::{check_response, GoogleError};
use crate::core::config::GoogleConfig;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone)]
struct RefreshGrant {
    refresh_token: String,
    client_id: String,
    client_secret: String,
}

/// Where an access token comes from: a configured token, or a refresh-token
/// exchange
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    access_token: Option<String>,
    refresh: Option<RefreshGrant>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleAuth {
    pub fn from_config(config: &GoogleConfig) -> Self {
        let refresh = match (&config.refresh_token, &config.client_id, &config.client_secret) {
            (Some(refresh_token), Some(client_id), Some(client_secret)) => Some(RefreshGrant {
                refresh_token: refresh_token.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => None,
        };
        Self {
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            refresh,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() || self.refresh.is_some()
    }

    /// Form body for the refresh-token grant
    fn refresh_body(grant: &RefreshGrant) -> String {
        [
            ("grant_type", "refresh_token"),
            ("refresh_token", grant.refresh_token.as_str()),
            ("client_id", grant.client_id.as_str()),
            ("client_secret", grant.client_secret.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
    }

    /// A bearer token, exchanging the refresh token if no access token is set
    pub fn access_token(&self, client: &reqwest::blocking::Client) -> Result<String, GoogleError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }
        let Some(grant) = &self.refresh else {
            return Err(GoogleError::NotConfigured(
                "set google.access_token, or google.refresh_token with client_id and client_secret"
                    .to_string(),
            ));
        };

        tracing::info!("exchanging refresh token for an access token");
        let resp = client
            .post(TOKEN_URL)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Self::refresh_body(grant))
            .send()?;
        let resp = check_response(resp).map_err(|e| GoogleError::Auth(e.to_string()))?;
        let token: TokenResponse = resp
            .json()
            .map_err(|e| GoogleError::Decode(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_token_used_directly() {
        let config = GoogleConfig {
            access_token: Some("ya29.token".into()),
            ..Default::default()
        };
        let auth = GoogleAuth::from_config(&config);
        assert!(auth.is_configured());
        let client = reqwest::blocking::Client::new();
        assert_eq!(auth.access_token(&client).unwrap(), "ya29.token");
    }

    #[test]
    fn test_unconfigured() {
        let auth = GoogleAuth::from_config(&GoogleConfig::default());
        assert!(!auth.is_configured());
        let client = reqwest::blocking::Client::new();
        assert!(matches!(
            auth.access_token(&client),
            Err(GoogleError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_refresh_body_is_form_encoded() {
        let grant = RefreshGrant {
            refresh_token: "1//a b".into(),
            client_id: "id".into(),
            client_secret: "s&t".into(),
        };
        assert_eq!(
            GoogleAuth::refresh_body(&grant),
            "grant_type=refresh_token&refresh_token=1%2F%2Fa%20b&client_id=id&client_secret=s%26t"
        );
    }
}
