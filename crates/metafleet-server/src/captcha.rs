use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use metafleet_auth::CaptchaVerifier;

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
}

/// Verifies captcha tokens against an external endpoint. Any transport or
/// decode error fails closed.
pub struct HttpCaptchaVerifier {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl HttpCaptchaVerifier {
    pub fn new(url: String, secret: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url,
            secret,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for HttpCaptchaVerifier {
    async fn verify(&self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };

        let mut form = vec![("response", token.to_string())];
        if let Some(secret) = &self.secret {
            form.push(("secret", secret.clone()));
        }

        match self.client.post(&self.url).form(&form).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<VerifyResponse>().await {
                    Ok(body) => body.success,
                    Err(err) => {
                        warn!(%err, "captcha endpoint returned an unreadable body");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "captcha endpoint rejected the request");
                false
            }
            Err(err) => {
                warn!(%err, "captcha endpoint unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_token_fails_without_a_network_call() {
        let verifier =
            HttpCaptchaVerifier::new("http://localhost:1/verify".to_string(), None).unwrap();

        assert!(!verifier.verify(None).await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_closed() {
        // Port 1 is never listening locally.
        let verifier =
            HttpCaptchaVerifier::new("http://127.0.0.1:1/verify".to_string(), None).unwrap();

        assert!(!verifier.verify(Some("token")).await);
    }
}
