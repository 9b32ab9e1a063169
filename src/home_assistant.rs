//! Home Assistant light service calls.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::error::LightError;
use crate::light::LightClient;

#[derive(Debug, Serialize)]
struct TurnOn<'a> {
    entity_id: &'a str,
    rgb_color: [u8; 3],
    brightness: u8,
}

#[derive(Debug, Serialize)]
struct TurnOff<'a> {
    entity_id: &'a str,
}

/// Upper bound on one service call, so a stalled server cannot hold up the
/// light worker.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

pub struct HomeAssistantClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    entity_id: String,
}

impl HomeAssistantClient {
    pub fn new(config: &Config) -> Result<Self, LightError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &Config, timeout: Duration) -> Result<Self, LightError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.home_assistant_url.clone(),
            token: config.token.clone(),
            entity_id: config.light_entity_id.clone(),
        })
    }

    fn service_url(&self, service: &str) -> String {
        format!("{}/api/services/light/{}", self.base_url, service)
    }

    async fn call<T: Serialize>(&self, service: &str, body: &T) -> Result<(), LightError> {
        let response = self
            .http
            .post(self.service_url(service))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(LightError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl LightClient for HomeAssistantClient {
    fn set_color(
        &self,
        rgb: [u8; 3],
        brightness: u8,
    ) -> impl Future<Output = Result<(), LightError>> + Send {
        async move {
            let body = TurnOn {
                entity_id: &self.entity_id,
                rgb_color: rgb,
                brightness,
            };
            self.call("turn_on", &body).await
        }
    }

    fn turn_off(&self) -> impl Future<Output = Result<(), LightError>> + Send {
        async move {
            let body = TurnOff {
                entity_id: &self.entity_id,
            };
            self.call("turn_off", &body).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            home_assistant_url: "http://ha.local:8123".to_string(),
            token: "secret".to_string(),
            light_entity_id: "light.piano".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_service_urls() {
        let client = HomeAssistantClient::new(&config()).unwrap();
        assert_eq!(
            client.service_url("turn_on"),
            "http://ha.local:8123/api/services/light/turn_on"
        );
        assert_eq!(
            client.service_url("turn_off"),
            "http://ha.local:8123/api/services/light/turn_off"
        );
    }

    #[test]
    fn test_turn_on_payload() {
        let body = TurnOn {
            entity_id: "light.piano",
            rgb_color: [42, 84, 168],
            brightness: 255,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "entity_id": "light.piano",
                "rgb_color": [42, 84, 168],
                "brightness": 255
            })
        );
    }

    #[test]
    fn test_turn_off_payload() {
        let body = TurnOff {
            entity_id: "light.piano",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "entity_id": "light.piano" })
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let client = HomeAssistantClient::new(&Config {
            home_assistant_url: "http://127.0.0.1:1".to_string(),
            ..config()
        })
        .unwrap();
        let result = client.turn_off().await;
        assert!(matches!(result, Err(LightError::Http(_))));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts the connection, then never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = HomeAssistantClient::with_timeout(
            &Config {
                home_assistant_url: format!("http://{addr}"),
                ..config()
            },
            Duration::from_millis(200),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = client.set_color([42, 84, 168], 255).await;
        match result {
            Err(LightError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
