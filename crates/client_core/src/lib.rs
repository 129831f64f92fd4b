use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::SessionId,
    error::{ApiError, ErrorCode},
    protocol::{MoveReply, MoveRequest, OpenSessionRequest, OpenSessionResponse},
};
use tracing::{debug, warn};
use url::Url;

pub mod config;
pub mod driver;
pub mod error;
pub mod history;
pub mod mode;
pub mod rules;
pub mod session;
pub mod turn_gate;

pub use config::DriverConfig;
pub use driver::{start_game, start_session, DispatchError, GameHandle, UserCommand};
pub use error::{ConfigError, GestureRejection, RoundTripError, ServiceError, SessionOpenError};
pub use history::{MoveHistory, MovePair};
pub use mode::{parse_selection, GameSetup};
pub use rules::{Rules, ShakmatyRules};
pub use session::{GameSession, GameUpdate, Phase, SessionSnapshot};

/// The remote side: hands out session ids, accepts human moves and picks
/// automated ones. Both move kinds share one call, distinguished by the
/// presence of a descriptor in the request.
#[async_trait]
pub trait MoveService: Send + Sync {
    async fn open_session(&self, request: OpenSessionRequest) -> Result<SessionId, ServiceError>;

    async fn request_move(
        &self,
        session_id: &SessionId,
        request: MoveRequest,
    ) -> Result<MoveReply, ServiceError>;
}

/// [`MoveService`] over the JSON HTTP API served by the `server` crate.
pub struct HttpMoveService {
    http: Client,
    base_url: Url,
}

impl HttpMoveService {
    pub fn new(server_url: &str, config: &DriverConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidServiceUrl {
            url: server_url.to_string(),
            reason,
        };
        let mut base_url = Url::parse(server_url).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("url cannot be used as a base".to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| invalid(err.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::Transport(format!("invalid endpoint '{path}': {err}")))
    }
}

#[async_trait]
impl MoveService for HttpMoveService {
    async fn open_session(&self, request: OpenSessionRequest) -> Result<SessionId, ServiceError> {
        let url = self.endpoint("sessions")?;
        debug!(%url, mode = %request.mode, "requesting new session");
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let body: OpenSessionResponse = decode_response(response).await?;
        Ok(body.session_id)
    }

    async fn request_move(
        &self,
        session_id: &SessionId,
        request: MoveRequest,
    ) -> Result<MoveReply, ServiceError> {
        let url = self.endpoint(&format!("sessions/{}/moves", session_id.as_str()))?;
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        decode_response(response).await
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    ServiceError::Transport(err.to_string())
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| ServiceError::Decode(err.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            body.clone()
        };
        ApiError::new(ErrorCode::Internal, message)
    });
    warn!(status = status.as_u16(), code = ?error.code, message = %error.message, "move service rejected request");
    Err(ServiceError::Rejected {
        status: status.as_u16(),
        error,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
