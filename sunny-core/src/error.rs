//! Failure envelope shared by every remote-backed operation.

use thiserror::Error;

/// Either the payload of a successful operation or the reason it failed.
pub type Outcome<T> = Result<T, WeatherError>;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// Network or IO failure while talking to the service.
    #[error("request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// The call completed but produced no usable body.
    #[error("response body is null (HTTP {status})")]
    EmptyResponse { status: u16 },

    #[error("failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// The service answered, but reported a failure in-band.
    #[error("response status is {status}")]
    Status { status: String },

    /// An ok status arrived without the payload it promises.
    #[error("response status is ok but carries no result")]
    MissingResult,

    #[error("realtime response status is {realtime}, daily response status is {daily}")]
    WeatherStatus { realtime: String, daily: String },

    #[error("call finished without reporting a result")]
    Abandoned,

    #[error("task did not complete: {message}")]
    Aborted { message: String },

    #[error("no place has been saved yet")]
    NotSaved,

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl WeatherError {
    pub fn status<S: Into<String>>(status: S) -> Self {
        Self::Status { status: status.into() }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage { message: message.into() }
    }

    /// Whether the failure came from the transport rather than the service's answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::EmptyResponse { .. } | Self::Abandoned)
    }
}

impl From<tokio::task::JoinError> for WeatherError {
    fn from(err: tokio::task::JoinError) -> Self {
        let message = if err.is_cancelled() { "cancelled".to_string() } else { err.to_string() };
        Self::Aborted { message }
    }
}
