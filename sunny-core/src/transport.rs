//! Callback-driven calls and the bridge that lets callers simply `.await` them.
//!
//! A [`Call`] is enqueued once and reports back through a [`Callback`] from
//! whatever task finishes the work. [`await_body`] turns that into a single
//! suspension point resolving to an [`Outcome`].

use std::{
    marker::PhantomData,
    sync::{Arc, Mutex, PoisonError},
};

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use crate::error::{Outcome, WeatherError};

/// What a call reports once the transport received an answer.
#[derive(Debug)]
pub struct Response<T> {
    pub status: StatusCode,
    /// `None` when the answer carried nothing to decode.
    pub body: Option<T>,
}

pub trait Callback<T>: Send + Sync {
    fn on_response(&self, response: Response<T>);
    fn on_failure(&self, error: WeatherError);
}

/// A pending remote call. Enqueueing must not block the caller.
pub trait Call<T>: Send {
    fn enqueue(self, callback: Arc<dyn Callback<T>>);
}

/// Enqueue `call` and wait for its body.
///
/// A missing body is a failure, never an empty success. If the call drops the
/// callback without reporting, this resolves to [`WeatherError::Abandoned`].
pub async fn await_body<T, C>(call: C) -> Outcome<T>
where
    T: Send + 'static,
    C: Call<T>,
{
    let (tx, rx) = oneshot::channel();
    call.enqueue(Arc::new(Continuation::new(tx)));
    rx.await.unwrap_or(Err(WeatherError::Abandoned))
}

/// Resumes the waiting caller at most once.
struct Continuation<T> {
    slot: Mutex<Option<oneshot::Sender<Outcome<T>>>>,
}

impl<T> Continuation<T> {
    fn new(tx: oneshot::Sender<Outcome<T>>) -> Self {
        Self { slot: Mutex::new(Some(tx)) }
    }

    fn resume(&self, outcome: Outcome<T>) {
        let sender = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        match sender {
            // The receiver may be gone if the caller was cancelled.
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => tracing::warn!("call reported a result twice; ignoring the second one"),
        }
    }
}

impl<T: Send> Callback<T> for Continuation<T> {
    fn on_response(&self, response: Response<T>) {
        match response.body {
            Some(body) => self.resume(Ok(body)),
            None => self.resume(Err(WeatherError::EmptyResponse { status: response.status.as_u16() })),
        }
    }

    fn on_failure(&self, error: WeatherError) {
        self.resume(Err(error));
    }
}

/// A GET request whose JSON body decodes into `T`, performed on a spawned task.
pub struct HttpCall<T> {
    request: RequestBuilder,
    _body: PhantomData<fn() -> T>,
}

impl<T> HttpCall<T> {
    pub fn new(request: RequestBuilder) -> Self {
        Self { request, _body: PhantomData }
    }

    /// Build the underlying request without sending it.
    pub fn into_request(self) -> reqwest::Result<reqwest::Request> {
        self.request.build()
    }
}

impl<T> Call<T> for HttpCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn enqueue(self, callback: Arc<dyn Callback<T>>) {
        let request = self.request;
        tokio::spawn(async move {
            let res = match request.send().await {
                Ok(res) => res,
                Err(err) => return callback.on_failure(err.into()),
            };

            let status = res.status();
            let bytes = match res.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => return callback.on_failure(err.into()),
            };

            if !status.is_success() {
                tracing::debug!(
                    %status,
                    body = %truncate_body(&String::from_utf8_lossy(&bytes)),
                    "service answered with an error status"
                );
                return callback.on_response(Response { status, body: None });
            }

            if bytes.iter().all(u8::is_ascii_whitespace) {
                return callback.on_response(Response { status, body: None });
            }

            // A literal `null` body decodes to `None`.
            match serde_json::from_slice::<Option<T>>(&bytes) {
                Ok(body) => callback.on_response(Response { status, body }),
                Err(source) => callback.on_failure(WeatherError::Decode { source }),
            }
        });
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use serde::Deserialize;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Fake call that replays a fixed sequence of callback invocations from a spawned task.
    enum Report {
        Body(Option<&'static str>),
        Failure,
    }

    struct ScriptedCall {
        reports: Vec<Report>,
    }

    impl Call<String> for ScriptedCall {
        fn enqueue(self, callback: Arc<dyn Callback<String>>) {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                for report in self.reports {
                    match report {
                        Report::Body(body) => callback.on_response(Response {
                            status: StatusCode::OK,
                            body: body.map(str::to_string),
                        }),
                        Report::Failure => callback.on_failure(WeatherError::status("scripted")),
                    }
                }
            });
        }
    }

    struct DroppedCall;

    impl Call<String> for DroppedCall {
        fn enqueue(self, callback: Arc<dyn Callback<String>>) {
            drop(callback);
        }
    }

    #[tokio::test]
    async fn resumes_with_body() {
        let call = ScriptedCall { reports: vec![Report::Body(Some("sunny"))] };
        assert_eq!(await_body(call).await.unwrap(), "sunny");
    }

    #[tokio::test]
    async fn empty_body_is_a_failure() {
        let call = ScriptedCall { reports: vec![Report::Body(None)] };
        let err = await_body(call).await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyResponse { status: 200 }));
    }

    #[tokio::test]
    async fn failure_then_body_resumes_once_with_failure() {
        let call = ScriptedCall { reports: vec![Report::Failure, Report::Body(Some("late"))] };
        let err = await_body(call).await.unwrap_err();
        assert!(matches!(err, WeatherError::Status { .. }));
    }

    #[tokio::test]
    async fn body_then_failure_resumes_once_with_body() {
        let call = ScriptedCall { reports: vec![Report::Body(Some("first")), Report::Failure] };
        assert_eq!(await_body(call).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn dropped_callback_is_abandoned() {
        let err = await_body(DroppedCall).await.unwrap_err();
        assert!(matches!(err, WeatherError::Abandoned));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "晴".repeat(250);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[derive(Debug, Deserialize)]
    struct Echo {
        status: String,
    }

    fn http_call(url: &str) -> HttpCall<Echo> {
        HttpCall::new(reqwest::Client::new().get(url))
    }

    #[tokio::test]
    async fn http_call_decodes_json() {
        let url = serve_once("200 OK", r#"{"status":"ok"}"#).await;
        let echo = await_body(http_call(&url)).await.unwrap();
        assert_eq!(echo.status, "ok");
    }

    #[tokio::test]
    async fn http_call_empty_body_fails() {
        let url = serve_once("200 OK", "").await;
        let err = await_body(http_call(&url)).await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyResponse { status: 200 }));
    }

    #[tokio::test]
    async fn http_call_null_body_fails() {
        let url = serve_once("200 OK", "null").await;
        let err = await_body(http_call(&url)).await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn http_call_error_status_has_no_body() {
        let url = serve_once("401 Unauthorized", r#"{"status":"failed","error":"token is invalid"}"#).await;
        let err = await_body(http_call(&url)).await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyResponse { status: 401 }));
    }

    #[tokio::test]
    async fn http_call_bad_json_is_decode_error() {
        let url = serve_once("200 OK", "<html>").await;
        let err = await_body(http_call(&url)).await.unwrap_err();
        assert!(matches!(err, WeatherError::Decode { .. }));
    }

    #[tokio::test]
    async fn http_call_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = await_body(http_call(&format!("http://{addr}/"))).await.unwrap_err();
        assert!(matches!(err, WeatherError::Transport { .. }));
    }
}
