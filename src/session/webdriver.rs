use super::{ElementRef, Session, SessionProvider};
use crate::{
    capabilities::Capabilities,
    config::Config,
    error::{ErrorKind, FlowError},
    locator::Selector,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session-open attempts before giving up on connectivity errors.
const CONNECT_ATTEMPTS: u32 = 3;
/// Per-attempt budget for session creation; device provisioning is slow.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(180);
const CONNECT_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opens sessions against a WebDriver/Appium hub.
pub struct WebDriverProvider {
    hub_url: String,
    client: Client,
}

pub struct WebDriverSession {
    id: String,
    base: String,
    client: Client,
}

impl WebDriverProvider {
    pub fn new(cfg: &Config) -> Result<Self, FlowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.session.command_timeout_seconds.max(1)))
            .build()
            .map_err(|e| FlowError::configuration(format!("building http client: {e}")))?;
        Ok(Self {
            hub_url: cfg.session.hub_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn start_once(&self, caps: &Capabilities) -> Result<WebDriverSession, FlowError> {
        let body = json!({ "capabilities": { "alwaysMatch": caps, "firstMatch": [{}] } });
        let req = self
            .client
            .post(format!("{}/session", self.hub_url))
            .timeout(CONNECT_TIMEOUT)
            .basic_auth(&caps.provider.user_name, Some(&caps.provider.access_key))
            .json(&body);
        let value = send(req)?;

        #[derive(Deserialize)]
        struct NewSession {
            #[serde(rename = "sessionId")]
            session_id: String,
        }
        let created: NewSession = serde_json::from_value(value)
            .map_err(|e| FlowError::remote(format!("unexpected new-session response: {e}")))?;

        Ok(WebDriverSession {
            base: format!("{}/session/{}", self.hub_url, created.session_id),
            id: created.session_id,
            client: self.client.clone(),
        })
    }
}

impl SessionProvider for WebDriverProvider {
    type Session = WebDriverSession;

    fn start(&self, caps: &Capabilities) -> Result<WebDriverSession, FlowError> {
        let session = retry_connect(CONNECT_ATTEMPTS, CONNECT_RETRY_PAUSE, |attempt| {
            debug!("opening session on {} attempt {attempt}", caps.device_name);
            self.start_once(caps)
        })?;
        info!("session {} opened on {}", session.id, caps.device_name);
        Ok(session)
    }
}

/// Calls `open` up to `attempts` times, pausing between tries. Only
/// retryable (connectivity) errors get another attempt.
fn retry_connect<T>(
    attempts: u32,
    pause: Duration,
    mut open: impl FnMut(u32) -> Result<T, FlowError>,
) -> Result<T, FlowError> {
    let mut attempt = 1;
    loop {
        match open(attempt) {
            Ok(v) => return Ok(v),
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!(
                    "session open attempt {attempt}/{attempts} failed: {}",
                    err.detail
                );
                if !pause.is_zero() {
                    std::thread::sleep(pause);
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

impl WebDriverSession {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Session for WebDriverSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn find_element(&self, selector: &Selector) -> Result<ElementRef, FlowError> {
        let body = json!({ "using": selector.strategy(), "value": selector.value() });
        let value = send(self.client.post(self.url("/element")).json(&body))?;
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get("ELEMENT"))
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| FlowError::remote(format!("no element reference in response: {value}")))
    }

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, FlowError> {
        let value = send(
            self.client
                .get(self.url(&format!("/element/{}/displayed", element.0))),
        )?;
        value
            .as_bool()
            .ok_or_else(|| FlowError::remote(format!("displayed returned non-bool: {value}")))
    }

    fn click(&self, element: &ElementRef) -> Result<(), FlowError> {
        send(
            self.client
                .post(self.url(&format!("/element/{}/click", element.0)))
                .json(&json!({})),
        )?;
        Ok(())
    }

    fn set_value(&self, element: &ElementRef, text: &str) -> Result<(), FlowError> {
        send(
            self.client
                .post(self.url(&format!("/element/{}/value", element.0)))
                .json(&json!({ "text": text })),
        )?;
        Ok(())
    }

    fn press_keycode(&self, keycode: u32) -> Result<(), FlowError> {
        send(
            self.client
                .post(self.url("/appium/device/press_keycode"))
                .json(&json!({ "keycode": keycode })),
        )?;
        Ok(())
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn end(&self) -> Result<(), FlowError> {
        send(self.client.delete(&self.base))
            .map(|_| ())
            .map_err(|e| FlowError::new(ErrorKind::Teardown, e.detail))
    }
}

/// Sends a request and unwraps the W3C `value` envelope.
fn send(req: RequestBuilder) -> Result<Value, FlowError> {
    let resp = req.send().map_err(transport_error)?;
    let status = resp.status();
    let body: Value = resp
        .json()
        .unwrap_or_else(|_| json!({ "value": { "message": status.to_string() } }));
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value.get("error").and_then(Value::as_str).unwrap_or("");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message");
    Err(classify(status, error, message))
}

fn transport_error(err: reqwest::Error) -> FlowError {
    let what = if err.is_timeout() {
        "connection timeout"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "transport error"
    };
    FlowError::connectivity(format!("{what}: {err}"))
}

/// Maps a hub error response onto an error kind.
fn classify(status: StatusCode, error: &str, message: &str) -> FlowError {
    let lower = message.to_ascii_lowercase();
    let detail = if error.is_empty() {
        format!("{status}: {message}")
    } else {
        format!("{error}: {message}")
    };

    let kind = if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || lower.contains("authorization")
        || lower.contains("invalid username or password")
    {
        ErrorKind::Authorization
    } else if status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("parallel")
        || lower.contains("concurrent")
        || lower.contains("queue size")
    {
        ErrorKind::Capacity
    } else if lower.contains("could not find device")
        || lower.contains("device is not available")
        || lower.contains("no device")
    {
        ErrorKind::DeviceUnavailable
    } else if error == "timeout"
        || status == StatusCode::GATEWAY_TIMEOUT
        || status == StatusCode::BAD_GATEWAY
        || status == StatusCode::SERVICE_UNAVAILABLE
    {
        ErrorKind::Connectivity
    } else {
        ErrorKind::Remote
    };
    FlowError::new(kind, detail)
}
