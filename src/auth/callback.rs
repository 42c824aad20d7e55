use std::time::{Duration, Instant};

use error_stack::{IntoReport, Report, ResultExt};
use log::debug;
use tiny_http::{Header, Request, Response, Server};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{AuthError, AuthResult};

const SUCCESS_PAGE: &str = r#"
<html>
<head><title>y2spot</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 20vh;">
    <h1>Authentication successful!</h1>
    <p>You can close this window and return to y2spot.</p>
</body>
</html>
"#;

/// What the authorization server sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParams {
    Code { code: String, state: String },
    Denied { error: String },
}

/// Reads the query of a `/callback` request. Any other path is ignored.
pub fn parse_callback(request_url: &str) -> Option<CallbackParams> {
    let parsed = Url::parse(&format!("http://localhost{request_url}")).ok()?;
    if parsed.path() != "/callback" {
        return None;
    }
    let mut code = None;
    let mut state = String::new();
    let mut error = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = value.into_owned(),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        return Some(CallbackParams::Denied { error });
    }
    code.map(|code| CallbackParams::Code { code, state })
}

/// Temporary local listener for the OAuth redirect.
///
/// `wait_for_code` consumes the listener, so the socket is closed as soon as a code,
/// a denial, a timeout or a cancellation arrives.
pub struct CallbackListener {
    server: Server,
}

impl CallbackListener {
    pub fn bind(address: &str) -> AuthResult<Self> {
        let server = Server::http(address)
            .map_err(|err| {
                Report::new(AuthError)
                    .attach_printable(format!("could not listen on {address}: {err}"))
            })?;
        Ok(Self { server })
    }

    pub fn local_port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|addr| addr.port())
    }

    pub async fn wait_for_code(
        self,
        expected_state: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AuthResult<String> {
        let start = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return Err(Report::new(AuthError).attach_printable("login cancelled".to_string()));
            }
            if start.elapsed() > timeout {
                return Err(Report::new(AuthError)
                    .attach_printable("timed out waiting for the Spotify login".to_string()));
            }
            let received = self
                .server
                .recv_timeout(Duration::from_millis(100))
                .into_report()
                .change_context(AuthError)?;
            let Some(request) = received else {
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            };
            debug!("Received callback request: {}", request.url());
            match parse_callback(request.url()) {
                Some(CallbackParams::Code { code, state }) => {
                    if state != expected_state {
                        respond(request, "State mismatch, please try again.", 400);
                        return Err(Report::new(AuthError)
                            .attach_printable("state mismatch in the login callback".to_string()));
                    }
                    respond_html(request);
                    return Ok(code);
                }
                Some(CallbackParams::Denied { error }) => {
                    respond(request, "Login was not completed.", 400);
                    return Err(Report::new(AuthError)
                        .attach_printable(format!("authorization denied: {error}")));
                }
                None => respond(request, "Not Found", 404),
            }
        }
    }
}

fn respond(request: Request, body: &str, status: u16) {
    let response = Response::from_string(body).with_status_code(status);
    let _ = request.respond(response);
}

fn respond_html(request: Request) {
    let mut response = Response::from_string(SUCCESS_PAGE);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]) {
        response = response.with_header(header);
    }
    let _ = request.respond(response);
}
