//! JSON-lines request/response types and the dispatch from a request to a
//! [`PetService`] call.
//!
//! One request per line:
//!
//! ```text
//! {"op":"adopt","user":"alice","type":"fox"}
//! {"op":"feed","user":"alice"}
//! {"op":"leaderboard","limit":5}
//! ```
//!
//! Every request gets exactly one response line carrying a `status`
//! (`ok`, `refused`, `not_found`, `bad_request`, `server_error`) and a
//! human-readable `message`.

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::pet::{ActionEffects, ActionKind, ActionOutcome, PetError, PetState, PetStatus};
use crate::service::{ActionReport, GlobalStats, LeaderboardEntry, PetService, UserStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Adopt,
    Get,
    Feed,
    Play,
    Sleep,
    Clean,
    NightInteraction,
    ChangeType,
    Leaderboard,
    Stats,
    UserStats,
    Health,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    pub op: Op,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub pet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Refused,
    NotFound,
    BadRequest,
    ServerError,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet: Option<PetStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PetState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<ActionEffects>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<GlobalStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_stats: Option<UserStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<metrics::Snapshot>,
}

impl Response {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            created: None,
            pet: None,
            state: None,
            effects: None,
            leaderboard: None,
            stats: None,
            user_stats: None,
            metrics: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(Status::Ok, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, message)
    }

    fn with_pet(mut self, service: &PetService, state: PetState) -> Self {
        self.pet = Some(service.status(&state));
        self.state = Some(state);
        self
    }

    /// Map a service error onto a response. Only client mistakes echo the
    /// error text; anything else is logged and reported generically.
    pub fn from_error(err: &PetError) -> Self {
        match err {
            PetError::NotFound(_) => Self::new(Status::NotFound, "Pet not found"),
            PetError::InvalidPetType(value) => {
                Self::bad_request(format!("Invalid pet type: {}", value))
            }
            PetError::InvalidUserId(e) => Self::bad_request(format!("Invalid user id: {}", e)),
            other => {
                error!("request failed: {}", other);
                Self::new(Status::ServerError, "Internal server error")
            }
        }
    }

    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(e) => {
                error!("failed to encode response: {}", e);
                "{\"status\":\"server_error\",\"message\":\"Internal server error\"}\n".to_string()
            }
        }
    }
}

fn success_message(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Feed => "Pet fed successfully",
        ActionKind::Play => "Played with pet successfully",
        ActionKind::Sleep => "Pet is now sleeping",
        ActionKind::Clean => "Pet cleaned successfully",
        ActionKind::NightInteraction => "Night interaction recorded",
        ActionKind::ChangeType => "Pet type changed successfully",
    }
}

fn action_response(service: &PetService, report: ActionReport) -> Response {
    let (mut response, effects) = match report.outcome {
        ActionOutcome::Applied(effects) => (Response::ok(success_message(report.kind)), Some(effects)),
        ActionOutcome::Refused(reason) => (Response::new(Status::Refused, reason.message()), None),
    };
    response.effects = effects;
    response.with_pet(service, report.state)
}

/// Escape a request line for a single-line log entry, capped at `max_chars`.
pub fn log_preview(line: &str, max_chars: usize) -> String {
    let mut out: String = line.chars().take(max_chars).flat_map(char::escape_debug).collect();
    if line.chars().nth(max_chars).is_some() {
        out.push('…');
    }
    out
}

/// Parse one request line and run it. Never fails: every problem becomes a
/// response with the matching status.
pub fn handle_line(service: &PetService, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle_request(service, request),
        Err(e) => {
            warn!("malformed request '{}': {}", log_preview(line, 200), e);
            metrics::inc_requests_failed();
            Response::bad_request(format!("Malformed request: {}", e))
        }
    }
}

pub fn handle_request(service: &PetService, request: Request) -> Response {
    let response = dispatch(service, request).unwrap_or_else(|e| Response::from_error(&e));
    if response.status == Status::ServerError {
        metrics::inc_requests_failed();
    } else {
        metrics::inc_requests_served();
    }
    response
}

fn dispatch(service: &PetService, request: Request) -> Result<Response, PetError> {
    let needs_user = !matches!(request.op, Op::Leaderboard | Op::Stats | Op::Health);
    let user = match (&request.user, needs_user) {
        (Some(user), _) => user.as_str(),
        (None, true) => return Ok(Response::bad_request("User is required")),
        (None, false) => "",
    };

    let response = match request.op {
        Op::Adopt => {
            let report = service.adopt(user, request.pet_type.as_deref())?;
            let message = if report.created {
                "Pet adopted successfully"
            } else {
                "Welcome back"
            };
            let mut response = Response::ok(message).with_pet(service, report.state);
            response.created = Some(report.created);
            response
        }
        Op::Get => Response::ok("Pet loaded").with_pet(service, service.get(user)?),
        Op::Feed => action_response(service, service.feed(user)?),
        Op::Play => action_response(service, service.play(user)?),
        Op::Sleep => action_response(service, service.sleep(user)?),
        Op::Clean => action_response(service, service.clean(user)?),
        Op::NightInteraction => action_response(service, service.night_interaction(user)?),
        Op::ChangeType => {
            let Some(new_type) = request.pet_type.as_deref().filter(|t| !t.is_empty()) else {
                return Ok(Response::bad_request("Pet type is required"));
            };
            let state = service.change_type(user, new_type)?;
            Response::ok(success_message(ActionKind::ChangeType)).with_pet(service, state)
        }
        Op::Leaderboard => {
            let mut response = Response::ok("Leaderboard");
            response.leaderboard = Some(service.leaderboard(request.limit)?);
            response
        }
        Op::Stats => {
            let mut response = Response::ok("Global statistics");
            response.stats = Some(service.global_stats()?);
            response
        }
        Op::UserStats => {
            let mut response = Response::ok("User statistics");
            response.user_stats = Some(service.user_stats(user)?);
            response
        }
        Op::Health => {
            let mut response = Response::ok("ok");
            response.metrics = Some(metrics::snapshot());
            response
        }
    };
    Ok(response)
}
