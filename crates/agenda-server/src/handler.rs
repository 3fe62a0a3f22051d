use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use agenda_fabric::FabricEvent;
use agenda_sdk::{
    Appointment, AppointmentId, Identity, Invitation, InvitationId, Operation, SdkError, Timestamp,
};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub from: u64,
    pub to: u64,
    #[serde(default)]
    pub invitees: Vec<String>,
    #[serde(default)]
    pub recurring: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Deserialize)]
pub struct MembersRequest {
    pub identities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Scheduled {
    pub id: AppointmentId,
    pub invitations: Vec<InvitationId>,
}

#[derive(Debug, Serialize)]
pub struct Moved {
    pub id: AppointmentId,
    pub from: Timestamp,
    pub to: Timestamp,
    pub seq: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub after: u64,
}

#[derive(Debug, Serialize)]
pub struct NotificationPage {
    pub head: u64,
    pub events: Vec<FabricEvent>,
}

fn missing_in_receipt(what: &str) -> ServerError {
    ServerError::Internal(format!("receipt carries no {what}"))
}

fn parse_identities(values: &[String]) -> ServerResult<Vec<Identity>> {
    values
        .iter()
        .map(|v| {
            v.parse::<Identity>()
                .map_err(|e| ServerError::BadRequest(format!("identity '{v}': {e}")))
        })
        .collect()
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    Ok(Json(json!({
        "name": "agenda-server",
        "version": env!("CARGO_PKG_VERSION"),
        "head_seq": state.agenda.head_seq()?,
        "appointments": state.agenda.appointment_count()?,
        "durable": state.agenda.is_durable(),
        "now": state.agenda.now(),
    })))
}

pub async fn schedule_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ScheduleRequest>,
) -> ServerResult<(StatusCode, Json<Scheduled>)> {
    let caller = state.caller(&headers).await?;
    let invitees = parse_identities(&req.invitees)?;
    let receipt = state.agenda.execute(
        &caller,
        Operation::Schedule {
            from: Timestamp(req.from),
            to: Timestamp(req.to),
            invitees,
            recurring: req.recurring,
        },
    )?;
    Ok((
        StatusCode::CREATED,
        Json(Scheduled {
            id: receipt.appointment_id(),
            invitations: receipt.invitation_ids(),
        }),
    ))
}

pub async fn get_appointment_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<Appointment>> {
    state.reader(&headers).await?;
    Ok(Json(state.agenda.appointment(AppointmentId(id))?))
}

pub async fn unschedule_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    state.agenda.unschedule(&caller, AppointmentId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<MoveRequest>,
) -> ServerResult<Json<Moved>> {
    let caller = state.caller(&headers).await?;
    let id = AppointmentId(id);
    let receipt = state.agenda.execute(
        &caller,
        Operation::Move {
            id,
            from: Timestamp(req.from),
            to: Timestamp(req.to),
        },
    )?;
    let (from, to) = receipt
        .moved_window()
        .ok_or_else(|| missing_in_receipt("window"))?;
    Ok(Json(Moved {
        id,
        from,
        to,
        seq: receipt.seq(),
    }))
}

pub async fn invite_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<MembersRequest>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let caller = state.caller(&headers).await?;
    let identities = parse_identities(&req.identities)?;
    let created = state
        .agenda
        .invite_members(&caller, AppointmentId(id), identities)?;
    Ok((StatusCode::CREATED, Json(json!({ "invitations": created }))))
}

pub async fn list_invitations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<Vec<Invitation>>> {
    state.reader(&headers).await?;
    Ok(Json(state.agenda.invitations(AppointmentId(id))?))
}

pub async fn uninvite_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, invitation)): Path<(u64, u64)>,
    Json(req): Json<MembersRequest>,
) -> ServerResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    let identities = parse_identities(&req.identities)?;
    state.agenda.uninvite_members(
        &caller,
        AppointmentId(id),
        InvitationId(invitation),
        identities,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, invitation)): Path<(u64, u64)>,
) -> ServerResult<Json<Invitation>> {
    let caller = state.caller(&headers).await?;
    let receipt = state.agenda.execute(
        &caller,
        Operation::ApproveInvite {
            appointment_id: AppointmentId(id),
            invitation_id: InvitationId(invitation),
        },
    )?;
    let answered = receipt
        .answered()
        .ok_or_else(|| missing_in_receipt("invitation"))?;
    Ok(Json(answered))
}

pub async fn deny_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, invitation)): Path<(u64, u64)>,
) -> ServerResult<Json<Invitation>> {
    let caller = state.caller(&headers).await?;
    let receipt = state.agenda.execute(
        &caller,
        Operation::DenyInvite {
            appointment_id: AppointmentId(id),
            invitation_id: InvitationId(invitation),
        },
    )?;
    let answered = receipt
        .answered()
        .ok_or_else(|| missing_in_receipt("invitation"))?;
    Ok(Json(answered))
}

pub async fn owner_appointments_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner): Path<String>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Json<Vec<Appointment>>> {
    state.reader(&headers).await?;
    let owner = owner
        .parse::<Identity>()
        .map_err(|e| ServerError::BadRequest(format!("identity '{owner}': {e}")))?;
    let appointments = if query.upcoming {
        state.agenda.upcoming_of(&owner)?
    } else {
        state.agenda.appointments_of(&owner)?
    };
    Ok(Json(appointments))
}

pub async fn notifications_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> ServerResult<Json<NotificationPage>> {
    state.reader(&headers).await?;
    let head = state.agenda.fabric().head_seq().map_err(SdkError::from)?;
    let events = state.agenda.notifications_since(query.after)?;
    Ok(Json(NotificationPage { head, events }))
}
