//! HTTP server for Agenda.
//!
//! Exposes scheduling, invitations and the notification log as a JSON REST
//! API. The caller is named by a request header; every ownership and
//! invitee rule is enforced by the ledger underneath.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{Action, AuthProvider, Credentials, HeaderAuth};
pub use config::{ServerConfig, DEFAULT_CALLER_HEADER};
pub use error::{ServerError, ServerResult};
pub use server::AgendaServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use agenda_sdk::{Agenda, AgendaConfig, ManualClock, Timestamp};

    use super::*;

    fn app_at(now: u64) -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Timestamp(now)));
        let agenda = Agenda::open_with_clock(AgendaConfig::default(), clock.clone()).unwrap();
        let server = AgendaServer::with_agenda(ServerConfig::default(), Arc::new(agenda));
        (server.router(), clock)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header(DEFAULT_CALLER_HEADER, caller);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (app, _) = app_at(0);
        let (status, body) = send(&app, Method::GET, "/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (app, _) = app_at(0);
        let (status, body) = send(&app, Method::GET, "/v1/info", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["head_seq"], 0);
        assert_eq!(body["durable"], false);
    }

    #[tokio::test]
    async fn schedule_and_fetch() {
        let (app, _) = app_at(0);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 100, "to": 200, "invitees": ["bob"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["invitations"], json!([1]));

        let (status, body) = send(&app, Method::GET, "/v1/appointments/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["from"], 100);
        assert_eq!(body["to"], 200);
    }

    #[tokio::test]
    async fn writes_need_a_caller() {
        let (app, _) = app_at(0);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments",
            None,
            Some(json!({ "from": 100, "to": 200 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthenticated");
    }

    #[tokio::test]
    async fn denials_carry_their_kind() {
        let (app, clock) = app_at(0);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 200, "to": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "invalid_range");

        send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 100, "to": 200 })),
        )
        .await;

        let (status, body) =
            send(&app, Method::DELETE, "/v1/appointments/1", Some("mallory"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "forbidden");

        clock.set(Timestamp(250));
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/move",
            Some("alice"),
            Some(json!({ "from": 300, "to": 400 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "expired");

        let (status, _) = send(&app, Method::GET, "/v1/appointments/9", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mutations_answer_with_committed_state() {
        let (app, _) = app_at(0);
        send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 100, "to": 200, "invitees": ["bob"] })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/move",
            Some("alice"),
            Some(json!({ "from": 300, "to": 400 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": 1, "from": 300, "to": 400, "seq": 2 }));

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/invitations/1/deny",
            Some("bob"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["appointment_id"], 1);
        assert_eq!(body["status"], "Denied");
    }

    #[tokio::test]
    async fn invitation_lifecycle() {
        let (app, _) = app_at(0);
        send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 100, "to": 200 })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/invitations",
            Some("alice"),
            Some(json!({ "identities": ["bob", "carol"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["invitations"], json!([1, 2]));

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/invitations/1/approve",
            Some("carol"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/invitations/1/approve",
            Some("bob"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Approved");

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/appointments/1/invitations/2/uninvite",
            Some("alice"),
            Some(json!({ "identities": ["carol"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(
            &app,
            Method::GET,
            "/v1/appointments/1/invitations",
            None,
            None,
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn owner_listing_and_upcoming_filter() {
        let (app, clock) = app_at(0);
        for (from, to) in [(10, 20), (100, 200)] {
            send(
                &app,
                Method::POST,
                "/v1/appointments",
                Some("alice"),
                Some(json!({ "from": from, "to": to })),
            )
            .await;
        }
        clock.set(Timestamp(50));

        let (_, all) = send(&app, Method::GET, "/v1/owners/alice/appointments", None, None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, upcoming) = send(
            &app,
            Method::GET,
            "/v1/owners/alice/appointments?upcoming=true",
            None,
            None,
        )
        .await;
        let upcoming = upcoming.as_array().unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0]["id"], 2);
    }

    #[tokio::test]
    async fn notification_page_resumes_after_cursor() {
        let (app, _) = app_at(0);
        send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 100, "to": 200, "invitees": ["bob"] })),
        )
        .await;
        send(
            &app,
            Method::DELETE,
            "/v1/appointments/1",
            Some("alice"),
            None,
        )
        .await;

        let (status, page) = send(&app, Method::GET, "/v1/notifications", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["head"], 2);
        assert_eq!(page["events"][0]["notification"]["kind"], "AppointmentCreated");
        assert_eq!(page["events"][1]["notification"]["kind"], "AppointmentUnscheduled");

        let (_, page) = send(&app, Method::GET, "/v1/notifications?after=1", None, None).await;
        assert_eq!(page["events"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn anonymous_reads_can_be_disabled() {
        let config = ServerConfig {
            allow_anonymous_read: false,
            ..ServerConfig::default()
        };
        let app = AgendaServer::with_agenda(config, Arc::new(Agenda::in_memory())).router();
        let (status, _) = send(&app, Method::GET, "/v1/notifications", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) =
            send(&app, Method::GET, "/v1/notifications", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_identity_is_bad_request() {
        let (app, _) = app_at(0);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/appointments",
            Some("alice"),
            Some(json!({ "from": 100, "to": 200, "invitees": ["two words"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");
    }
}
