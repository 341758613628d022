//! Wire contract of the reqwest transport against a loopback HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use staybook_client::gateway::Access;
use staybook_client::mocks::MemoryStorage;
use staybook_client::{ClientConfig, ClientError, Method, ReqwestTransport, StayClient};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct ServerState {
    revoked: Arc<AtomicBool>,
    seen_headers: Arc<Mutex<Vec<HeaderMap>>>,
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "pw" {
        (
            StatusCode::OK,
            Json(json!({"token": "T-live", "user": {"role": "Customer", "name": "Ana"}})),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})))
    }
}

async fn reservations(State(state): State<ServerState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.seen_headers.lock().unwrap().push(headers.clone());
    let bearer = headers.get("authorization").and_then(|value| value.to_str().ok());
    if state.revoked.load(Ordering::SeqCst) || bearer != Some("Bearer T-live") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token expired"})));
    }
    (
        StatusCode::OK,
        Json(json!({"bookings": [{
            "id": 1,
            "hotelId": 5,
            "hotelName": "Hotel Sol",
            "checkIn": "2025-11-19",
            "checkOut": "2025-11-22",
            "totalPrice": 450,
            "confirmationCode": "TRV-1",
            "status": "confirmed"
        }]})),
    )
}

async fn delete_hotel(Path(id): Path<u64>) -> (StatusCode, Json<Value>) {
    (StatusCode::CONFLICT, Json(json!({"error": format!("Hotel {id} has associated rooms")})))
}

async fn empty_availability() -> StatusCode {
    StatusCode::OK
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
}

async fn serve(state: ServerState) -> SocketAddr {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/reservations", get(reservations))
        .route("/api/hotels/:id", delete(delete_hotel))
        .route("/api/availability", get(empty_availability))
        .route("/api/broken", get(broken))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> StayClient<ReqwestTransport> {
    let config = ClientConfig::new(format!("http://{addr}/api"));
    let transport = ReqwestTransport::new(&config).unwrap();
    StayClient::with_parts(config, Arc::new(transport), Arc::new(MemoryStorage::new()))
}

#[tokio::test]
async fn bearer_and_json_headers_reach_the_server() {
    let state = ServerState::default();
    let client = client_for(serve(state.clone()).await);

    client.login("a@b.com", "pw").await.unwrap();
    let bookings = client.bookings().list().await.unwrap();

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].confirmation_code, "TRV-1");

    let seen = state.seen_headers.lock().unwrap();
    let headers = &seen[0];
    assert_eq!(headers.get("authorization").unwrap(), "Bearer T-live");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(headers.get("accept").unwrap(), "application/json");
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn rejected_login_message_is_passed_through() {
    let client = client_for(serve(ServerState::default()).await);

    let error = client.login("a@b.com", "nope").await.unwrap_err();

    assert_eq!(
        error,
        ClientError::Api {
            status: 401,
            message: "Invalid credentials".to_string()
        }
    );
}

#[tokio::test]
async fn error_key_and_generic_messages() {
    let client = client_for(serve(ServerState::default()).await);
    client.login("a@b.com", "pw").await.unwrap();

    let conflict = client
        .api()
        .request(Method::Delete, "/hotels/4", None, Access::Authenticated)
        .await
        .unwrap_err();
    assert_eq!(conflict.status(), Some(409));
    assert_eq!(conflict.user_message(), "Hotel 4 has associated rooms");

    let upstream = client
        .api()
        .request(Method::Get, "/broken", None, Access::Public)
        .await
        .unwrap_err();
    assert_eq!(upstream.user_message(), "request failed with status 502");
}

#[tokio::test]
async fn empty_success_body_is_no_availability() {
    let client = client_for(serve(ServerState::default()).await);

    let value = client
        .api()
        .request(Method::Get, "/availability?destination=Lima", None, Access::Public)
        .await
        .unwrap();

    assert!(value.is_null());
}

#[tokio::test]
async fn revoked_credential_signs_the_user_out() {
    let state = ServerState::default();
    let client = client_for(serve(state.clone()).await);
    client.login("a@b.com", "pw").await.unwrap();
    state.revoked.store(true, Ordering::SeqCst);

    let error = client.bookings().list().await.unwrap_err();

    assert_eq!(error.status(), Some(401));
    assert!(!client.session().is_authenticated());

    let again = client.bookings().list().await.unwrap_err();
    assert_eq!(again, ClientError::Unauthenticated);
    assert_eq!(state.seen_headers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn closed_port_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(addr);

    let error = client.login("a@b.com", "pw").await.unwrap_err();

    assert!(matches!(error, ClientError::Network { .. }));
    assert!(!client.session().is_authenticated());
}
