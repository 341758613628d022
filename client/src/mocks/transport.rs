//! Scripted HTTP transport.

use crate::gateway::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    NoResponse(String),
}

/// Holds a request in flight until the test releases it.
#[derive(Debug, Clone)]
pub struct MockGate {
    arrived: Arc<Semaphore>,
    release: Arc<Semaphore>,
}

impl MockGate {
    fn new() -> Self {
        Self {
            arrived: Arc::new(Semaphore::new(0)),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    /// Wait until a request has reached the gate.
    pub async fn arrived(&self) {
        if let Ok(permit) = self.arrived.acquire().await {
            permit.forget();
        }
    }

    /// Let one held request continue.
    pub fn release(&self) {
        self.release.add_permits(1);
    }

    async fn pass(&self) {
        self.arrived.add_permits(1);
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
    }
}

type RouteKey = (Method, String);

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<RouteKey, VecDeque<Reply>>,
    gates: HashMap<RouteKey, MockGate>,
    requests: Vec<HttpRequest>,
}

/// Transport that answers from a script and records every request.
///
/// Routes are matched on method and URL path suffix, ignoring the query
/// string. Each route holds a queue of replies; the last reply is repeated
/// once the others are used up. Unscripted routes answer 404.
///
/// # Example
///
/// ```ignore
/// let transport = MockTransport::new();
/// transport.on_json(Method::Get, "/reservations", 200, json!({"bookings": []}));
/// transport.on_network_error(Method::Delete, "/reservations/2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

fn path_of(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

fn key(method: Method, path: &str) -> RouteKey {
    (method, format!("/{}", path_of(path).trim_matches('/')))
}

impl MockTransport {
    /// Create a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.lock()
            .routes
            .entry(key(method, path))
            .or_default()
            .push_back(reply);
    }

    /// Queue a raw response.
    pub fn on(&self, method: Method, path: &str, response: HttpResponse) {
        self.push(method, path, Reply::Response(response));
    }

    /// Queue a JSON response.
    pub fn on_json(&self, method: Method, path: &str, status: u16, body: Value) {
        self.on(method, path, HttpResponse::json(status, &body));
    }

    /// Queue an error response carrying `{"message": ...}`.
    pub fn on_error(&self, method: Method, path: &str, status: u16, message: &str) {
        self.on_json(method, path, status, json!({ "message": message }));
    }

    /// Queue a failure where no response is received.
    pub fn on_network_error(&self, method: Method, path: &str) {
        self.push(method, path, Reply::NoResponse("connection refused".to_string()));
    }

    /// Hold requests to this route until [`MockGate::release`] is called.
    #[must_use]
    pub fn gate(&self, method: Method, path: &str) -> MockGate {
        self.lock()
            .gates
            .entry(key(method, path))
            .or_insert_with(MockGate::new)
            .clone()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Requests received for one route.
    #[must_use]
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        let (_, wanted) = key(method, path);
        self.lock()
            .requests
            .iter()
            .filter(|request| request.method == method && path_of(&request.url).ends_with(&wanted))
            .cloned()
            .collect()
    }

    fn resolve(&self, request: HttpRequest) -> (Option<MockGate>, Reply) {
        let mut script = self.lock();
        let url_path = path_of(&request.url).trim_end_matches('/').to_string();
        let method = request.method;
        script.requests.push(request);

        // Longest matching suffix wins so "/reservations/2" beats "/2".
        let matched = script
            .routes
            .keys()
            .filter(|(m, path)| *m == method && url_path.ends_with(path.as_str()))
            .max_by_key(|(_, path)| path.len())
            .cloned();

        let Some(route) = matched else {
            return (
                None,
                Reply::Response(HttpResponse::json(404, &json!({ "message": "no mock route" }))),
            );
        };

        let gate = script.gates.get(&route).cloned();
        let reply = script.routes.get_mut(&route).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        let reply = reply.unwrap_or_else(|| {
            Reply::Response(HttpResponse::json(404, &json!({ "message": "no mock route" })))
        });
        (gate, reply)
    }
}

impl HttpTransport for MockTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let (gate, reply) = self.resolve(request);

        async move {
            if let Some(gate) = gate {
                gate.pass().await;
            }
            match reply {
                Reply::Response(response) => Ok(response),
                Reply::NoResponse(message) => Err(TransportError::new(message)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn last_reply_repeats() {
        let transport = MockTransport::new();
        transport.on_json(Method::Get, "/hotels", 200, json!([1]));
        transport.on_json(Method::Get, "/hotels", 200, json!([2]));

        let first = transport.execute(get("http://x/api/hotels")).await;
        let second = transport.execute(get("http://x/api/hotels")).await;
        let third = transport.execute(get("http://x/api/hotels")).await;

        assert_eq!(first.map(|r| r.body), Ok("[1]".to_string()));
        assert_eq!(second.map(|r| r.body), Ok("[2]".to_string()));
        assert_eq!(third.map(|r| r.body), Ok("[2]".to_string()));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn query_string_is_ignored_and_unknown_routes_404() {
        let transport = MockTransport::new();
        transport.on_json(Method::Get, "/rooms", 200, json!([]));

        let matched = transport.execute(get("http://x/api/rooms?hotelId=3")).await;
        assert_eq!(matched.map(|r| r.status), Ok(200));

        let missing = transport.execute(get("http://x/api/rates")).await;
        assert_eq!(missing.map(|r| r.status), Ok(404));
        assert_eq!(transport.requests_to(Method::Get, "/rooms").len(), 1);
    }

    #[tokio::test]
    async fn longest_suffix_wins() {
        let transport = MockTransport::new();
        transport.on_json(Method::Get, "/reservations", 200, json!({"bookings": []}));
        transport.on_json(Method::Get, "/reservations/2", 200, json!({"id": 2}));

        let detail = transport.execute(get("http://x/api/reservations/2")).await;
        assert_eq!(detail.map(|r| r.body), Ok(json!({"id": 2}).to_string()));
    }

    #[tokio::test]
    async fn gate_holds_until_released() {
        let transport = MockTransport::new();
        transport.on_network_error(Method::Get, "/slow");
        let gate = transport.gate(Method::Get, "/slow");

        let pending = tokio::spawn({
            let transport = transport.clone();
            async move { transport.execute(get("http://x/api/slow")).await }
        });

        gate.arrived().await;
        assert!(!pending.is_finished());
        gate.release();

        let result = pending.await.ok();
        assert_eq!(result, Some(Err(TransportError::new("connection refused"))));
    }
}
