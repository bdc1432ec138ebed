//! Per-client request limiting for the `/api` routes.
//!
//! Clients are keyed by peer IP. Requests without connection info (in-process
//! callers) share one bucket.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::errors::AppError;
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Requests each client may make per window
pub const CLIENT_REQUEST_LIMIT: u32 = 100;

/// Length of the client window in seconds (15 minutes)
pub const CLIENT_WINDOW_SECONDS: u64 = 900;

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl ClientRateLimiter {
    /// Allow a burst of `max_requests`, refilled evenly over `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Take one request slot for `client`; false once its burst is spent
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn limit_clients(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);

    if !limiter.try_acquire(client) {
        warn!(client = %client, path = %request.uri().path(), "Client rate limit exceeded");
        return AppError::too_many_requests(
            "Too many requests from this IP, please try again later",
        )
        .into_response();
    }

    next.run(request).await
}
