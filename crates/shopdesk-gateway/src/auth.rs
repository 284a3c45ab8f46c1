// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity middleware for the gateway.
//!
//! The upstream authentication layer proxies every request with:
//! 1. `Authorization: Bearer <service_token>` proving the request came through it
//! 2. `X-User-Id` and `X-User-Role` carrying the identity it resolved
//!
//! When no service token is configured, all requests are rejected (fail-closed).

use std::str::FromStr;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use shopdesk_core::{Identity, Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret expected from the upstream layer.
    pub service_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    /// Resolve an identity from already-extracted credentials.
    ///
    /// Shared by the header middleware and the WebSocket handshake.
    pub fn authenticate(
        &self,
        token: Option<&str>,
        user_id: Option<&str>,
        role: Option<&str>,
    ) -> Option<Identity> {
        let Some(expected) = self.service_token.as_deref() else {
            tracing::error!("gateway has no service token configured -- rejecting request");
            return None;
        };
        if token? != expected {
            tracing::debug!("service token mismatch");
            return None;
        }
        let user_id = user_id?.trim().parse::<i64>().ok()?;
        let role = Role::from_str(role?.trim()).ok()?;
        Some(Identity::new(UserId(user_id), role))
    }

    pub fn authenticate_headers(&self, headers: &HeaderMap) -> Option<Identity> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let token = header("authorization").and_then(|v| v.strip_prefix("Bearer "));
        self.authenticate(token, header(USER_ID_HEADER), header(USER_ROLE_HEADER))
    }
}

/// Middleware that resolves the caller's [`Identity`] and stores it as a
/// request extension for the handlers.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match auth.authenticate_headers(request.headers()) {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
