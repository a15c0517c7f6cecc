/// HTTP middleware utilities for post-service
///
/// Authentication itself happens upstream: the gateway verifies the caller
/// and forwards the user identifier in a trusted header. `UserContext`
/// lifts that header into request extensions so handlers can take a
/// `UserId`. `RequestTiming` logs per-request latency.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

use crate::error::AppError;

// =====================================================================
// User context
// =====================================================================

/// Authenticated user identifier stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Actix middleware that reads the user identifier forwarded by the gateway.
///
/// Requests without the header pass through untouched; it is up to each
/// handler whether a missing user is an error.
#[derive(Clone)]
pub struct UserContext {
    header: Rc<str>,
}

impl UserContext {
    pub fn new(header: &str) -> Self {
        Self {
            header: Rc::from(header),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for UserContext
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = UserContextService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(UserContextService {
            service: Rc::new(service),
            header: self.header.clone(),
        }))
    }
}

pub struct UserContextService<S> {
    service: Rc<S>,
    header: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for UserContextService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user_id = req
            .headers()
            .get(&*self.header)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()));

        if let Some(user_id) = user_id {
            req.extensions_mut().insert(user_id);
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Unauthenticated".to_string()).into()),
        )
    }
}

// =====================================================================
// Request timing
// =====================================================================

pub struct RequestTiming;

impl<S, B> Transform<S, ServiceRequest> for RequestTiming
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimingService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestTimingService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestTimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed().as_millis();
            let status = res.as_ref().map(|r| r.status().as_u16()).unwrap_or(500);
            tracing::debug!(%method, %path, status, %elapsed, "request completed");
            res
        })
    }
}
