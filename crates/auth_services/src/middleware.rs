use actix_web::{
    Error, HttpMessage, HttpRequest, Result,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
};

use crate::jwt::JwtService;
use crate::types::{AuthError, Claims};

/// What the middleware learned about the caller. Stored in request extensions.
#[derive(Debug, Clone)]
pub enum RequestIdentity {
    /// No `Authorization: Bearer` header
    Anonymous,
    /// A token was sent but failed verification
    Rejected,
    /// A valid token
    Verified(Claims),
}

/// Middleware that decodes the bearer token and attaches a `RequestIdentity`
/// to the request. It never rejects a request by itself; the per-route
/// extractors below decide what a missing or invalid identity means.
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    /// Creates the middleware around a configured token service.
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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

        let identity = match bearer_token(req.headers()) {
            None => RequestIdentity::Anonymous,
            Some(token) => match self.jwt_service.verify(token) {
                Ok(claims) => RequestIdentity::Verified(claims),
                Err(_) => {
                    log::debug!("Rejected bearer token on {} {}", req.method(), req.path());
                    RequestIdentity::Rejected
                }
            },
        };
        req.extensions_mut().insert(identity);

        Box::pin(async move { service.call(req).await })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &actix_web::http::header::HeaderMap) -> Option<&str> {
    headers
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn identity_of(req: &HttpRequest) -> RequestIdentity {
    req.extensions()
        .get::<RequestIdentity>()
        .cloned()
        .unwrap_or(RequestIdentity::Anonymous)
}

fn require_claims(req: &HttpRequest) -> Result<Claims, AuthError> {
    match identity_of(req) {
        RequestIdentity::Verified(claims) => Ok(claims),
        RequestIdentity::Anonymous => Err(AuthError::MissingToken),
        RequestIdentity::Rejected => Err(AuthError::InvalidToken),
    }
}

/// Required policy: missing token is 401, invalid token is 403.
pub struct AuthenticatedUser(pub Claims);

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(require_claims(req).map(AuthenticatedUser))
    }
}

/// Admin-required policy: as `AuthenticatedUser`, plus the admin role claim.
pub struct AdminUser(pub Claims);

impl actix_web::FromRequest for AdminUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(require_claims(req).and_then(|claims| {
            claims.ensure_admin()?;
            Ok(AdminUser(claims))
        }))
    }
}

/// Optional policy: a valid token attaches identity, anything else is anonymous.
pub struct OptionalUser(pub Option<Claims>);

impl OptionalUser {
    /// True when the caller carries a valid admin token.
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|claims| claims.is_admin)
    }
}

impl actix_web::FromRequest for OptionalUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = match identity_of(req) {
            RequestIdentity::Verified(claims) => Some(claims),
            _ => None,
        };
        ready(Ok(OptionalUser(claims)))
    }
}
