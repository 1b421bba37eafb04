/// JWT Authentication Middleware
///
/// Verifies the bearer access token on every request of the wrapped scope
/// and injects the [`Principal`] into request extensions. No store lookup
/// happens here: access tokens stay valid until they expire.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Principal, TokenCodec, TokenKind};
use crate::error::{AppError, AuthError};

/// Middleware for protecting routes
pub struct JwtMiddleware {
    codec: TokenCodec,
}

impl JwtMiddleware {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            codec: self.codec.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    codec: TokenCodec,
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// No header at all is `Ok(None)`; a header in any other shape is an
/// invalid token rather than a missing one.
fn bearer_token(req: &ServiceRequest) -> Result<Option<String>, AppError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(header) => header,
        None => return Ok(None),
    };

    header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| Some(token.to_string()))
        .ok_or(AppError::Auth(AuthError::TokenInvalid))
}

/// Resolve the request's principal, or the reason it has none
pub fn authenticate(codec: &TokenCodec, token: Option<&str>) -> Result<Principal, AppError> {
    let token = token.ok_or(AppError::Auth(AuthError::MissingToken))?;
    let claims = codec.verify(TokenKind::Access, token)?;
    Principal::try_from(&claims)
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
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
        let principal = bearer_token(&req)
            .and_then(|token| authenticate(&self.codec, token.as_deref()));

        match principal {
            Ok(principal) => {
                tracing::debug!(user_id = %principal.user_id, "Access token verified");
                req.extensions_mut().insert(principal);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), "Request rejected by gate: {}", e);
                let error: Error = e.into();
                Box::pin(async move { Err(error) })
            }
        }
    }
}
