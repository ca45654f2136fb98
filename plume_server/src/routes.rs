//! The single RPC endpoint.
//!
//! Every request, whatever its path, lands in [`rpc_endpoint`]. The handler checks the method, reads the body under
//! the configured cap, parses it and hands the result to the [`Dispatcher`].
use actix_web::{
    http::{header::ContentType, Method, StatusCode},
    web,
    HttpRequest,
    HttpResponse,
};
use bytes::BytesMut;
use futures::StreamExt;
use log::*;
use plume_engine::{Dispatcher, RpcReply, UserSink};
use serde_json::Value;

use crate::errors::ServerError;

/// The request body size cap, in bytes. Stored as app data next to the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// Registers the RPC endpoint as the app's default service, so that it answers on every path.
pub fn configure_rpc_service<S>(cfg: &mut web::ServiceConfig, dispatcher: Dispatcher<S>, limit: BodyLimit)
where S: UserSink + Send + Sync + 'static {
    cfg.app_data(web::Data::new(dispatcher))
        .app_data(web::Data::new(limit))
        .default_service(web::to(rpc_endpoint::<S>));
}

pub async fn rpc_endpoint<S>(
    req: HttpRequest,
    payload: web::Payload,
    dispatcher: web::Data<Dispatcher<S>>,
    limit: web::Data<BodyLimit>,
) -> Result<HttpResponse, ServerError>
where
    S: UserSink + Send + Sync + 'static,
{
    if req.method() != Method::POST {
        debug!("💻️ Rejected {} request for {}", req.method(), req.path());
        return Err(ServerError::PostOnly);
    }
    let body = read_body(payload, limit.0).await?;
    let text = std::str::from_utf8(&body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let request = serde_json::from_str::<Value>(text).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let reply = dispatcher.dispatch(request).await;
    trace!("💻️ {} reply for {}", reply.status, req.path());
    Ok(reply_to_response(reply))
}

/// Collects the body chunk by chunk, bailing out as soon as it grows past `limit` bytes.
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<BytesMut, ServerError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            warn!("💻️ Request body exceeded the {limit} byte limit. Dropping it.");
            return Err(ServerError::RequestTooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub fn reply_to_response(reply: RpcReply) -> HttpResponse {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).insert_header(ContentType::json()).body(reply.body.to_string())
}
