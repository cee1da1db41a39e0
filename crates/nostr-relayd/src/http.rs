// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! HTTP shell
//!
//! One port serves three things: WebSocket upgrades (the relay protocol),
//! the NIP-11 information document for requests carrying
//! `Accept: application/nostr+json`, and a minimal landing page.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use base64::prelude::*;
use hyper::body::Incoming;
use hyper::header::{
    HeaderMap, ACCEPT, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION, CONTENT_TYPE, SEC_WEBSOCKET_ACCEPT,
    SEC_WEBSOCKET_KEY, UPGRADE,
};
use hyper::http::response::Builder;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use nostr_proto::hashes::sha1::Hash as Sha1Hash;
use nostr_proto::hashes::{Hash, HashEngine};

use crate::relay::InnerRelay;

const LANDING_PAGE: &str =
    "<html><body><h1>nostr-relayd</h1><p>Connect with a Nostr client over WebSocket.</p></body></html>";

/// Derive the `Sec-WebSocket-Accept` response header from a
/// `Sec-WebSocket-Key` request header (RFC 6455 §4.2.2).
fn derive_accept_key(request_key: &[u8]) -> String {
    const WS_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
    let mut engine = Sha1Hash::engine();
    engine.input(request_key);
    engine.input(WS_GUID);
    let hash: Sha1Hash = Sha1Hash::from_engine(engine);
    BASE64_STANDARD.encode(hash.to_byte_array())
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let connection: bool = headers
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_lowercase().contains("upgrade"))
        .unwrap_or(false);
    let upgrade: bool = headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);
    connection && upgrade
}

fn wants_relay_information(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/nostr+json"))
        .unwrap_or(false)
}

/// Finish a response, degrading to a plain 500 if the builder is broken
fn build(builder: Builder, body: String) -> Response<String> {
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP response");
        let mut res: Response<String> = Response::new(String::new());
        *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        res
    })
}

pub(crate) struct HttpService {
    relay: InnerRelay,
    remote: SocketAddr,
}

impl HttpService {
    pub fn new(relay: InnerRelay, remote: SocketAddr) -> Self {
        Self { relay, remote }
    }
}

impl Service<Request<Incoming>> for HttpService {
    type Response = Response<String>;
    type Error = std::convert::Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let base: Builder = Response::builder().header("server", "nostr-relayd");

        // WebSocket upgrade: hand the connection over to the relay
        if is_websocket_upgrade(req.headers()) {
            let derived: Option<String> = req
                .headers()
                .get(SEC_WEBSOCKET_KEY)
                .map(|key| derive_accept_key(key.as_bytes()));

            return match derived {
                Some(accept_key) => {
                    let relay: InnerRelay = self.relay.clone();
                    let addr: SocketAddr = self.remote;

                    tokio::spawn(async move {
                        match hyper::upgrade::on(req).await {
                            Ok(upgraded) => {
                                if let Err(e) =
                                    relay.take_connection(TokioIo::new(upgraded), addr).await
                                {
                                    tracing::debug!(addr = %addr, error = %e, "Session exited with error.");
                                }
                            }
                            Err(e) => {
                                tracing::error!(addr = %addr, error = %e, "WebSocket upgrade failed.")
                            }
                        }
                    });

                    Box::pin(async move {
                        Ok(build(
                            base.status(StatusCode::SWITCHING_PROTOCOLS)
                                .header(CONNECTION, "upgrade")
                                .header(UPGRADE, "websocket")
                                .header(SEC_WEBSOCKET_ACCEPT, accept_key),
                            String::new(),
                        ))
                    })
                }
                None => Box::pin(async move {
                    Ok(build(
                        base.status(StatusCode::BAD_REQUEST),
                        String::from("missing Sec-WebSocket-Key header"),
                    ))
                }),
            };
        }

        // NIP-11 relay information document, any origin welcome
        if req.method() == Method::GET && wants_relay_information(req.headers()) {
            let body: String = self.relay.info.as_json();
            return Box::pin(async move {
                Ok(build(
                    base.status(StatusCode::OK)
                        .header(CONTENT_TYPE, "application/nostr+json")
                        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
                        .header(ACCESS_CONTROL_ALLOW_HEADERS, "*")
                        .header(ACCESS_CONTROL_ALLOW_METHODS, "GET"),
                    body,
                ))
            });
        }

        // Landing page otherwise
        Box::pin(async move {
            Ok(build(
                base.status(StatusCode::OK).header(CONTENT_TYPE, "text/html"),
                String::from(LANDING_PAGE),
            ))
        })
    }
}
