//! Transport-side TLS state.
//!
//! The TLS handshake and chain verification happen in `rustls` before any
//! call reaches the authenticator. These types carry the outcome to the call:
//! - gRPC: per connection, via [`TlsConnection`] publishing an [`RpcPeer`]
//! - HTTP: per request, via an [`HttpConnection`] extension

mod grpc;
mod http;
mod tls;

pub use self::grpc::{AuthInfo, RpcPeer, TlsConnection};
pub use self::http::HttpConnection;
pub use self::tls::{CertificateSource, TlsConnectionState};
