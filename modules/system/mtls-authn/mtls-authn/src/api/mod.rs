//! Transport adapters exposing the authenticator to `tonic` and `axum`.

pub mod grpc;
pub mod rest;
