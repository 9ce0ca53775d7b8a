//! filedrop server: multipart uploads over HTTP, progress over WebSocket.

pub mod app;
pub mod config;
pub mod multipart;
pub mod routes;
