//! gRPC Driving Adapter
//!
//! Exposes the dispatch server through the gRPC protocol (Protobuf)

pub mod mappers;
pub mod service;
pub mod unix_socket;

pub use service::HttpCheckService;
pub use unix_socket::serve_on_unix_socket;
