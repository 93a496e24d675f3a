//! HTTP Check Engine
//!
//! A library for running scripted HTTP health checks with support for:
//! - Response assertions (status code, header, body, certificate expiry)
//! - A fixed-size worker pool executing checks concurrently
//! - A gRPC API over a Unix socket for CLI callers

pub mod adapters;
pub mod check;
pub mod server;
pub mod types;

// Generated protobuf types
pub mod proto {
    pub mod httpcheck {
        tonic::include_proto!("httpcheck");

        // Include file descriptor for reflection
        pub const FILE_DESCRIPTOR_SET: &[u8] =
            tonic::include_file_descriptor_set!("proto_descriptor");
    }
}

pub use check::{Assertion, Check, CheckConfig, CheckError, ProbeClient};
pub use server::{DispatchServer, EngineError};
pub use types::{CheckRequest, CheckResponse};
