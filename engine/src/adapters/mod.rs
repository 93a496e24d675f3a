//! Driving adapters exposing the dispatch server to external callers

pub mod grpc;
