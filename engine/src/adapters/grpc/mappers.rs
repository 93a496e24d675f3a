//! Conversions between protobuf messages and domain types

use crate::proto::httpcheck;
use crate::types::{CheckRequest, CheckResponse};

pub fn check_request_from_proto(proto: httpcheck::Request) -> CheckRequest {
    CheckRequest {
        protocol: proto.protocol,
        host: proto.host,
        path: proto.path,
        username: proto.username,
        password: proto.password,
        expected_status_codes: proto.expected_status_code,
        expected_body: proto.expected_body,
        expected_body_regex: proto.expected_body_regex,
        cert_expire_days: proto.cert_expire_days,
        debug: proto.debug,
        insecure: proto.insecure,
    }
}

pub fn check_response_to_proto(response: CheckResponse) -> httpcheck::Response {
    httpcheck::Response {
        success: response.success,
        message: response.message,
        debug_message: response.debug_message,
    }
}
