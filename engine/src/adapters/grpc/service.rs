//! gRPC service implementation for the check API

use tonic::{Request, Response, Status};

use crate::adapters::grpc::mappers;
use crate::proto::httpcheck;
use crate::proto::httpcheck::http_check_server::HttpCheck;
use crate::server::DispatchServer;

/// Translates gRPC calls into dispatch-server submissions
pub struct HttpCheckService {
    dispatch: DispatchServer,
}

impl HttpCheckService {
    pub fn new(dispatch: DispatchServer) -> Self {
        Self { dispatch }
    }
}

#[tonic::async_trait]
impl HttpCheck for HttpCheckService {
    async fn check(
        &self,
        request: Request<httpcheck::Request>,
    ) -> Result<Response<httpcheck::Response>, Status> {
        let request = mappers::check_request_from_proto(request.into_inner());
        let response = self.dispatch.submit(request).await;
        Ok(Response::new(mappers::check_response_to_proto(response)))
    }
}
