//! Unix socket support for gRPC adapter

use std::future::Future;
use std::path::Path;

use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::adapters::grpc::HttpCheckService;
use crate::proto::httpcheck::http_check_server::HttpCheckServer;

/// Start the gRPC server on a Unix socket.
///
/// Serves until `shutdown` resolves, then removes the socket file. A stale
/// socket file from a previous run is removed before binding.
pub async fn serve_on_unix_socket<F>(
    socket_path: &str,
    service: HttpCheckService,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()>,
{
    let path = Path::new(socket_path);

    // Remove socket file if it already exists
    if path.exists() {
        info!("Removing existing socket file: {}", socket_path);
        std::fs::remove_file(path)?;
    }

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            info!("Creating socket directory: {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }

    // Bind Unix listener
    let listener = UnixListener::bind(socket_path)?;

    // Set appropriate permissions (0660 - owner and group can read/write)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o660);
        std::fs::set_permissions(socket_path, permissions)?;
    }

    info!("gRPC server listening on Unix socket: {}", socket_path);

    // Build reflection service for grpcurl support
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(crate::proto::httpcheck::FILE_DESCRIPTOR_SET)
        .build()?;

    // Serve on Unix socket with reflection
    Server::builder()
        .add_service(HttpCheckServer::new(service))
        .add_service(reflection_service)
        .serve_with_incoming_shutdown(UnixListenerStream::new(listener), shutdown)
        .await?;

    // Cleanup socket on exit
    if path.exists() {
        warn!("Cleaning up socket file: {}", socket_path);
        let _ = std::fs::remove_file(path);
    }

    Ok(())
}
