//! HTTP probe transport
//!
//! One `ProbeClient` holds a pre-built TLS connector and the timeouts baked
//! in at pool startup. Connections are established manually (TCP, then an
//! optional TLS handshake) so the peer certificate can be captured before
//! the HTTP exchange runs over `hyper`.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use http::header::HOST;
use http::{HeaderMap, Method, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time;
use tracing::warn;
use x509_cert::der::Decode;

use super::CheckError;

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// HTTP client used by workers to execute probes. Cheap to share; holds no
/// connection state between probes.
pub struct ProbeClient {
    tls: tokio_native_tls::TlsConnector,
    timeout: Duration,
    tls_handshake_timeout: Duration,
}

impl ProbeClient {
    /// Builds a client with fixed timeouts. `insecure` disables certificate
    /// and hostname verification (self-signed endpoints).
    pub fn new(
        timeout: Duration,
        tls_handshake_timeout: Duration,
        insecure: bool,
    ) -> Result<Self, native_tls::Error> {
        let mut builder = native_tls::TlsConnector::builder();
        builder.danger_accept_invalid_certs(insecure);
        builder.danger_accept_invalid_hostnames(insecure);
        let tls = builder.build()?;

        Ok(Self {
            tls: tokio_native_tls::TlsConnector::from(tls),
            timeout,
            tls_handshake_timeout,
        })
    }

    /// Issues a GET request and returns status, headers, the (unread)
    /// response body and the peer certificate expiry when TLS was used.
    pub async fn get(&self, url: &Uri, headers: &HeaderMap) -> Result<ProbeResponse, CheckError> {
        let host = url
            .host()
            .ok_or_else(|| CheckError::InvalidUrl(format!("missing host in '{url}'")))?
            .to_string();
        let scheme = url.scheme_str().unwrap_or("http");
        if !SUPPORTED_SCHEMES.contains(&scheme) {
            return Err(CheckError::InvalidUrl(format!(
                "unsupported scheme '{scheme}'"
            )));
        }

        let port = url
            .port_u16()
            .unwrap_or(if scheme == "https" { 443 } else { 80 });
        let endpoint = format!("{host}:{port}");
        let request = build_request(url, headers)?;

        let stream = match time::timeout(self.timeout, TcpStream::connect(&endpoint)).await {
            Err(_) => return Err(CheckError::Timeout(self.timeout)),
            Ok(connected) => connected.map_err(|e| CheckError::Transport(e.to_string()))?,
        };

        if scheme == "https" {
            let tls_stream =
                match time::timeout(self.tls_handshake_timeout, self.tls.connect(&host, stream))
                    .await
                {
                    Err(_) => return Err(CheckError::Timeout(self.tls_handshake_timeout)),
                    Ok(connected) => {
                        connected.map_err(|e| CheckError::Transport(e.to_string()))?
                    }
                };
            let cert_not_after = peer_cert_not_after(&tls_stream);
            let response = self.exchange(tls_stream, request).await?;
            Ok(ProbeResponse::from_hyper(response, cert_not_after))
        } else {
            let response = self.exchange(stream, request).await?;
            Ok(ProbeResponse::from_hyper(response, None))
        }
    }

    async fn exchange<T>(
        &self,
        io: T,
        request: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Incoming>, CheckError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sender, conn) = http1::handshake(TokioIo::new(io))
            .await
            .map_err(|e| CheckError::Transport(e.to_string()))?;
        tokio::spawn(async move {
            let _ = conn.await;
        });

        match time::timeout(self.timeout, sender.send_request(request)).await {
            Err(_) => Err(CheckError::Timeout(self.timeout)),
            Ok(response) => response.map_err(|e| CheckError::Transport(e.to_string())),
        }
    }
}

fn build_request(url: &Uri, headers: &HeaderMap) -> Result<http::Request<Full<Bytes>>, CheckError> {
    let path = url
        .path_and_query()
        .map(|p| p.as_str())
        .filter(|p| !p.is_empty())
        .unwrap_or("/");
    let authority = url.authority().map(|a| a.as_str()).unwrap_or_default();

    let mut request = http::Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(HOST, authority)
        .body(Full::new(Bytes::new()))
        .map_err(|e| CheckError::InvalidUrl(e.to_string()))?;

    for (name, value) in headers {
        request.headers_mut().append(name, value.clone());
    }

    Ok(request)
}

fn peer_cert_not_after(stream: &tokio_native_tls::TlsStream<TcpStream>) -> Option<SystemTime> {
    let cert = match stream.get_ref().peer_certificate() {
        Ok(cert) => cert?,
        Err(err) => {
            warn!("could not read peer certificate: {}", err);
            return None;
        }
    };

    let der = match cert.to_der() {
        Ok(der) => der,
        Err(err) => {
            warn!("could not encode peer certificate: {}", err);
            return None;
        }
    };

    match x509_cert::Certificate::from_der(&der) {
        Ok(parsed) => Some(parsed.tbs_certificate.validity.not_after.to_system_time()),
        Err(err) => {
            warn!("could not parse peer certificate: {}", err);
            None
        }
    }
}

/// Result of one probe. The body is only read when an assertion asks for it.
pub struct ProbeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Expiry of the leaf peer certificate; `None` without a TLS session
    pub cert_not_after: Option<SystemTime>,
    /// Reason phrase from the wire, kept only when it is non-canonical
    reason: Option<String>,
    body: Option<Incoming>,
    text: Option<String>,
}

impl ProbeResponse {
    fn from_hyper(response: http::Response<Incoming>, cert_not_after: Option<SystemTime>) -> Self {
        let (parts, body) = response.into_parts();
        let reason = parts
            .extensions
            .get::<hyper::ext::ReasonPhrase>()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned());
        Self {
            status: parts.status,
            headers: parts.headers,
            cert_not_after,
            reason,
            body: Some(body),
            text: None,
        }
    }

    /// "404 Not Found" style status line, echoing the reason phrase the
    /// server actually sent.
    pub(crate) fn status_line(&self) -> String {
        let code = self.status.as_u16();
        match self
            .reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
        {
            Some(reason) => format!("{code} {reason}"),
            None => code.to_string(),
        }
    }

    /// Reads the full response body, caching it for later assertions.
    pub(crate) async fn body_text(&mut self) -> Result<&str, CheckError> {
        if self.text.is_none() {
            let body = self
                .body
                .take()
                .ok_or_else(|| CheckError::BodyRead("body already consumed".to_string()))?;
            let bytes = body
                .collect()
                .await
                .map_err(|e| CheckError::BodyRead(e.to_string()))?
                .to_bytes();
            self.text = Some(String::from_utf8_lossy(&bytes).into_owned());
        }

        Ok(self.text.as_deref().unwrap_or_default())
    }

    #[cfg(test)]
    pub(crate) fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    #[cfg(test)]
    pub(crate) fn fixture(
        status: StatusCode,
        headers: HeaderMap,
        cert_not_after: Option<SystemTime>,
        text: Option<&str>,
    ) -> Self {
        Self {
            status,
            headers,
            cert_not_after,
            reason: None,
            body: None,
            text: text.map(str::to_string),
        }
    }
}
