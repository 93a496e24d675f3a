//! http-check - scripted HTTP health check, nagios check_http style
//!
//! Builds one check request from the command line, submits it to the
//! http-checkd daemon over its Unix socket and prints the verdict.
//! Exit codes: 0 check passed, 2 check failed, 1 daemon unreachable.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tokio::net::UnixStream;
use tonic::transport::{Endpoint, Uri};
use tower::service_fn;

mod proto {
    pub mod httpcheck {
        tonic::include_proto!("httpcheck");
    }
}

use proto::httpcheck::http_check_client::HttpCheckClient;
use proto::httpcheck::Request;

#[derive(Parser)]
#[command(name = "http-check", version, about = "Easy to use replacement for nagios http_check")]
struct Args {
    /// Protocol to use for the request
    #[arg(long, default_value = "https")]
    protocol: String,

    /// Hostname to use for the request
    #[arg(long)]
    host: String,

    /// Path to use for the request
    #[arg(long, default_value = "")]
    path: String,

    /// Username to use for authentication
    #[arg(short, long, default_value = "")]
    username: String,

    /// Password to use for authentication
    #[arg(short, long, default_value = "")]
    password: String,

    /// List of expected status codes
    #[arg(short = 's', long = "expect-status")]
    expect_status: Vec<u32>,

    /// Expected string in response body
    #[arg(short = 'b', long = "expect-body-string", default_value = "")]
    expect_body_string: String,

    /// Expected regex matching string in response body
    #[arg(short = 'r', long = "expect-body-regex", default_value = "")]
    expect_body_regex: String,

    /// Minimum number of days until certificate expiration
    #[arg(long = "cert-min-expire-days", default_value_t = 0)]
    cert_min_expire_days: u32,

    /// Timeout in seconds for connecting to the check server
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Socket to use to communicate with the server performing the check
    #[arg(long, default_value = "/tmp/http-check.sock")]
    socket_path: String,

    /// Allow invalid TLS certificates (e.g. self signed)
    #[arg(long)]
    insecure: bool,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let socket_path = args.socket_path.clone();
    // the URI is required by the endpoint API but never dialed; the
    // connector below goes straight to the Unix socket
    let channel = Endpoint::try_from("http://[::1]:50051")?
        .connect_timeout(Duration::from_secs(args.timeout))
        .connect_with_connector(service_fn(move |_: Uri| {
            UnixStream::connect(socket_path.clone())
        }))
        .await
        .with_context(|| format!("could not connect to http-checkd on {}", args.socket_path))?;

    let request = Request {
        protocol: args.protocol,
        host: args.host,
        path: args.path,
        username: args.username,
        password: args.password,
        expected_status_code: args.expect_status,
        expected_body: args.expect_body_string,
        expected_body_regex: args.expect_body_regex,
        cert_expire_days: args.cert_min_expire_days,
        debug: args.verbose,
        insecure: args.insecure,
    };

    let mut client = HttpCheckClient::new(channel);
    let response = client
        .check(request)
        .await
        .context("check request failed")?
        .into_inner();

    let (status, exit_code) = if response.success {
        ("OK".green(), 0)
    } else {
        ("CRITICAL".red(), 2)
    };
    println!("{} - {}", status, response.message);

    if !response.debug_message.is_empty() {
        println!("{}", response.debug_message);
    }

    std::process::exit(exit_code);
}
