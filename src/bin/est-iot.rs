// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! EST command-line tool for IoT devices.
//!
//! # Examples
//!
//! ```bash
//! # Fetch the trust anchors and print their fingerprint
//! est-iot --server https://est.company.example:8443 cacerts --out ca.p7
//!
//! # Initial enrollment with a password
//! EST_PASSWORD=device-password est-iot --server https://est.company.example:8443 \
//!     --username iot-device enroll --csr device.csr --out device.p7
//!
//! # Renewal with the current certificate
//! est-iot --config /etc/est/profile.toml reenroll \
//!     --old-cert device.pem --csr renew.csr --out device-new.p7
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use est_iot_client::operations::{cacerts, enroll};
use est_iot_client::{ClientProfile, EstClient, EstClientConfig, EstError, EstResponse};

/// Exit code reported when the server deferred issuance.
const EXIT_PENDING: u8 = 2;

/// EST client for constrained devices
#[derive(Parser)]
#[command(name = "est-iot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Certificate enrollment using EST (RFC 7030)", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a device profile (TOML)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// EST server URL (overrides the profile)
    #[arg(short, long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Username for HTTP Basic authentication
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(long, global = true, env = "EST_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Client certificate for TLS authentication (PEM)
    #[arg(long, global = true, value_name = "PATH", requires = "key")]
    cert: Option<PathBuf>,

    /// Client private key for TLS authentication (PEM)
    #[arg(long, global = true, value_name = "PATH")]
    key: Option<PathBuf>,

    /// CA bundle used to verify the server (PEM)
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "insecure")]
    ca_bundle: Option<PathBuf>,

    /// Skip server certificate verification (testing only)
    #[arg(long, global = true)]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the CA certificate chain
    Cacerts {
        /// Write the response body to this file
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Request an initial certificate
    Enroll {
        /// CSR file (PEM, base64, or DER with --der)
        #[arg(long, value_name = "PATH")]
        csr: PathBuf,

        /// The CSR file is DER and must be base64-encoded first
        #[arg(long)]
        der: bool,

        /// Write the issued certificate to this file
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Renew using the current certificate
    Reenroll {
        /// Certificate being renewed (PEM)
        #[arg(long, value_name = "PATH")]
        old_cert: PathBuf,

        /// Private key of the certificate being renewed (defaults to --key,
        /// then to the profile's key)
        #[arg(long, value_name = "PATH")]
        old_key: Option<PathBuf>,

        /// CSR file (PEM, base64, or DER with --der)
        #[arg(long, value_name = "PATH")]
        csr: PathBuf,

        /// The CSR file is DER and must be base64-encoded first
        #[arg(long)]
        der: bool,

        /// Write the issued certificate to this file
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(EstError::EnrollmentPending { retry_after }) => {
            eprintln!("Enrollment pending, retry in {} seconds", retry_after);
            ExitCode::from(EXIT_PENDING)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: &Cli) -> Result<(), EstError> {
    let config = build_config(cli)?;
    let client = EstClient::new(config)?;

    match &cli.command {
        Commands::Cacerts { out } => {
            let response = client.get_ca_certs().await?;
            let fp = cacerts::fingerprint(response.body());
            println!("SHA-256: {}", cacerts::format_fingerprint(&fp));
            emit(&response, out.as_deref())
        }
        Commands::Enroll { csr, der, out } => {
            let csr = read_csr(csr, *der)?;
            let response = client.simple_enroll(&csr).await?;
            emit(&response, out.as_deref())
        }
        Commands::Reenroll {
            old_cert,
            old_key,
            csr,
            der,
            out,
        } => {
            let csr = read_csr(csr, *der)?;
            let old_cert = std::fs::read(old_cert)?;
            let response = match reenroll_key(old_key.as_deref(), cli.key.as_deref()) {
                Some(path) => {
                    let old_key = std::fs::read(path)?;
                    client
                        .simple_reenroll_with_key(&old_cert, &old_key, &csr)
                        .await?
                }
                None => client.simple_reenroll(&old_cert, &csr).await?,
            };
            emit(&response, out.as_deref())
        }
    }
}

/// Merge the profile (if any) with command-line overrides.
fn build_config(cli: &Cli) -> Result<EstClientConfig, EstError> {
    let mut builder = match &cli.config {
        Some(path) => ClientProfile::from_file(path)?.into_builder()?,
        None => EstClientConfig::builder(),
    };

    if let Some(ref server) = cli.server {
        builder = builder.server_url(server)?;
    }
    if let Some(ref password) = cli.password {
        let username = cli.username.clone().unwrap_or_default();
        builder = builder.http_auth(username, password);
    } else if cli.username.is_some() {
        return Err(EstError::config("--username requires --password or EST_PASSWORD"));
    }
    if let (Some(cert), Some(key)) = (&cli.cert, &cli.key) {
        builder = builder.client_identity_files(cert, key)?;
    }
    if let Some(ref bundle) = cli.ca_bundle {
        builder = builder.trust_explicit(vec![std::fs::read(bundle)?]);
    }
    if cli.insecure {
        builder = builder.trust_any_insecure();
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Key file for re-enrollment: `--old-key`, else the global `--key`.
///
/// `None` leaves the choice to the configured client identity.
fn reenroll_key<'a>(old_key: Option<&'a Path>, key: Option<&'a Path>) -> Option<&'a Path> {
    old_key.or(key)
}

/// Load a CSR as an EST request body.
fn read_csr(path: &Path, der: bool) -> Result<Vec<u8>, EstError> {
    let raw = std::fs::read(path)?;
    if der {
        return Ok(enroll::encode_csr(&raw));
    }
    if cacerts::is_pem(&raw) {
        return enroll::pem_to_body(&raw);
    }
    Ok(raw)
}

/// Write the response body to a file or stdout.
fn emit(response: &EstResponse, out: Option<&Path>) -> Result<(), EstError> {
    tracing::info!(
        "{} returned {} bytes ({}, auth: {})",
        response.operation,
        response.len(),
        response.content_type.as_deref().unwrap_or("no content-type"),
        response.auth_mode
    );

    match out {
        Some(path) => {
            std::fs::write(path, response.body())?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(response.body())),
    }
    Ok(())
}
