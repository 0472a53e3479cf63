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

//! Simple EST enrollment example.
//!
//! Fetches the CA certificates, then enrolls with a CSR read from disk using
//! HTTP Basic credentials.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example simple_enroll -- --server https://est.example.com:8443 \
//!     --user iot-device --pass device-password --csr device.csr
//! ```

use std::env;
use std::process::exit;

use est_iot_client::operations::{cacerts, enroll};
use est_iot_client::{EstClient, EstClientConfig, EstError};

fn arg<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let server_url = arg(&args, "--server").unwrap_or("https://testrfc7030.com:8443");
    let username = arg(&args, "--user").unwrap_or("estuser");
    let password = arg(&args, "--pass").unwrap_or("estpwd");
    let csr_path = arg(&args, "--csr");

    println!("EST Client Example");
    println!("==================");
    println!("Server: {}", server_url);
    println!();

    let builder = match EstClientConfig::builder().server_url(server_url) {
        Ok(b) => b.trust_any_insecure(), // For testing only!
        Err(e) => {
            eprintln!("Failed to parse server URL: {}", e);
            exit(1);
        }
    };

    let config = match builder.http_auth(username, password).build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build config: {}", e);
            exit(1);
        }
    };

    let client = match EstClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create EST client: {}", e);
            exit(1);
        }
    };

    // Step 1: Get CA certificates
    println!("Step 1: Fetching CA certificates...");
    match client.get_ca_certs().await {
        Ok(response) => {
            let fp = cacerts::fingerprint(response.body());
            println!("  Retrieved {} bytes", response.len());
            println!("  SHA-256: {}", cacerts::format_fingerprint(&fp));
        }
        Err(e) => {
            eprintln!("  Failed to get CA certs: {}", e);
            // Continue anyway for demonstration
        }
    }
    println!();

    let Some(csr_path) = csr_path else {
        println!("No --csr given, skipping enrollment");
        return;
    };

    // Step 2: Enroll for certificate
    println!("Step 2: Enrolling for certificate...");
    let csr = match std::fs::read(csr_path)
        .map_err(EstError::from)
        .and_then(|pem| enroll::pem_to_body(&pem))
    {
        Ok(csr) => csr,
        Err(e) => {
            eprintln!("  Failed to read CSR: {}", e);
            exit(1);
        }
    };

    match client.simple_enroll(&csr).await {
        Ok(response) => {
            println!("  Certificate issued successfully!");
            println!("  Content-Type: {:?}", response.content_type);
            println!("  {} bytes, auth: {}", response.len(), response.auth_mode);
        }
        Err(EstError::EnrollmentPending { retry_after }) => {
            println!("  Enrollment pending manual approval");
            println!("  Retry after: {} seconds", retry_after);
        }
        Err(e) => {
            eprintln!("  Enrollment failed: {}", e);
            exit(1);
        }
    }

    println!();
    println!("Done!");
}
