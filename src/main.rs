// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! restcall CLI
//!
//! Drives the three library operations from the command line.

use std::env;
use std::process::ExitCode;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::oneshot;

use restcall::{Context, PostData, ResponseResult, RestRequest, RestService, ServiceConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restcall=info".parse().expect("static directive")),
        )
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let ssl = take_flag(&mut args, "--ssl");

    let Some(command) = args.first().cloned() else {
        print_usage();
        return ExitCode::from(1);
    };

    match command.as_str() {
        "get" => {
            if args.len() < 4 {
                eprintln!("Usage: restcall get <host> <port> <endpoint> [name=value ...]");
                return ExitCode::from(1);
            }
            let Some(mut request) = build_request(&args[1], &args[2], ssl, &args[3]) else {
                return ExitCode::from(1);
            };
            for pair in &args[4..] {
                match pair.split_once('=') {
                    Some((name, value)) => request = request.query(name, value),
                    None => {
                        eprintln!("Query parameters must look like name=value: {}", pair);
                        return ExitCode::from(1);
                    }
                }
            }
            run(|service, handler| service.get(&request, handler)).await
        }
        "post-raw" => {
            if args.len() < 5 {
                eprintln!("Usage: restcall post-raw <host> <port> <endpoint> <body>");
                return ExitCode::from(1);
            }
            let Some(request) = build_request(&args[1], &args[2], ssl, &args[3]) else {
                return ExitCode::from(1);
            };
            let data = PostData::text(args[4].clone());
            run(|service, handler| service.post_raw(&request, &data, handler)).await
        }
        "post-form" => {
            if args.len() < 8 {
                eprintln!(
                    "Usage: restcall post-form <host> <port> <endpoint> <field> <filename> <content-type> <file>"
                );
                return ExitCode::from(1);
            }
            let Some(request) = build_request(&args[1], &args[2], ssl, &args[3]) else {
                return ExitCode::from(1);
            };
            let bytes = match std::fs::read(&args[7]) {
                Ok(bytes) => bytes,
                Err(e) => {
                    eprintln!("Failed to read {}: {}", args[7], e);
                    return ExitCode::from(1);
                }
            };
            let data = PostData::file(&args[4], &args[5], &args[6], STANDARD.encode(bytes));
            run(|service, handler| service.post_form(&request, &data, handler)).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("restcall {}", restcall::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"restcall - Non-blocking REST calls

USAGE:
    restcall [--ssl] <COMMAND> [ARGS]

COMMANDS:
    get <host> <port> <endpoint> [name=value ...]
                    Issue a GET with query parameters in the given order
    post-raw <host> <port> <endpoint> <body>
                    POST the body text as-is
    post-form <host> <port> <endpoint> <field> <filename> <content-type> <file>
                    Upload a file as a single multipart/form-data part
    help            Show this help message
    version         Show version information

EXAMPLES:
    restcall get example.com 80 /ping k=1 k=2
    restcall --ssl post-raw api.example.com 443 /v1/echo hello
    restcall post-form localhost 8080 /upload file report.pdf application/pdf ./report.pdf

Set RUST_LOG=restcall=debug for staging and transport details.
"#
    );
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

fn build_request(host: &str, port: &str, ssl: bool, endpoint: &str) -> Option<RestRequest> {
    match port.parse::<u16>() {
        Ok(port) => Some(RestRequest::new(host, port, ssl, endpoint)),
        Err(e) => {
            eprintln!("Invalid port '{}': {}", port, e);
            None
        }
    }
}

type BoxedHandler = Box<dyn FnOnce(ResponseResult, Context) + Send>;

async fn run<F>(dispatch: F) -> ExitCode
where
    F: FnOnce(&RestService, BoxedHandler) -> restcall::Result<()>,
{
    let service = match RestService::new(ServiceConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to create service: {}", e);
            return ExitCode::from(1);
        }
    };

    let (tx, rx) = oneshot::channel();
    let handler: BoxedHandler = Box::new(move |outcome: ResponseResult, _context: Context| {
        let _ = tx.send(outcome);
    });

    if let Err(e) = dispatch(&service, handler) {
        eprintln!("Request rejected: {}", e);
        return ExitCode::from(1);
    }

    match rx.await {
        Ok(Ok(response)) => {
            println!("\n=== Response ===");
            println!("Status: {}", response.status);
            println!("URL: {}", response.url);
            println!("Content-Type: {:?}", response.content_type());
            println!("Size: {} bytes", response.body_len());
            println!("Time: {}ms", response.response_time_ms);
            match response.is_json().then(|| response.json::<serde_json::Value>()) {
                Some(Ok(value)) => match serde_json::to_string_pretty(&value) {
                    Ok(pretty) => println!("\n{}", pretty),
                    Err(_) => println!("\n{}", response.text_lossy()),
                },
                _ => println!("\n{}", response.text_lossy()),
            }

            if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Ok(Err(e)) => {
            eprintln!("Request failed: {}", e);
            ExitCode::from(1)
        }
        Err(_) => {
            eprintln!("Completion handler was never invoked");
            ExitCode::from(1)
        }
    }
}
