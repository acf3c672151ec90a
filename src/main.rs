//! raw-http: send one HTTP/1.x request over a raw socket and print the
//! response.
//!
//! Features:
//! - Direct connection or the fixed local proxy
//! - Request text from a file, or a generated GET
//! - Body printing with line limits, truncation or wrapping, and JSON trees
//! - Configuration via CLI arguments or TOML file

use raw_http::config::Config;
use raw_http::connection::{Connector, Handle};
use raw_http::display::{format_data, format_text};
use raw_http::response::split_head;
use raw_http::url::UrlBuilder;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let url = UrlBuilder::new(config.target.host.as_str())
        .protocol("http")
        .port(config.target.port)
        .build(&config.path);

    info!(
        url = %url,
        via_proxy = config.via_proxy,
        proxy = %format!("{}:{}", config.proxy.host, config.proxy.port),
        "Fetching"
    );

    let connector = Connector::new(config.proxy.clone());
    let mut handle = connector
        .connect(&config.target, config.via_proxy)
        .ok_or_else(|| format!("Error connecting to {}", config.target))?;

    send_request(&mut handle, &config)?;
    let response = handle.read_response(config.normalize_eol)?;
    handle.close()?;

    print_response(&response, &config)
}

/// Send the request file, or a GET for the configured path.
fn send_request(handle: &mut Handle, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match config.request_file {
        Some(ref path) => {
            let request = std::fs::read_to_string(path)?;
            debug!(path = %path.display(), bytes = request.len(), "Sending request file");
            handle.send_normalized(&request)?;
        }
        None => {
            let head = format!(
                "GET {} HTTP/1.1\nHost: {}\nConnection: close\n",
                config.path, config.target.host
            );
            debug!(path = %config.path, "Sending GET");
            handle.send_normalized(&head)?;
            handle.send_crlf()?;
        }
    }
    Ok(())
}

fn print_response(response: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (head, body) = split_head(response);
    print!("{}", head);

    let lines = if config.json {
        let value: serde_json::Value = serde_json::from_str(body)?;
        format_data(&value, config.lines, &config.format, config.depth, config.children)?
    } else {
        format_text(body, config.lines, &config.format, false)?
    };

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
