use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::adapter::inbound::cli::command::HealthArgs;
use crate::adapter::inbound::cli::output;
use crate::error::{Error, Result};

/// Probe `GET /status` of a running instance; fails unless it answers 2xx.
pub async fn execute_health(args: &HealthArgs) -> Result<()> {
    let url = Url::parse(&args.url)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout.max(1)))
        .build()?;

    let response = client.get(url.clone()).send().await.map_err(|e| {
        output::error(&format!("{url} is unreachable"));
        Error::Unavailable(e.to_string())
    })?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if output::is_json() {
        output::json_output(serde_json::json!({
            "command": "check.health",
            "url": url.as_str(),
            "http_status": status.as_u16(),
            "report": body,
        }));
    } else {
        output::section("Health Check");
        output::field("URL", &url);
        output::field("HTTP", status);
        if let Some(checks) = body.get("checks").and_then(Value::as_array) {
            for check in checks {
                print_check(check);
            }
        }
    }

    if !status.is_success() {
        output::error("Health check failed");
        return Err(Error::Unavailable(format!("{url} answered {status}")));
    }
    output::success("Service is healthy");
    Ok(())
}

fn print_check(check: &Value) {
    let name = check.get("name").and_then(Value::as_str).unwrap_or("?");
    let critical = check
        .get("critical")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let state = check
        .pointer("/status/state")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let label = if critical {
        format!("{name} (critical)")
    } else {
        name.to_string()
    };
    match check.pointer("/status/reason").and_then(Value::as_str) {
        Some(reason) => output::field(&label, format!("{state}: {reason}")),
        None => output::field(&label, state),
    }
}
