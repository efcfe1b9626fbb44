use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Base URL without a trailing slash
pub fn server_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

/// `<server>/api/users/<identity>/<resource>`, with the identity encoded as a
/// single path segment
pub fn user_resource_url(server: &str, identity: &str, resource: &str) -> anyhow::Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(&server_url(server))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("server URL cannot carry a path: {}", server))?
        .pop_if_empty()
        .extend(["api", "users"])
        .push(identity)
        .push(resource);
    Ok(url)
}

/// Turn an API error envelope into an anyhow error
pub async fn api_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => {
            let message = body["message"].as_str().unwrap_or("request failed");
            let code = body["code"].as_str().unwrap_or("UNKNOWN");
            anyhow::anyhow!("{} ({}): {}", status, code, message)
        }
        Err(_) => anyhow::anyhow!("request failed with status {}", status),
    }
}
