//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

async fn get(url: &str) -> Result<reqwest::Response> {
    reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to m3d at {}; is it running?", url))
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    get(url)
        .await?
        .error_for_status()?
        .json::<T>()
        .await
        .context("failed to parse response")
}

/// Like `get_json`, but a 404 is `None` rather than an error.
pub async fn get_json_opt<T: for<'de> Deserialize<'de>>(url: &str) -> Result<Option<T>> {
    let resp = get(url).await?;
    if resp.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let body = resp
        .error_for_status()?
        .json::<T>()
        .await
        .context("failed to parse response")?;
    Ok(Some(body))
}
