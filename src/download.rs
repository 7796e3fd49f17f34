use crate::config::{user_agent, MAX_REDIRECTS};
use crate::error::KitError;
use anyhow::{Context, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{header, redirect, Client, Response, StatusCode, Url};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// HTTP client used for every request of a run.
///
/// Redirects are disabled here and followed by [`fetch`] so the hop count
/// stays bounded.
pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent())
        .redirect(redirect::Policy::none())
        .build()
        .context("Could not build HTTP client")?;
    Ok(client)
}

/// GET `url`, following redirects, and return the terminal 200 response
/// with its body still unread.
pub async fn fetch(client: &Client, url: &str) -> Result<Response> {
    let token = std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    if token.is_some() {
        tracing::debug!("Using GITHUB_TOKEN");
    }
    fetch_with_token(client, url, token.as_deref()).await
}

pub async fn fetch_with_token(
    client: &Client,
    url: &str,
    token: Option<&str>,
) -> Result<Response> {
    let mut current = Url::parse(url).with_context(|| format!("Invalid download URL: {}", url))?;

    for hop in 0..=MAX_REDIRECTS {
        tracing::debug!("GET {} (hop {})", current, hop);

        let mut request = client.get(current.clone());
        // Credentials stay with the host they were issued for
        if hop == 0 {
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("token {}", token));
            }
        }

        let response = request
            .send()
            .await
            .map_err(|source| KitError::Network { source })?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok());
            if let Some(location) = location {
                let next = current
                    .join(location)
                    .with_context(|| format!("Invalid redirect location: {}", location))?;
                tracing::debug!("{} redirected ({}) to {}", current, status, next);
                current = next;
                continue;
            }
        }

        if status != StatusCode::OK {
            return Err(KitError::HttpStatus {
                status,
                url: current.to_string(),
            }
            .into());
        }

        return Ok(response);
    }

    Err(KitError::TooManyRedirects {
        url: url.to_string(),
        limit: MAX_REDIRECTS,
    }
    .into())
}

/// Stream a response body to `local_path`, returning the number of bytes written.
pub async fn save_response(response: Response, local_path: &Path, show_progress: bool) -> Result<u64> {
    let url = response.url().to_string();
    tracing::debug!("Saving {} to {}", url, local_path.display());
    let total_size = response.content_length().unwrap_or(0);

    let pb = if !show_progress {
        ProgressBar::hidden()
    } else if total_size > 0 {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::with_template(
                "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
        );
        pb
    } else {
        // GitHub streams tarballs chunked, without a length
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template(
            "{msg} {spinner:.green} [{elapsed_precise}] {bytes}",
        )?);
        pb
    };
    pb.set_message("Downloading");

    let mut file = tokio::fs::File::create(local_path)
        .await
        .with_context(|| format!("Could not create {}", local_path.display()))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| KitError::Network { source })?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush().await?;

    pb.finish_and_clear();
    tracing::info!("Downloaded {} bytes to {}", downloaded, local_path.display());
    Ok(downloaded)
}
