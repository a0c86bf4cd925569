//! Page fetching over HTTP.

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;
use std::time::Duration;

use crate::{FetchOutcome, FetchStatus, Task};

/// Fetch the page behind a task. Implementations never retry and never fail the pipeline:
/// every condition is reported through [`FetchStatus`].
pub trait Fetch: Send + Sync {
    fn fetch(&self, task: &Task) -> FetchOutcome;
}

/// Blocking reqwest client with a per-request timeout. One client is shared by all workers.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    fn fetch_status(&self, url: &str) -> FetchStatus {
        let response = match self.client.get(url).send() {
            Ok(r) => r,
            Err(e) => return FetchStatus::TransportError(describe(e)),
        };
        let status = response.status();
        if !status.is_success() {
            return FetchStatus::HttpError(status.as_u16());
        }
        match response.text() {
            Ok(body) => FetchStatus::Ok(body),
            Err(e) => FetchStatus::TransportError(describe(e)),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, task: &Task) -> FetchOutcome {
        debug!("GET {}", task.target_url);
        FetchOutcome {
            task: task.clone(),
            status: self.fetch_status(&task.target_url),
        }
    }
}

/// Full cause chain of a reqwest error (`a: b: c`); reqwest's own Display stops at the top.
fn describe(err: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::new(err))
}
