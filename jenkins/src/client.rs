//! Jenkins client: lists a job's builds and fetches them in parallel.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::{normalize_host, Config};
use crate::credentials::Credentials;
use crate::pool::{fetch_all, FetchStream, Locator, PoolOptions};
use crate::reorder::Reorder;
use crate::schema::{Build, JobSummary};
use crate::{Error, Result};

/// Builds of a job, in the order Jenkins lists them (newest first).
pub type Builds = Reorder<FetchStream<Build>, Build>;

/// Fetches raw response bodies. Non-success responses must be errors.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, credentials: &Credentials) -> Result<Vec<u8>>;
}

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, credentials: &Credentials) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(url)
            .set("Authorization", &credentials.basic_auth())
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => Error::Status {
                    url: url.to_string(),
                    code,
                },
                ureq::Error::Transport(transport) => Error::Http {
                    url: url.to_string(),
                    message: transport.to_string(),
                },
            })?;

        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        Ok(body)
    }
}

/// Client for one Jenkins host.
pub struct Client<T = HttpTransport> {
    host_url: String,
    credentials: Credentials,
    transport: Arc<T>,
    pool: PoolOptions,
}

impl Client<HttpTransport> {
    /// Build an HTTP client from the resolved configuration.
    pub fn from_config(config: &Config, credentials: Credentials) -> Result<Self> {
        let host_url = config.host_url()?;
        let transport = HttpTransport::new(config.timeout());
        Ok(Client::new(&host_url, credentials, transport).with_pool_options(config.pool_options()))
    }
}

impl<T: Transport + 'static> Client<T> {
    pub fn new(host_url: &str, credentials: Credentials, transport: T) -> Self {
        Self {
            host_url: normalize_host(host_url),
            credentials,
            transport: Arc::new(transport),
            pool: PoolOptions::default(),
        }
    }

    pub fn with_pool_options(mut self, pool: PoolOptions) -> Self {
        self.pool = pool;
        self
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    /// URL of a job. `/` in the name separates folders.
    pub fn job_url(&self, name: &str) -> String {
        let mut url = self.host_url.clone();
        for segment in name.split('/').filter(|s| !s.is_empty()) {
            url.push_str("job/");
            url.push_str(segment);
            url.push('/');
        }
        url
    }

    /// Resolve a job into the API locators of its builds, in listing order.
    pub fn list_builds(&self, job: &str) -> Result<Vec<Locator>> {
        let url = format!("{}api/json", self.job_url(job));
        let summary: JobSummary = get_json(self.transport.as_ref(), &self.credentials, &url)?;
        info!(job, builds = summary.builds.len(), "listed job builds");

        Ok(summary
            .builds
            .into_iter()
            .map(|build| build_api_url(&build.url))
            .collect())
    }

    /// Fetch a single build.
    pub fn build(&self, locator: &str) -> Result<Build> {
        get_json(self.transport.as_ref(), &self.credentials, locator)
    }

    /// Fetch every build of `job` in parallel, preserving listing order.
    ///
    /// Fails only if the job cannot be listed; per-build failures are
    /// reported in the corresponding result.
    pub fn job_builds(&self, job: &str) -> Result<Builds> {
        let locators = self.list_builds(job)?;
        Ok(self.fetch_builds(locators)?.ordered())
    }

    /// Fetch the given build locators in parallel, in completion order.
    pub fn fetch_builds(&self, locators: Vec<Locator>) -> Result<FetchStream<Build>> {
        let transport = Arc::clone(&self.transport);
        let credentials = self.credentials.clone();
        fetch_all(
            locators,
            move |url: &str| get_json::<Build, _>(transport.as_ref(), &credentials, url),
            self.pool,
        )
    }
}

fn build_api_url(build_url: &str) -> Locator {
    format!("{}/api/json", build_url.trim_end_matches('/'))
}

/// GET `url` and decode the JSON body.
fn get_json<D, T>(transport: &T, credentials: &Credentials, url: &str) -> Result<D>
where
    D: DeserializeOwned,
    T: Transport + ?Sized,
{
    let body = transport.get(url, credentials)?;
    debug!(url, bytes = body.len(), "fetched");
    serde_json::from_slice(&body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}
