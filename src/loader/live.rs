//! Live source: the meta node's dashboard HTTP API.
//!
//! Address handling follows the usual admin-client convention: `--addr` may
//! be a bare `host:port` or a full `http://` / `https://` URL. A bare address
//! is reached over plain HTTP.

use crate::loader::source::TopologySource;
use crate::loader::{ACTORS_PATH, FRAGMENTS_PATH, LoadError, MATERIALIZED_VIEWS_PATH};
use crate::schema::{ActorGroup, Fragment, MaterializedView};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct LiveSource {
    base_url: String,
    client: reqwest::Client,
}

impl LiveSource {
    pub fn new(addr: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url(addr),
            client,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LoadError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        let fetch_err = |e: reqwest::Error| LoadError::Fetch {
            path: path.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(&url).send().await.map_err(fetch_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(fetch_err)?;
        serde_json::from_str(&body).map_err(|source| LoadError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TopologySource for LiveSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch_actor_groups(&self) -> Result<Vec<ActorGroup>, LoadError> {
        self.get_json(ACTORS_PATH).await
    }

    /// Older meta nodes do not serve the fragment listing; a 404 there
    /// yields an empty listing and fragments are derived from actors.
    async fn fetch_fragments(&self) -> Result<Vec<Fragment>, LoadError> {
        match self.get_json(FRAGMENTS_PATH).await {
            Err(LoadError::Status { status: 404, .. }) => {
                tracing::debug!(path = FRAGMENTS_PATH, "optional listing absent");
                Ok(Vec::new())
            }
            res => res,
        }
    }

    async fn fetch_materialized_views(&self) -> Result<Vec<MaterializedView>, LoadError> {
        self.get_json(MATERIALIZED_VIEWS_PATH).await
    }
}

/// Normalize `addr` into a scheme-qualified base URL without a trailing
/// slash.
fn base_url(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}
