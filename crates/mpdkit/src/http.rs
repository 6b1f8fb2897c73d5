use std::{future::Future, ops::Deref};

use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::{
    error::{MpdError, MpdResult},
    xlink::Fetcher,
};

/// A [`Fetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(builder: ClientBuilder) -> MpdResult<Self> {
        let client = builder.build().map_err(|e| MpdError::Fetch {
            uri: String::new(),
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }
}

impl From<Client> for HttpFetcher {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

impl Deref for HttpFetcher {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, uri: &Url) -> impl Future<Output = MpdResult<Bytes>> + Send {
        let request = self.client.get(uri.clone());
        let uri = uri.to_string();
        async move {
            let fetch_error = |reason: String| MpdError::Fetch {
                uri: uri.clone(),
                reason,
            };

            let response = request.send().await.map_err(|e| fetch_error(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                if let Ok(body) = response.text().await {
                    tracing::warn!("Error body: {body}");
                }
                return Err(fetch_error(format!("HTTP status {status}")));
            }
            response.bytes().await.map_err(|e| fetch_error(e.to_string()))
        }
    }
}
