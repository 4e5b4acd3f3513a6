use super::{FetchError, FetchResponse, SegmentFetcher};
use crate::config::HttpConfig;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder.build().map_err(|e| FetchError::Client {
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl SegmentFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, FetchError>> {
        async move {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let content_length = response.content_length();

            // Pull the body one chunk at a time so segments never sit fully in memory.
            let body = stream::unfold(Some(response), |state| async move {
                let mut response = state?;
                match response.chunk().await {
                    Ok(Some(chunk)) => Some((Ok(chunk), Some(response))),
                    Ok(None) => None,
                    Err(e) => Some((Err(FetchError::Http(e)), None)),
                }
            })
            .boxed();

            Ok(FetchResponse {
                status,
                content_length,
                body,
            })
        }
        .boxed()
    }
}
