use super::{ParsedPlaylist, PlaylistError, PlaylistResolver, parse_playlist};
use futures::future::{BoxFuture, FutureExt};
use url::Url;

/// Resolves playlists over HTTP. A master playlist is followed to its
/// highest-bandwidth variant, one level deep.
#[derive(Clone, Debug)]
pub struct HttpPlaylistResolver {
    client: reqwest::Client,
}

impl HttpPlaylistResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_and_parse(&self, url: &Url) -> Result<ParsedPlaylist, PlaylistError> {
        let fetch_error = |e: reqwest::Error| PlaylistError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        tracing::debug!(url = %url, "Fetching playlist");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaylistError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(fetch_error)?;
        parse_playlist(url, &body)
    }
}

impl PlaylistResolver for HttpPlaylistResolver {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<String>, PlaylistError>> {
        async move {
            let url = Url::parse(url).map_err(|e| PlaylistError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

            match self.fetch_and_parse(&url).await? {
                ParsedPlaylist::Media(segments) => Ok(segments),
                ParsedPlaylist::Master(variant) => {
                    tracing::info!(master = %url, variant = %variant, "Following master playlist variant");
                    let variant = Url::parse(&variant).map_err(|e| PlaylistError::InvalidUrl {
                        url: variant.clone(),
                        reason: e.to_string(),
                    })?;
                    match self.fetch_and_parse(&variant).await? {
                        ParsedPlaylist::Media(segments) => Ok(segments),
                        ParsedPlaylist::Master(_) => Err(PlaylistError::NestedMaster {
                            url: variant.to_string(),
                        }),
                    }
                }
            }
        }
        .boxed()
    }
}
