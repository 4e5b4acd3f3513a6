use super::PlaylistError;
use m3u8_rs::Playlist;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPlaylist {
    /// Absolute segment URLs in playback order.
    Media(Vec<String>),
    /// Absolute URL of the highest-bandwidth variant.
    Master(String),
}

fn join(base: &Url, uri: &str) -> Result<String, PlaylistError> {
    base.join(uri)
        .map(String::from)
        .map_err(|e| PlaylistError::InvalidUrl {
            url: uri.to_string(),
            reason: e.to_string(),
        })
}

pub fn parse_playlist(base: &Url, data: &[u8]) -> Result<ParsedPlaylist, PlaylistError> {
    let playlist = m3u8_rs::parse_playlist_res(data).map_err(|e| PlaylistError::Parse {
        reason: format!("{e:?}"),
    })?;

    match playlist {
        Playlist::MediaPlaylist(media) => {
            let segments = media
                .segments
                .iter()
                .map(|segment| join(base, &segment.uri))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ParsedPlaylist::Media(segments))
        }
        Playlist::MasterPlaylist(master) => {
            let best = master
                .variants
                .iter()
                .filter(|variant| !variant.is_i_frame)
                .max_by_key(|variant| variant.bandwidth)
                .ok_or_else(|| PlaylistError::NoVariants {
                    url: base.to_string(),
                })?;
            Ok(ParsedPlaylist::Master(join(base, &best.uri)?))
        }
    }
}
