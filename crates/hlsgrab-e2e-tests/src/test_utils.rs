use futures::future::{BoxFuture, FutureExt};
use hlsgrab_lib::config::HttpConfig;
use hlsgrab_lib::engine::EngineContext;
use hlsgrab_lib::fetch::HttpFetcher;
use hlsgrab_lib::playlist::HttpPlaylistResolver;
use hlsgrab_lib::scratch::ScratchDir;
use hlsgrab_lib::transcode::{TranscodeError, Transcoder};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone, Debug)]
struct Route {
    status: u16,
    body: Vec<u8>,
}

#[derive(Default)]
struct ServerState {
    routes: HashMap<String, Route>,
    hits: HashMap<String, usize>,
}

/// Loopback HTTP/1.1 server serving canned responses by path. Unknown paths
/// get a 404. Runs until the process exits.
#[derive(Clone)]
pub struct MediaServer {
    base_url: String,
    state: Arc<Mutex<ServerState>>,
}

impl MediaServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&accept_state);
                thread::spawn(move || handle(stream, &state));
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.serve_with_status(path, 200, body);
    }

    pub fn serve_with_status(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.state.lock().unwrap().routes.insert(
            path.to_string(),
            Route {
                status,
                body: body.into(),
            },
        );
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Serves a media playlist at `playlist_path` listing `segments` (paths
    /// relative to the playlist) and returns its URL.
    pub fn serve_media_playlist(&self, playlist_path: &str, segments: &[&str]) -> String {
        let mut playlist = String::from(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n#EXT-X-MEDIA-SEQUENCE:0\n",
        );
        for segment in segments {
            playlist.push_str("#EXTINF:4.0,\n");
            playlist.push_str(segment);
            playlist.push('\n');
        }
        playlist.push_str("#EXT-X-ENDLIST\n");
        self.serve(playlist_path, playlist);
        self.url(playlist_path)
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<ServerState>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let route = {
        let mut state = state.lock().unwrap();
        *state.hits.entry(path.clone()).or_default() += 1;
        state.routes.get(&path).cloned().unwrap_or(Route {
            status: 404,
            body: b"not found".to_vec(),
        })
    };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        route.status,
        reason(route.status),
        route.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}

/// Transcoder that copies the container to the output path and records each
/// call.
#[derive(Debug, Default)]
pub struct CopyTranscoder {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl CopyTranscoder {
    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transcoder for CopyTranscoder {
    fn transcode<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<(), TranscodeError>> {
        async move {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            tokio::fs::copy(input, output)
                .await
                .map(|_| ())
                .map_err(|e| TranscodeError::Failed {
                    status: "copy failed".to_string(),
                    stderr: e.to_string(),
                })
        }
        .boxed()
    }
}

/// Context using the real HTTP collaborators with a recording transcoder.
pub fn http_context(scratch: &Path, transcoder: Arc<CopyTranscoder>) -> EngineContext {
    let fetcher = HttpFetcher::new(&HttpConfig::default()).expect("HTTP client");
    let resolver = HttpPlaylistResolver::new(fetcher.client().clone());
    EngineContext::new(
        ScratchDir::at(scratch).expect("scratch dir"),
        Arc::new(resolver),
        Arc::new(fetcher),
        transcoder,
        Default::default(),
    )
}

pub fn segment_body(position: usize, size: usize) -> Vec<u8> {
    (0..size).map(|i| ((position * 31 + i) % 251) as u8).collect()
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("hlsgrab_lib=debug,hlsgrab_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
