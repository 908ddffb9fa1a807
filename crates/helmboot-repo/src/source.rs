//! Where release archives come from
//!
//! An [`ArchiveSource`] yields a fresh byte stream per call to `open`. The
//! stream is handed straight to extraction, so nothing is buffered here.

use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use url::Url;

use crate::error::{RepoError, Result};

/// A location an archive can be streamed from
pub trait ArchiveSource {
    /// Human readable location for logs and errors
    fn location(&self) -> String;

    /// Open a new stream over the archive bytes
    fn open(&self) -> Result<Box<dyn Read>>;
}

/// Archive served over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: Url,
}

impl HttpSource {
    /// Create a source for `url`
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| RepoError::InvalidSource {
            location: url.to_string(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self { url: parsed }),
            other => Err(RepoError::InvalidSource {
                location: url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .user_agent(concat!("helmboot/", env!("CARGO_PKG_VERSION")))
            // Release archives are large; only the caller decides when to give up
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|e| RepoError::NetworkError {
                url: self.url.to_string(),
                message: e.to_string(),
            })
    }
}

impl ArchiveSource for HttpSource {
    fn location(&self) -> String {
        self.url.to_string()
    }

    fn open(&self) -> Result<Box<dyn Read>> {
        tracing::info!("Downloading {}", self.url);
        let response = self
            .client()?
            .get(self.url.clone())
            .send()
            .map_err(|e| RepoError::NetworkError {
                url: self.url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            tracing::debug!("Response body is {} bytes", length);
        }
        Ok(Box::new(TransferStream {
            url: self.url.to_string(),
            inner: response,
        }))
    }
}

/// A response body whose read failures carry the URL being fetched.
///
/// The failure travels inside the `io::Error` through decompression and
/// extraction; [`transfer_failure`] recovers it on the other side.
struct TransferStream<R> {
    url: String,
    inner: R,
}

impl<R: Read> Read for TransferStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| {
            io::Error::new(
                e.kind(),
                RepoError::NetworkError {
                    url: self.url.clone(),
                    message: e.to_string(),
                },
            )
        })
    }
}

/// The network failure behind an I/O error raised while reading a source
/// stream, if there is one.
///
/// Readers layered on top of the stream (decoders, tar) may wrap the error
/// again, so nested `io::Error`s are unwrapped along the way.
pub fn transfer_failure(err: &io::Error) -> Option<RepoError> {
    let mut current: Option<&(dyn StdError + 'static)> = err.get_ref().map(|e| e as _);
    while let Some(e) = current {
        if let Some(RepoError::NetworkError { url, message }) = e.downcast_ref::<RepoError>() {
            return Some(RepoError::NetworkError {
                url: url.clone(),
                message: message.clone(),
            });
        }
        current = match e.downcast_ref::<io::Error>() {
            Some(io) => io.get_ref().map(|inner| inner as _),
            None => e.source(),
        };
    }
    None
}

/// Archive on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

}

impl ArchiveSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Read>> {
        tracing::info!("Reading archive {}", self.path.display());
        let file = File::open(&self.path).map_err(|source| RepoError::LocalArchive {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Pick the source for a download location.
///
/// `http`/`https` URLs are fetched over the network, `file` URLs and plain
/// paths are read from disk.
pub fn source_for(location: &str) -> Result<Box<dyn ArchiveSource>> {
    match Url::parse(location) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(Box::new(HttpSource { url })),
            "file" => {
                let path = url.to_file_path().map_err(|()| RepoError::InvalidSource {
                    location: location.to_string(),
                    reason: "not a local file URL".to_string(),
                })?;
                Ok(Box::new(FileSource::new(path)))
            }
            // Windows drive letters parse as a one-letter scheme
            scheme if scheme.len() == 1 => Ok(Box::new(FileSource::new(location))),
            other => Err(RepoError::InvalidSource {
                location: location.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Box::new(FileSource::new(location))),
        Err(e) => Err(RepoError::InvalidSource {
            location: location.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn read_all(source: &dyn ArchiveSource) -> Result<Vec<u8>> {
        let mut reader = source.open()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_source_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helm-v2.17.0-linux-amd64.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/helm-v2.17.0-linux-amd64.tar.gz", server.uri());
        let body = tokio::task::spawn_blocking(move || {
            let source = HttpSource::new(&url)?;
            read_all(&source)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(body, b"archive bytes");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_error_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<html>missing</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/missing.tar.gz", server.uri());
        let expected_url = url.clone();
        let err = tokio::task::spawn_blocking(move || {
            let source = HttpSource::new(&url)?;
            source.open().map(|_| ())
        })
        .await
        .unwrap()
        .unwrap_err();

        match err {
            RepoError::HttpError { status, url } => {
                assert_eq!(status, 404);
                assert_eq!(url, expected_url);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct FailingAfter {
        remaining: usize,
    }

    impl Read for FailingAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
            }
            let n = self.remaining.min(buf.len());
            buf[..n].fill(0x1f);
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_interrupted_transfer_names_url() {
        let mut stream = TransferStream {
            url: "https://get.helm.sh/helm.tar.gz".to_string(),
            inner: FailingAfter { remaining: 4 },
        };
        let mut buf = Vec::new();
        let err = stream.read_to_end(&mut buf).unwrap_err();
        assert_eq!(buf.len(), 4);
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);

        // Wrapped once more, the way tar reports a failed block read
        let wrapped = io::Error::other(err);
        match transfer_failure(&wrapped) {
            Some(RepoError::NetworkError { url, message }) => {
                assert_eq!(url, "https://get.helm.sh/helm.tar.gz");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_transfer_failure_ignores_plain_io_errors() {
        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "early eof");
        assert!(transfer_failure(&err).is_none());
        assert!(transfer_failure(&io::Error::other(err)).is_none());
    }

    #[test]
    fn test_http_source_rejects_other_schemes() {
        assert!(HttpSource::new("ftp://example.com/helm.tgz").is_err());
        assert!(HttpSource::new("not a url").is_err());
    }

    #[test]
    fn test_file_source() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("helm.tar.gz");
        std::fs::write(&archive, b"local bytes").unwrap();

        let source = source_for(archive.to_str().unwrap()).unwrap();
        assert_eq!(read_all(source.as_ref()).unwrap(), b"local bytes");

        let url = Url::from_file_path(&archive).unwrap();
        let source = source_for(url.as_str()).unwrap();
        assert_eq!(source.location(), archive.display().to_string());
        assert_eq!(read_all(source.as_ref()).unwrap(), b"local bytes");
    }

    #[test]
    fn test_missing_file_names_path() {
        let source = FileSource::new("/nonexistent/helm.tar.gz");
        let err = source.open().map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/helm.tar.gz"));
    }

    #[test]
    fn test_source_for_dispatch() {
        let http = source_for("https://get.helm.sh/helm-v2.17.0-linux-amd64.tar.gz").unwrap();
        assert_eq!(
            http.location(),
            "https://get.helm.sh/helm-v2.17.0-linux-amd64.tar.gz"
        );

        let relative = source_for("downloads/helm.tar.gz").unwrap();
        assert_eq!(relative.location(), "downloads/helm.tar.gz");

        assert!(source_for("s3://bucket/helm.tar.gz").is_err());
    }
}
