//  FETCH.rs
//    by the kiln authors
//
//  Created:
//    10 Mar 2026, 11:18:40
//  Last edited:
//    11 Oct 2026, 10:30:16
//  Auto updated?
//    Yes
//
//  Description:
//!   Downloads the source archive and checks its digest.
//

use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};
use sha2::{Digest, Sha256};
use tokio::fs as tfs;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

use crate::errors::FetchError;


/***** TESTS *****/
#[cfg(test)]
pub(crate) mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Spawns a throwaway HTTP server that answers exactly one request with the given status line and body.
    ///
    /// # Returns
    /// The URL to request.
    pub(crate) async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await.unwrap();
            let head = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", status, body.len());
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{}/linux-6.8.tar.xz", addr)
    }

    #[tokio::test]
    async fn http_fetch_ok() {
        let dir  = tempfile::tempdir().unwrap();
        let url  = serve_once("200 OK", b"archive bytes").await;
        let path = dir.path().join("linux-6.8.tar.xz");
        HttpFetcher::new().fetch(&url, &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn http_fetch_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once("404 Not Found", b"nope").await;
        match HttpFetcher::new().fetch(&url, &dir.path().join("linux-6.8.tar.xz")).await {
            Err(FetchError::StatusError{ status }) => assert_eq!(status, reqwest::StatusCode::NOT_FOUND),
            other => panic!("Expected StatusError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn digest_matches_known_value() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(sha256_file(&path).await.unwrap(), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}





/***** LIBRARY *****/
/// Downloads a URL to a file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads the given URL to the given path.
    ///
    /// # Arguments
    /// - `url`: The URL to download.
    /// - `path`: The path of the file to write the response body to.
    ///
    /// # Errors
    /// This function errors if the request could not be made, did not result in a 200 OK or the body could not be written.
    async fn fetch(&self, url: &str, path: &Path) -> Result<(), FetchError>;
}



/// The Fetcher that performs one plain HTTP(S) GET, without retries.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    /// The client to download with.
    client : reqwest::Client,
}

impl HttpFetcher {
    /// Constructor for the HttpFetcher.
    #[inline]
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        info!("Downloading '{}'...", url);
        let mut res: reqwest::Response = match self.client.get(url).send().await {
            Ok(res)  => res,
            Err(err) => { return Err(FetchError::RequestError{ err }); },
        };
        if res.status() != reqwest::StatusCode::OK {
            return Err(FetchError::StatusError{ status: res.status() });
        }

        let mut handle: tfs::File = match tfs::File::create(path).await {
            Ok(handle) => handle,
            Err(err)   => { return Err(FetchError::FileCreateError{ path: path.into(), err }); },
        };
        let mut total: u64 = 0;
        while let Some(chunk) = match res.chunk().await {
            Ok(chunk) => chunk,
            Err(err)  => { return Err(FetchError::DownloadError{ err }); },
        } {
            total += chunk.len() as u64;
            if let Err(err) = handle.write_all(&chunk).await {
                return Err(FetchError::FileWriteError{ path: path.into(), err });
            }
        }
        if let Err(err) = handle.flush().await {
            return Err(FetchError::FileWriteError{ path: path.into(), err });
        }

        debug!("Downloaded {} bytes to '{}'", total, path.display());
        Ok(())
    }
}



/// Computes the hex-encoded SHA-256 digest of the given file.
///
/// # Errors
/// This function errors if the file could not be read.
pub async fn sha256_file(path: impl AsRef<Path>) -> Result<String, FetchError> {
    let path: &Path = path.as_ref();
    debug!("Hashing '{}'...", path.display());

    let mut handle: tfs::File = match tfs::File::open(path).await {
        Ok(handle) => handle,
        Err(err)   => { return Err(FetchError::FileReadError{ path: path.into(), err }); },
    };

    let mut hasher : Sha256 = Sha256::new();
    let mut buf    : [u8; 1024 * 16] = [0; 1024 * 16];
    loop {
        let n_bytes: usize = match handle.read(&mut buf).await {
            Ok(n_bytes) => n_bytes,
            Err(err)    => { return Err(FetchError::FileReadError{ path: path.into(), err }); },
        };
        if n_bytes == 0 { break; }
        hasher.update(&buf[..n_bytes]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
