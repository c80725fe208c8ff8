//! Checksum-verified downloads.
//!
//! The expected digest travels inside the URL as `?checksum=sha256:<hex>`.
//! The parameter is removed before the request is sent, and the body is
//! hashed in memory; a mismatch is reported before a single byte is written
//! to disk.

use reqwest::Url;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, error};
use crate::error::{HvmError, Result};

/// Splits `url` into the request URL and the expected lowercase sha256 digest.
pub fn split_checksum(url: &str) -> Result<(Url, String)> {
    let mut parsed = Url::parse(url)
        .map_err(|e| HvmError::Archive(format!("invalid download url {url}: {e}")))?;

    let mut expected = None;
    let mut rest = Vec::new();
    for (key, value) in parsed.query_pairs() {
        if key == "checksum" {
            expected = Some(value.into_owned());
        } else {
            rest.push((key.into_owned(), value.into_owned()));
        }
    }
    parsed.set_query(None);
    if !rest.is_empty() {
        parsed.query_pairs_mut().extend_pairs(rest);
    }

    let expected = expected
        .ok_or_else(|| HvmError::Archive(format!("refusing to download {url} without a checksum")))?;
    let digest = expected
        .strip_prefix("sha256:")
        .ok_or_else(|| HvmError::Archive(format!("unsupported checksum type in {url}")))?;
    if digest.is_empty() {
        return Err(HvmError::Archive(format!("empty checksum in {url}")));
    }
    Ok((parsed, digest.to_ascii_lowercase()))
}

/// Computes the SHA256 hash of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Downloads `url` and returns the body only if it matches the embedded checksum.
pub fn fetch_verified(client: &Client, url: &str) -> Result<Vec<u8>> {
    let (request_url, expected) = split_checksum(url)?;
    let display_url = request_url.to_string();
    debug!(url = %display_url, expected = %expected, "downloading");

    let response = client
        .get(request_url)
        .send()
        .map_err(|e| HvmError::network(&display_url, e))?;
    if !response.status().is_success() {
        return Err(HvmError::HttpStatus {
            url: display_url,
            status: response.status(),
        });
    }
    let bytes = response
        .bytes()
        .map_err(|e| HvmError::network(&display_url, e))?;

    let actual = sha256_hex(&bytes);
    if actual != expected {
        error!(url = %display_url, expected = %expected, actual = %actual, "checksum mismatch");
        return Err(HvmError::ChecksumMismatch {
            url: display_url,
            expected,
            actual,
        });
    }
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const HELLO_SHA256: &str = "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello world\n"), HELLO_SHA256);
    }

    #[test]
    fn test_split_checksum_removes_parameter() {
        let (url, digest) =
            split_checksum("https://example.com/a/b.zip?x=1&checksum=sha256:ABCDEF").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a/b.zip?x=1");
        assert_eq!(digest, "abcdef");

        let (url, _) = split_checksum("https://example.com/b.zip?checksum=sha256:ab").unwrap();
        assert_eq!(url.as_str(), "https://example.com/b.zip");
    }

    #[test]
    fn test_split_checksum_requires_sha256() {
        assert!(split_checksum("https://example.com/b.zip").is_err());
        assert!(split_checksum("https://example.com/b.zip?checksum=md5:abc").is_err());
        assert!(split_checksum("https://example.com/b.zip?checksum=sha256:").is_err());
    }

    #[test]
    fn test_fetch_verified_accepts_matching_body() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/hello.txt").with_body("hello world\n").create();

        let url = format!("{}/hello.txt?checksum=sha256:{}", server.url(), HELLO_SHA256.to_uppercase());
        let bytes = fetch_verified(&Client::new(), &url).unwrap();
        assert_eq!(bytes, b"hello world\n");
    }

    #[test]
    fn test_fetch_verified_rejects_mismatch() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/hello.txt").with_body("tampered\n").create();

        let url = format!("{}/hello.txt?checksum=sha256:{}", server.url(), HELLO_SHA256);
        let err = fetch_verified(&Client::new(), &url).unwrap_err();
        match err {
            HvmError::ChecksumMismatch { expected, actual, .. } => {
                assert_eq!(expected, HELLO_SHA256);
                assert_eq!(actual, sha256_hex(b"tampered\n"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fetch_verified_reports_status() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/missing.zip").with_status(404).create();

        let url = format!("{}/missing.zip?checksum=sha256:{}", server.url(), HELLO_SHA256);
        assert!(matches!(
            fetch_verified(&Client::new(), &url),
            Err(HvmError::HttpStatus { .. })
        ));
    }
}
