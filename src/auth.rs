//! HTTP Digest authentication (RFC 7616, with RFC 2617 and RFC 2069 fallbacks).
//!
//! The client answers at most one challenge per call. Every answer uses a
//! fresh client nonce and a nonce count of `00000001`; no nonce state is kept
//! between calls.
//!
//! [`RequestClient`](crate::RequestClient) drives this module on its own. It
//! is public for callers that need to answer a digest challenge outside of a
//! `RequestClient`, for example over another transport:
//!
//! ```
//! use digestcall::auth::DigestChallenge;
//! use digestcall::Credentials;
//! use http::Method;
//!
//! let challenge = DigestChallenge::parse(
//!     r#"Digest realm="api", qop="auth", nonce="dcd98b7102dd2f0e""#,
//! )?;
//! let header = challenge.authorization(
//!     &Credentials::new("alice", "secret"),
//!     &Method::GET,
//!     "/api/todos",
//!     b"",
//! )?;
//!
//! assert!(header.starts_with("Digest username=\"alice\", realm=\"api\""));
//! assert!(header.contains("qop=auth"));
//! # Ok::<(), digestcall::Error>(())
//! ```

use crate::{Error, Result};
use http::header::WWW_AUTHENTICATE;
use http::{HeaderMap, Method};
use md5::Md5;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Username and password used to answer digest challenges.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates digest credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Hash algorithm announced by a digest challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// `MD5`, assumed when the challenge names no algorithm.
    #[default]
    Md5,
    /// `MD5-sess`: HA1 is rehashed with the server and client nonces.
    Md5Sess,
    /// `SHA-256` (RFC 7616).
    Sha256,
    /// `SHA-256-sess`.
    Sha256Sess,
}

impl Algorithm {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Algorithm::Md5),
            "MD5-SESS" => Ok(Algorithm::Md5Sess),
            "SHA-256" => Ok(Algorithm::Sha256),
            "SHA-256-SESS" => Ok(Algorithm::Sha256Sess),
            other => Err(Error::Authentication(format!(
                "Unsupported digest algorithm: {}",
                other
            ))),
        }
    }

    fn is_session(self) -> bool {
        matches!(self, Algorithm::Md5Sess | Algorithm::Sha256Sess)
    }

    fn hash(self, data: &[u8]) -> String {
        match self {
            Algorithm::Md5 | Algorithm::Md5Sess => format!("{:x}", Md5::digest(data)),
            Algorithm::Sha256 | Algorithm::Sha256Sess => format!("{:x}", Sha256::digest(data)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Md5 => "MD5",
            Algorithm::Md5Sess => "MD5-sess",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha256Sess => "SHA-256-sess",
        };
        f.write_str(name)
    }
}

/// Quality of protection selected when answering a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    /// `auth`: authenticates the method and request target.
    Auth,
    /// `auth-int`: also covers a hash of the request body.
    AuthInt,
}

impl Qop {
    fn as_str(self) -> &'static str {
        match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    /// Protection space the credentials belong to.
    pub realm: String,
    /// Server nonce, echoed back in the answer.
    pub nonce: String,
    /// Opaque server data, echoed back unchanged when present.
    pub opaque: Option<String>,
    /// Offered qop values, lowercased. Empty for RFC 2069 servers.
    pub qop: Vec<String>,
    pub algorithm: Algorithm,
    /// Set when the server rejected a previous nonce as expired.
    pub stale: bool,
}

impl DigestChallenge {
    /// Parses the first Digest challenge found in a `WWW-Authenticate` value.
    ///
    /// Challenges for other schemes in the same value are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if there is no Digest challenge, if
    /// `realm` or `nonce` is missing, or if the algorithm is not supported.
    pub fn parse(header: &str) -> Result<Self> {
        let params = digest_params(header).ok_or_else(|| {
            Error::Authentication(format!("No Digest challenge in: {}", header))
        })?;
        Self::from_params(params)
    }

    fn from_params(params: Vec<(String, String)>) -> Result<Self> {
        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut qop = Vec::new();
        let mut algorithm = Algorithm::default();
        let mut stale = false;

        for (key, value) in params {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "qop" => {
                    qop = value
                        .split(',')
                        .map(|q| q.trim().to_ascii_lowercase())
                        .filter(|q| !q.is_empty())
                        .collect()
                }
                "algorithm" => algorithm = Algorithm::parse(&value)?,
                "stale" => stale = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        Ok(Self {
            realm: realm
                .ok_or_else(|| Error::Authentication("Digest challenge has no realm".to_string()))?,
            nonce: nonce
                .ok_or_else(|| Error::Authentication("Digest challenge has no nonce".to_string()))?,
            opaque,
            qop,
            algorithm,
            stale,
        })
    }

    /// Builds the `Authorization` header value answering this challenge.
    ///
    /// `uri` is the request target (path and query) and `body` the exact
    /// bytes that will be sent, which only matter for `qop=auth-int`.
    pub fn authorization(
        &self,
        credentials: &Credentials,
        method: &Method,
        uri: &str,
        body: &[u8],
    ) -> Result<String> {
        let cnonce = format!("{:016x}", rand::thread_rng().gen::<u64>());
        self.authorization_with(credentials, method, uri, body, 1, &cnonce)
    }

    fn authorization_with(
        &self,
        credentials: &Credentials,
        method: &Method,
        uri: &str,
        body: &[u8],
        nc: u32,
        cnonce: &str,
    ) -> Result<String> {
        let (qop, response) = self.compute(credentials, method, uri, body, nc, cnonce)?;

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", algorithm={}, response=\"{}\"",
            quote(&credentials.username),
            quote(&self.realm),
            quote(&self.nonce),
            quote(uri),
            self.algorithm,
            response,
        );
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", quote(opaque)));
        }
        if let Some(qop) = qop {
            header.push_str(&format!(
                ", qop={}, nc={:08x}, cnonce=\"{}\"",
                qop.as_str(),
                nc,
                quote(cnonce)
            ));
        }
        Ok(header)
    }

    fn select_qop(&self) -> Result<Option<Qop>> {
        if self.qop.is_empty() {
            return Ok(None);
        }
        if self.qop.iter().any(|q| q == "auth") {
            Ok(Some(Qop::Auth))
        } else if self.qop.iter().any(|q| q == "auth-int") {
            Ok(Some(Qop::AuthInt))
        } else {
            Err(Error::Authentication(format!(
                "Unsupported digest qop: {}",
                self.qop.join(",")
            )))
        }
    }

    fn compute(
        &self,
        credentials: &Credentials,
        method: &Method,
        uri: &str,
        body: &[u8],
        nc: u32,
        cnonce: &str,
    ) -> Result<(Option<Qop>, String)> {
        let alg = self.algorithm;
        let qop = self.select_qop()?;

        let mut ha1 = alg.hash(
            format!(
                "{}:{}:{}",
                credentials.username, self.realm, credentials.password
            )
            .as_bytes(),
        );
        if alg.is_session() {
            ha1 = alg.hash(format!("{}:{}:{}", ha1, self.nonce, cnonce).as_bytes());
        }

        let ha2 = match qop {
            Some(Qop::AuthInt) => {
                alg.hash(format!("{}:{}:{}", method.as_str(), uri, alg.hash(body)).as_bytes())
            }
            _ => alg.hash(format!("{}:{}", method.as_str(), uri).as_bytes()),
        };

        let response = match qop {
            Some(qop) => alg.hash(
                format!(
                    "{}:{}:{:08x}:{}:{}:{}",
                    ha1,
                    self.nonce,
                    nc,
                    cnonce,
                    qop.as_str(),
                    ha2
                )
                .as_bytes(),
            ),
            None => alg.hash(format!("{}:{}:{}", ha1, self.nonce, ha2).as_bytes()),
        };

        Ok((qop, response))
    }
}

/// Returns the first Digest challenge among the `WWW-Authenticate` headers.
///
/// `Ok(None)` means the server did not offer Digest at all.
pub fn find_digest_challenge(headers: &HeaderMap) -> Result<Option<DigestChallenge>> {
    for value in headers.get_all(WWW_AUTHENTICATE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if let Some(params) = digest_params(value) {
            return DigestChallenge::from_params(params).map(Some);
        }
    }
    Ok(None)
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Locates the Digest scheme in a challenge list and returns its auth-params.
fn digest_params(header: &str) -> Option<Vec<(String, String)>> {
    let mut scanner = Scanner::new(header);
    loop {
        scanner.skip_separators();
        let scheme = scanner.token();
        if scheme.is_empty() {
            return None;
        }
        let params = scanner.params();
        if scheme.eq_ignore_ascii_case("digest") {
            return Some(params);
        }
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b',')) {
            self.pos += 1;
        }
    }

    fn token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'=' | b',' | b' ' | b'\t' | b'"') {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Reads `key=value` pairs until the next scheme token or the end.
    fn params(&mut self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        loop {
            self.skip_separators();
            let start = self.pos;
            let key = self.token();
            self.skip_whitespace();
            if key.is_empty() || self.peek() != Some(b'=') {
                self.pos = start;
                return params;
            }
            self.pos += 1;
            self.skip_whitespace();
            let value = self.value();
            params.push((key.to_string(), value));
        }
    }

    fn value(&mut self) -> String {
        if self.peek() != Some(b'"') {
            return self.token().to_string();
        }
        self.pos += 1;
        let mut bytes = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'"' => break,
                b'\\' => {
                    if let Some(escaped) = self.peek() {
                        bytes.push(escaped);
                        self.pos += 1;
                    }
                }
                _ => bytes.push(b),
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_parse_rfc2617_challenge() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();

        assert_eq!(challenge.realm, "testrealm@host.com");
        assert_eq!(challenge.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(
            challenge.opaque.as_deref(),
            Some("5ccc069c403ebaf9f0171e9517f40e41")
        );
        assert_eq!(challenge.qop, vec!["auth", "auth-int"]);
        assert_eq!(challenge.algorithm, Algorithm::Md5);
        assert!(!challenge.stale);
    }

    #[test]
    fn test_rfc2617_response_vector() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let credentials = Credentials::new("Mufasa", "Circle Of Life");

        let (qop, response) = challenge
            .compute(&credentials, &Method::GET, "/dir/index.html", b"", 1, "0a4f113b")
            .unwrap();

        assert_eq!(qop, Some(Qop::Auth));
        assert_eq!(response, "6629fae49393a05397450978507c4ef1");
    }

    #[test]
    fn test_rfc7616_sha256_response_vector() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="http-auth@example.org", qop="auth, auth-int", algorithm=SHA-256, nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#,
        )
        .unwrap();
        let credentials = Credentials::new("Mufasa", "Circle of Life");

        let (_, response) = challenge
            .compute(
                &credentials,
                &Method::GET,
                "/dir/index.html",
                b"",
                1,
                "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
            )
            .unwrap();

        assert_eq!(challenge.algorithm, Algorithm::Sha256);
        assert_eq!(
            response,
            "753927fa0e85d155564e2e272a28d1802ca10daf4496794697cf8db5856cb6c1"
        );
    }

    #[test]
    fn test_authorization_header_fields() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let credentials = Credentials::new("Mufasa", "Circle Of Life");

        let header = challenge
            .authorization_with(&credentials, &Method::GET, "/dir/index.html", b"", 1, "0a4f113b")
            .unwrap();

        assert!(header.starts_with("Digest username=\"Mufasa\""));
        assert!(header.contains("uri=\"/dir/index.html\""));
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.contains("opaque=\"5ccc069c403ebaf9f0171e9517f40e41\""));
        assert!(header.contains("qop=auth, nc=00000001, cnonce=\"0a4f113b\""));
    }

    #[test]
    fn test_legacy_challenge_without_qop() {
        let challenge =
            DigestChallenge::parse(r#"Digest realm="legacy", nonce="abc123""#).unwrap();
        let credentials = Credentials::new("user", "pass");

        let header = challenge
            .authorization(&credentials, &Method::GET, "/api/todos", b"")
            .unwrap();

        assert!(!header.contains("qop="));
        assert!(!header.contains("cnonce="));

        let ha1 = Algorithm::Md5.hash(b"user:legacy:pass");
        let ha2 = Algorithm::Md5.hash(b"GET:/api/todos");
        let expected = Algorithm::Md5.hash(format!("{}:abc123:{}", ha1, ha2).as_bytes());
        assert!(header.contains(&format!("response=\"{}\"", expected)));
    }

    #[test]
    fn test_auth_int_hashes_body() {
        let challenge =
            DigestChallenge::parse(r#"Digest realm="r", nonce="n", qop="auth-int""#).unwrap();
        let credentials = Credentials::new("user", "pass");

        let (qop, with_body) = challenge
            .compute(&credentials, &Method::POST, "/api/todos", b"{\"a\":1}", 1, "c")
            .unwrap();
        let (_, empty_body) = challenge
            .compute(&credentials, &Method::POST, "/api/todos", b"", 1, "c")
            .unwrap();

        assert_eq!(qop, Some(Qop::AuthInt));
        assert_ne!(with_body, empty_body);
    }

    #[test]
    fn test_session_algorithm_differs_from_plain() {
        let plain = DigestChallenge::parse(r#"Digest realm="r", nonce="n", qop="auth", algorithm=MD5"#)
            .unwrap();
        let sess =
            DigestChallenge::parse(r#"Digest realm="r", nonce="n", qop="auth", algorithm=MD5-sess"#)
                .unwrap();
        let credentials = Credentials::new("user", "pass");

        let (_, a) = plain
            .compute(&credentials, &Method::GET, "/x", b"", 1, "c")
            .unwrap();
        let (_, b) = sess
            .compute(&credentials, &Method::GET, "/x", b"", 1, "c")
            .unwrap();

        assert_eq!(sess.algorithm, Algorithm::Md5Sess);
        assert_ne!(a, b);
    }

    #[test]
    fn test_skips_other_schemes() {
        let challenge = DigestChallenge::parse(
            r#"Basic realm="basic", Digest realm="digest", nonce="n1", stale=TRUE"#,
        )
        .unwrap();

        assert_eq!(challenge.realm, "digest");
        assert_eq!(challenge.nonce, "n1");
        assert!(challenge.stale);
    }

    #[test]
    fn test_quoted_escapes() {
        let challenge =
            DigestChallenge::parse(r#"Digest realm="say \"hi\"", nonce="n""#).unwrap();
        assert_eq!(challenge.realm, r#"say "hi""#);
    }

    #[test]
    fn test_missing_nonce_is_rejected() {
        let result = DigestChallenge::parse(r#"Digest realm="r""#);
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_unsupported_algorithm_is_rejected() {
        let result = DigestChallenge::parse(r#"Digest realm="r", nonce="n", algorithm=SHA-512"#);
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_basic_only_has_no_digest() {
        assert!(DigestChallenge::parse(r#"Basic realm="r""#).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static(r#"Basic realm="r""#));
        assert!(find_digest_challenge(&headers).unwrap().is_none());
    }

    #[test]
    fn test_find_digest_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(WWW_AUTHENTICATE, HeaderValue::from_static(r#"Basic realm="r""#));
        headers.append(
            WWW_AUTHENTICATE,
            HeaderValue::from_static(r#"Digest realm="r2", nonce="n2""#),
        );

        let challenge = find_digest_challenge(&headers).unwrap().unwrap();
        assert_eq!(challenge.realm, "r2");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("user", "hunter2"));
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}
