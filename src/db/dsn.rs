//! Connection string parsing.
//!
//! A DSN is either a local target (`file:<path>`, a bare path, or `:memory:`)
//! or a remote libsql endpoint (`http`, `https`, `libsql`, `ws`, `wss`).
//! Remote URLs may carry an `authToken` query parameter, which is lifted out
//! of the URL so it never ends up in logs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const FILE_PREFIX: &str = "file:";
const MEMORY: &str = ":memory:";
const AUTH_TOKEN_PARAM: &str = "authToken";
const REMOTE_SCHEMES: [&str; 5] = ["http", "https", "libsql", "ws", "wss"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DsnError {
    #[error("connection string is empty")]
    Empty,
    #[error("file dsn {0:?} has no path")]
    MissingPath(String),
    #[error("remote dsn {0:?} has no host")]
    MissingHost(String),
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("malformed url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug)]
pub enum Dsn {
    Memory,
    Local {
        path: PathBuf,
    },
    Remote {
        url: Url,
        auth_token: Option<SecretString>,
    },
}

impl Dsn {
    pub fn parse(input: &str) -> Result<Self, DsnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DsnError::Empty);
        }
        if input == MEMORY {
            return Ok(Dsn::Memory);
        }

        if let Some(rest) = input.strip_prefix(FILE_PREFIX) {
            return Self::parse_file(input, rest);
        }

        match input.split_once("://") {
            Some((scheme, _)) => {
                let scheme = scheme.to_ascii_lowercase();
                if REMOTE_SCHEMES.contains(&scheme.as_str()) {
                    Self::parse_remote(input)
                } else {
                    Err(DsnError::UnsupportedScheme(scheme))
                }
            }
            None => Ok(Dsn::Local {
                path: PathBuf::from(input),
            }),
        }
    }

    fn parse_file(input: &str, rest: &str) -> Result<Self, DsnError> {
        // file:///abs/path and file:relative/path both name a path directly
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let path = rest.split_once('?').map_or(rest, |(path, _)| path);
        if path == MEMORY {
            return Ok(Dsn::Memory);
        }
        if path.is_empty() {
            return Err(DsnError::MissingPath(input.to_string()));
        }
        Ok(Dsn::Local {
            path: PathBuf::from(path),
        })
    }

    fn parse_remote(input: &str) -> Result<Self, DsnError> {
        let mut url = Url::parse(input).map_err(|e| DsnError::InvalidUrl(e.to_string()))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(DsnError::MissingHost(input.to_string()));
        }

        let mut auth_token = None;
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter_map(|(key, value)| {
                if key == AUTH_TOKEN_PARAM {
                    auth_token = Some(SecretString::from(value.into_owned()));
                    None
                } else {
                    Some((key.into_owned(), value.into_owned()))
                }
            })
            .collect();

        if retained.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(retained);
        }

        Ok(Dsn::Remote { url, auth_token })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Dsn::Remote { .. })
    }
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dsn::parse(s)
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dsn::Memory => f.write_str(MEMORY),
            Dsn::Local { path } => write!(f, "{FILE_PREFIX}{}", path.display()),
            Dsn::Remote { url, .. } => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use std::path::Path;
    use test_case::test_case;

    use super::{Dsn, DsnError};

    #[test_case("file:/tmp/open_local.db", "/tmp/open_local.db" ; "absolute file dsn")]
    #[test_case("file:///tmp/open_local.db", "/tmp/open_local.db" ; "file url")]
    #[test_case("file:local.db", "local.db" ; "relative file dsn")]
    #[test_case("file:local.db?mode=rwc", "local.db" ; "query string dropped")]
    #[test_case("data/local.db", "data/local.db" ; "bare path")]
    fn parses_local_targets(input: &str, expected: &str) {
        match Dsn::parse(input).expect("local dsn") {
            Dsn::Local { path } => assert_eq!(path, Path::new(expected)),
            other => panic!("expected local dsn, got {other:?}"),
        }
    }

    #[test_case(":memory:" ; "bare memory")]
    #[test_case("file::memory:" ; "file memory")]
    fn parses_memory(input: &str) {
        assert!(matches!(Dsn::parse(input), Ok(Dsn::Memory)));
    }

    #[test_case("http://localhost:18080" ; "http")]
    #[test_case("https://db.example.org" ; "https")]
    #[test_case("libsql://db-org.turso.io" ; "libsql")]
    #[test_case("wss://db.example.org" ; "websocket")]
    fn parses_remote_targets(input: &str) {
        let dsn = Dsn::parse(input).expect("remote dsn");
        assert!(dsn.is_remote());
    }

    #[test]
    fn lifts_auth_token_out_of_url() {
        let dsn = Dsn::parse("libsql://db.example.org?authToken=s3cr3t&tls=1").unwrap();
        let Dsn::Remote { url, auth_token } = dsn else {
            panic!("expected remote dsn");
        };
        assert_eq!(auth_token.unwrap().expose_secret(), "s3cr3t");
        assert_eq!(url.query(), Some("tls=1"));
        assert!(!url.as_str().contains("s3cr3t"));
    }

    #[test]
    fn drops_empty_query_after_lifting_token() {
        let dsn = Dsn::parse("https://db.example.org?authToken=abc").unwrap();
        assert_eq!(dsn.to_string(), "https://db.example.org/");
    }

    #[test_case("", DsnError::Empty ; "empty")]
    #[test_case("   ", DsnError::Empty ; "whitespace")]
    #[test_case("file:", DsnError::MissingPath("file:".to_string()) ; "file without path")]
    #[test_case("postgres://localhost/db", DsnError::UnsupportedScheme("postgres".to_string()) ; "foreign scheme")]
    fn rejects_malformed_dsn(input: &str, expected: DsnError) {
        assert_eq!(Dsn::parse(input).unwrap_err(), expected);
    }

    #[test]
    fn rejects_remote_without_host() {
        assert!(matches!(
            Dsn::parse("http://"),
            Err(DsnError::InvalidUrl(_) | DsnError::MissingHost(_))
        ));
    }
}
