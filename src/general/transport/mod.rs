pub mod scp;

use std::{fmt::Display, path::PathBuf, str::FromStr};

use async_trait::async_trait;

use crate::result::{DistConfigErr, DistError, DistResult};

pub use scp::ScpTransport;

/// Copies local files to a destination, keeping their file names.
///
/// A failure part way through may leave some of the files delivered.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn copy(&self, files: &[PathBuf], location: &Location) -> DistResult<()>;
}

/// Destination of a transfer.
///
/// Accepted forms:
/// - `scp://[user@]host[:port]/path[#fragment]`
/// - `[user@]host:path`
/// - a local path, for transports that also copy locally
///
/// Only the `scp://` form carries a fragment. Elsewhere `#` is part of the
/// path and reaches the transport untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub fragment: Option<String>,
}

const SCP_SCHEME: &str = "scp://";

fn invalid(location: &str, reason: impl Into<String>) -> DistError {
    DistConfigErr::InvalidLocation {
        location: location.to_owned(),
        reason: reason.into(),
    }
    .into()
}

impl Location {
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            user: None,
            host: None,
            port: None,
            path: path.into(),
            fragment: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.host.is_some()
    }

    pub fn with_fragment(&self, fragment: impl Display) -> Self {
        Self {
            fragment: Some(fragment.to_string()),
            ..self.clone()
        }
    }

    /// Destination argument in the form `scp` expects it.
    pub fn target(&self) -> String {
        match &self.host {
            None => self.path.clone(),
            Some(host) => {
                let mut s = String::new();
                if let Some(user) = &self.user {
                    s += user;
                    s.push('@');
                }
                if host.contains(':') {
                    s += &format!("[{}]", host);
                } else {
                    s += host;
                }
                s.push(':');
                s += &self.path;
                s
            }
        }
    }

    fn parse_authority(full: &str, authority: &str) -> DistResult<(Option<String>, String, Option<u16>)> {
        let (user, hostport) = match authority.rsplit_once('@') {
            Some((user, rest)) if !user.is_empty() => (Some(user.to_owned()), rest),
            Some(_) => return Err(invalid(full, "empty user")),
            None => (None, authority),
        };
        let (host, port) = if let Some(bracketed) = hostport.strip_prefix('[') {
            let (host, rest) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid(full, "unclosed '['"))?;
            match rest {
                "" => (host, None),
                _ => match rest.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(invalid(full, "garbage after ']'")),
                },
            }
        } else {
            match hostport.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (hostport, None),
            }
        };
        if host.is_empty() {
            return Err(invalid(full, "empty host"));
        }
        let port = port
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|_| invalid(full, format!("bad port '{}'", p)))
            })
            .transpose()?;
        Ok((user, host.to_owned(), port))
    }
}

impl FromStr for Location {
    type Err = DistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let full = s.trim();
        if full.is_empty() {
            return Err(invalid(s, "empty location"));
        }
        if let Some(rest) = full.strip_prefix(SCP_SCHEME) {
            let (rest, fragment) = match rest.split_once('#') {
                Some((rest, frag)) => (rest, Some(frag.to_owned())),
                None => (rest, None),
            };
            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, ""),
            };
            let (user, host, port) = Self::parse_authority(full, authority)?;
            return Ok(Self {
                user,
                host: Some(host),
                port,
                path: path.to_owned(),
                fragment,
            });
        }
        if let Some((scheme, _)) = full.split_once("://") {
            return Err(invalid(full, format!("unsupported scheme '{}'", scheme)));
        }

        // scp convention: a colon before the first slash makes it remote
        let colon = full.find(':');
        let slash = full.find('/');
        match colon {
            Some(c) if slash.map_or(true, |sl| c < sl) => {
                let (authority, path) = (&full[..c], &full[c + 1..]);
                let (user, host) = match authority.rsplit_once('@') {
                    Some((user, host)) if !user.is_empty() => (Some(user.to_owned()), host),
                    Some(_) => return Err(invalid(full, "empty user")),
                    None => (None, authority),
                };
                if host.is_empty() {
                    return Err(invalid(full, "empty host"));
                }
                Ok(Self {
                    user,
                    host: Some(host.to_owned()),
                    port: None,
                    path: path.to_owned(),
                    fragment: None,
                })
            }
            _ => Ok(Self::local(full)),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.host {
            None => write!(f, "{}", self.path)?,
            Some(host) => {
                write!(f, "{}", SCP_SCHEME)?;
                if let Some(user) = &self.user {
                    write!(f, "{}@", user)?;
                }
                if host.contains(':') {
                    write!(f, "[{}]", host)?;
                } else {
                    write!(f, "{}", host)?;
                }
                if let Some(port) = self.port {
                    write!(f, ":{}", port)?;
                }
                if !self.path.is_empty() && !self.path.starts_with('/') {
                    write!(f, "/")?;
                }
                write!(f, "{}", self.path)?;
            }
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}
