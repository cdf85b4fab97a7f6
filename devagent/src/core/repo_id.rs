//! Repository identifier (`owner/name`) parsed from a remote URL.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[:/]([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").expect("remote pattern should compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse `owner/name` from an SSH or HTTPS remote URL.
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let caps = REMOTE_RE.captures(url.trim())?;
        Some(Self {
            owner: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ssh_remote() {
        let id = RepoId::from_remote_url("git@github.com:acme/widgets.git").expect("parse");
        assert_eq!(id.to_string(), "acme/widgets");
    }

    #[test]
    fn parses_https_remote_with_and_without_suffix() {
        let id = RepoId::from_remote_url("https://github.com/acme/widgets.git\n").expect("parse");
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widgets");
        let id = RepoId::from_remote_url("https://github.com/acme/my.repo").expect("parse");
        assert_eq!(id.name, "my.repo");
    }

    #[test]
    fn rejects_urls_without_owner_and_name() {
        assert_eq!(RepoId::from_remote_url("widgets"), None);
        assert_eq!(RepoId::from_remote_url(""), None);
    }
}
