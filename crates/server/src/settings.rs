use std::path::PathBuf;

/// Literal entry in [`Settings::allowed_clients`] that allows every client,
/// matching the original server's `'ALL' in self._settings.allowed_clients`
/// check.
pub const ALLOW_ALL: &str = "ALL";

/// Static configuration for the reporting server: the directories it
/// serves from and its access-control list.
///
/// Corresponds to `reporting_server.py`'s `Settings` namedtuple, minus
/// `template_dir` — this server renders minimal HTML directly rather than
/// through a `pystache` templating layer (out of scope; see spec's
/// Non-goals for the HTML browsing UI).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory containing `<run_id>.info` files and `latest.info`.
    pub info_dir: PathBuf,
    /// Directory containing static assets served under `/assets/`.
    pub assets_dir: PathBuf,
    /// Root directory `/browse/` and `/content/` resolve paths beneath.
    pub root: PathBuf,
    /// IP allow-list. An entry of [`ALLOW_ALL`] allows every client.
    pub allowed_clients: Vec<String>,
}

impl Settings {
    /// Whether `client_ip` is permitted to use this server.
    #[must_use]
    pub fn is_allowed(&self, client_ip: &str) -> bool {
        self.allowed_clients.iter().any(|c| c == ALLOW_ALL || c == client_ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(allowed: &[&str]) -> Settings {
        Settings {
            info_dir: PathBuf::from("/tmp/info"),
            assets_dir: PathBuf::from("/tmp/assets"),
            root: PathBuf::from("/tmp/root"),
            allowed_clients: allowed.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn explicit_ip_is_allowed() {
        assert!(settings(&["127.0.0.1"]).is_allowed("127.0.0.1"));
        assert!(!settings(&["127.0.0.1"]).is_allowed("10.0.0.1"));
    }

    #[test]
    fn all_literal_allows_every_client() {
        assert!(settings(&[ALLOW_ALL]).is_allowed("10.0.0.1"));
    }
}
