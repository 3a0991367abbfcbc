// file: src/feeds/mod.rs
// description: the dashboard feeds, each a configured channel

pub mod alerts;
pub mod detail;
pub mod homepage;

use crate::error::Result;
use url::Url;

/// Appends a feed path to the realtime base URL (`ws://host/ws` + `alerts`
/// becomes `ws://host/ws/alerts`).
pub fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let base = Url::parse("wss://api.example.com/ws").unwrap();
        assert_eq!(
            endpoint(&base, "homepage").unwrap().as_str(),
            "wss://api.example.com/ws/homepage"
        );

        let base = Url::parse("ws://localhost:8080/").unwrap();
        assert_eq!(
            endpoint(&base, "/alerts").unwrap().as_str(),
            "ws://localhost:8080/alerts"
        );
    }
}
