// Well-known backend endpoints, derived from the configured base URL

use url::Url;

pub const DIRECTORY_PATH: &str = "/api/servers";
pub const METRICS_STREAM_PATH: &str = "/ws/metrics";

/// GET endpoint for the resource directory.
pub fn directory_url(base: &Url) -> anyhow::Result<Url> {
    Ok(base.join(DIRECTORY_PATH)?)
}

/// Stream endpoint; secure scheme (wss) when the base is https, ws otherwise.
pub fn metrics_stream_url(base: &Url) -> anyhow::Result<Url> {
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => anyhow::bail!("unsupported base URL scheme: {}", other),
    };
    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("cannot switch {} to {}", base, scheme))?;
    url.set_path(METRICS_STREAM_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
