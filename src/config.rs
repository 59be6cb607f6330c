use anyhow::{Context, Result, bail};
use reqwest::Url;
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_API_HOST: &str = "localhost";
pub const DEFAULT_API_PORT: u16 = 51441;
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_UI_ADDR: &str = "0.0.0.0:51440";

/// Where the client sends its requests. Built once at startup and handed to
/// whatever needs it; nothing reads the environment after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin + prefix for every API call, e.g. `http://localhost:51441/api`.
    pub base_url: Url,
    /// Upstream the development proxy forwards `/api/*` to.
    pub proxy_target: Url,
    pub ui_addr: SocketAddr,
}

impl ClientConfig {
    pub fn new(base_url: Url, proxy_target: Url, ui_addr: SocketAddr) -> Self {
        Self {
            base_url,
            proxy_target,
            ui_addr,
        }
    }

    /// Config pointing everything at one base URL. Handy for tests against a
    /// mock upstream.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = parse_url(base_url)?;
        let proxy_target = origin_of(&base_url)?;
        let ui_addr = DEFAULT_UI_ADDR
            .parse()
            .context("Invalid default UI address")?;
        Ok(Self::new(base_url, proxy_target, ui_addr))
    }

    /// Load from `.env` + process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or_default =
            |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let base_url = match get("STRATOS_BASE_URL") {
            Some(url) => parse_url(&url)?,
            None => {
                let host = get_or_default("STRATOS_API_HOST", DEFAULT_API_HOST);
                let port = match get("STRATOS_API_PORT") {
                    Some(p) => p
                        .parse::<u16>()
                        .with_context(|| format!("Invalid STRATOS_API_PORT: {p}"))?,
                    None => DEFAULT_API_PORT,
                };
                let prefix = get_or_default("STRATOS_API_PREFIX", DEFAULT_API_PREFIX);
                derive_base_url(&host, port, &prefix)?
            }
        };

        let proxy_target = match get("STRATOS_PROXY_TARGET") {
            Some(url) => parse_url(&url)?,
            None => parse_url(&format!("http://localhost:{DEFAULT_API_PORT}"))?,
        };

        let ui_addr = get_or_default("STRATOS_UI_ADDR", DEFAULT_UI_ADDR);
        let ui_addr = ui_addr
            .parse()
            .with_context(|| format!("Invalid STRATOS_UI_ADDR: {ui_addr}"))?;

        Ok(Self::new(base_url, proxy_target, ui_addr))
    }

    /// Joins a path onto the base URL, keeping the base's prefix.
    /// `endpoint("search")` on `http://h:1/api` gives `http://h:1/api/search`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        join_path(&self.base_url, path)
    }

    /// The base URL with its path stripped.
    pub fn origin(&self) -> Result<Url> {
        origin_of(&self.base_url)
    }
}

/// `http://{host}:{port}{prefix}`
pub fn derive_base_url(host: &str, port: u16, prefix: &str) -> Result<Url> {
    if host.trim().is_empty() {
        bail!("API host cannot be empty");
    }
    let prefix = prefix.trim_matches('/');
    let raw = if prefix.is_empty() {
        format!("http://{host}:{port}")
    } else {
        format!("http://{host}:{port}/{prefix}")
    };
    parse_url(&raw)
}

pub fn join_path(base: &Url, path: &str) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("URL cannot be a base: {base}"))?;
        segments.pop_if_empty();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            segments.push(segment);
        }
    }
    Ok(url)
}

fn origin_of(url: &Url) -> Result<Url> {
    let origin = url.origin().ascii_serialization();
    if origin == "null" {
        bail!("URL has no origin: {url}");
    }
    parse_url(&origin)
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid URL: {raw}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Unsupported URL scheme {other:?} in {raw}"),
    }
}
