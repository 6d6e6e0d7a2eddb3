//! `imgfetch fetch <url>` – fetch one remote image through the source registry.

use anyhow::{Context, Result};
use http::Request;
use imgfetch_core::config::{self, SourceConfig};
use imgfetch_core::request::X_FORWARD_AUTHORIZATION;
use imgfetch_core::source::{select, SourceRegistry};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::FetchArgs;

const DEFAULT_OUTPUT: &str = "image.bin";

pub async fn run_fetch(args: FetchArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load_or_init()?,
    };
    apply_overrides(&mut cfg, &args);
    tracing::debug!("effective config: {:?}", cfg);

    let registry = SourceRegistry::with_builtin_sources();
    let sources = registry
        .build(Arc::new(cfg))
        .context("build image sources")?;
    let request = inbound_request(&args.url, args.forward_authorization.as_deref())?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| output_path(&args.url));

    let url = args.url.clone();
    let image = tokio::task::spawn_blocking(move || {
        let (source_type, source) = select(&sources, &request)
            .ok_or_else(|| anyhow::anyhow!("no image source matches {}", url))?;
        tracing::info!(source = %source_type, url = %url, "fetching image");
        source.get_image_with_cache_headers(&request).map_err(|err| {
            let status = err.status_code();
            anyhow::Error::new(err).context(format!("fetch failed ({})", status))
        })
    })
    .await
    .context("fetch task join")??;

    std::fs::write(&output, &image.body)
        .with_context(|| format!("write image: {}", output.display()))?;

    println!(
        "Fetched {} bytes from {} -> {}",
        image.body.len(),
        args.url,
        output.display()
    );
    for (name, value) in &image.headers {
        println!("  {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    Ok(())
}

/// Flags win over the config file.
pub(crate) fn apply_overrides(cfg: &mut SourceConfig, args: &FetchArgs) {
    if let Some(origins) = &args.allowed_origins {
        cfg.allowed_origins = config::parse_origins(origins);
    }
    if let Some(max) = args.max_size {
        cfg.max_allowed_size = max;
    }
    if let Some(auth) = &args.authorization {
        cfg.authorization = auth.clone();
    }
    if args.auth_forwarding {
        cfg.auth_forwarding = true;
    }
    if let Some(secs) = args.timeout {
        cfg.transport.timeout_secs = Some(secs);
    }
}

/// The request an image service would receive: `GET /?url=<target>`.
pub(crate) fn inbound_request(target: &str, forward_auth: Option<&str>) -> Result<Request<()>> {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    let mut builder = Request::get(format!("/?url={}", encoded));
    if let Some(auth) = forward_auth {
        builder = builder.header(X_FORWARD_AUTHORIZATION, auth);
    }
    builder.body(()).context("build inbound request")
}

/// Last path segment of the URL, or a fixed name when there is none.
pub(crate) fn output_path(target: &str) -> PathBuf {
    url::Url::parse(target)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}
