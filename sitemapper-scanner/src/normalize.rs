use crate::error::LinkError;
use url::Url;

/// Resolve `link` against the page it was found on and return the in-site
/// path it points to.
///
/// Relative links are resolved against `base`. Links are rejected when they
/// use a scheme other than http/https, point at a different host, or point
/// back at `base` itself. Query strings and fragments are dropped, so the
/// returned path is the key the target page is tracked under. The path
/// comparison is exact: `/docs` and `/docs/` are different pages.
pub fn normalize_link(base: &Url, link: &str) -> Result<String, LinkError> {
    let resolved = base.join(link).map_err(|source| LinkError::Malformed {
        link: link.to_string(),
        source,
    })?;

    let path = match resolved.path() {
        "" => "/",
        path => path,
    };

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(LinkError::UnsupportedScheme(resolved.scheme().to_string()));
    }
    if resolved.host() != base.host() || resolved.port() != base.port() {
        return Err(LinkError::CrossSite(
            resolved.host_str().unwrap_or_default().to_string(),
        ));
    }
    if path == base.path() {
        return Err(LinkError::SelfLink);
    }

    Ok(path.to_string())
}
