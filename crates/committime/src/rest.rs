use url::Url;

// -------------------------------------------------------------------------------------------------
// UrlError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("error parsing URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("error building URL: component {0:?} contains a slash")]
    Slash(String),

    #[error("error building URL: {0} cannot be a base URL")]
    Base(Url),
}

/// Parse an API location given either as a full URL or as a bare host, which implies `https`.
pub fn parse_api_url(api: &str) -> Result<Url, UrlError> {
    if api.contains("://") {
        Ok(Url::parse(api)?)
    } else {
        Ok(Url::parse(&format!("https://{api}"))?)
    }
}

/// Create a URL from the given base, path parts, and parameters.
///
/// The path parts should not contain slashes.
pub fn url_from_path_parts_and_params(
    base_url: Url,
    path_parts: &[&str],
    params: &[(&str, &str)],
) -> Result<Url, UrlError> {
    if base_url.cannot_be_a_base() {
        return Err(UrlError::Base(base_url));
    }

    let mut buf = base_url.path().to_string();
    if !buf.ends_with('/') {
        buf.push('/');
    }

    for (i, p) in path_parts.iter().enumerate() {
        if p.contains('/') {
            return Err(UrlError::Slash(p.to_string()));
        }
        if i > 0 {
            // no leading slash for the very first path part, or it is treated as an absolute path
            buf.push('/');
        }
        buf.push_str(p);
    }
    let url = base_url.join(&buf)?;
    let url = if params.is_empty() {
        Url::parse(url.as_str())
    } else {
        Url::parse_with_params(url.as_str(), params)
    }?;
    Ok(url)
}
