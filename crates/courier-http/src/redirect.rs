//! Redirect detection and follow-up request derivation.

use url::Url;

use crate::error::HttpError;
use crate::headers::{names, Headers};
use crate::request::RequestOptions;

/// Statuses treated as redirects.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Whether `status` is a redirect status.
pub fn is_redirect(status: u16) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

/// The `Location` of a redirect response, if it is one.
pub fn location(status: u16, headers: &Headers) -> Option<&str> {
    if !is_redirect(status) {
        return None;
    }
    headers.get(names::LOCATION).map(str::trim).filter(|l| !l.is_empty())
}

/// Whether another hop is allowed after `depth` redirects have been followed.
pub fn should_follow(options: &RequestOptions, depth: u32) -> bool {
    options.follow_redirects && options.max_redirects.map_or(true, |max| depth < max)
}

/// Options for the request that follows a redirect.
///
/// The location is resolved against `current`, the URL actually requested.
/// Method, body and headers carry over; the query list is dropped because
/// `current` already contains it. Credentials taken from the original URL
/// are carried as explicit credentials so they survive a change of host
/// form.
pub fn next_options(
    options: &RequestOptions,
    current: &Url,
    location: &str,
) -> Result<RequestOptions, HttpError> {
    let target = current.join(location).map_err(|source| HttpError::InvalidRedirect {
        location: location.to_string(),
        source,
    })?;

    let mut next = options.clone();
    if next.username.is_none() {
        if let Some((username, password)) = Url::parse(&options.url)
            .ok()
            .and_then(|original| options.credentials(&original))
        {
            next.username = Some(username);
            next.password = Some(password);
        }
    }
    next.url = target.to_string();
    next.query.clear();
    Ok(next)
}
