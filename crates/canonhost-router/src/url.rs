//! Canonical URL construction

/// Build the absolute URL a request should be redirected to
///
/// The result is `scheme://host/` followed by `path` with a single leading
/// `/` removed. A path of exactly `/` (or an empty path) adds nothing, so the
/// separator is never doubled. Query strings are expected inside `path` and
/// are passed through untouched.
///
/// # Examples
/// ```
/// use canonhost_router::build_url;
///
/// assert_eq!(build_url("www.imos.net", true, "/"), "https://www.imos.net/");
/// assert_eq!(
///     build_url("www.imos.net", false, "/de/test.html?x=y"),
///     "http://www.imos.net/de/test.html?x=y"
/// );
/// ```
pub fn build_url(host: &str, requires_ssl: bool, path: &str) -> String {
    let scheme = if requires_ssl { "https://" } else { "http://" };
    let path = path.strip_prefix('/').unwrap_or(path);

    let mut url = String::with_capacity(scheme.len() + host.len() + 1 + path.len());
    url.push_str(scheme);
    url.push_str(host);
    url.push('/');
    url.push_str(path);
    url
}
