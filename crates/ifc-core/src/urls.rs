//! URL helpers.
//!
//! Clients build links into the host's routing space (and hosts into their
//! own) by joining route fragments. Doing this with plain string concatenation
//! produces doubled or missing slashes as soon as one side changes its
//! configuration, so every join goes through [`join_routes`].

/// Strip every leading and trailing slash.
pub fn strip_slashes(part: &str) -> &str {
    part.trim_start_matches('/').trim_end_matches('/')
}

/// Join route fragments with single slashes.
///
/// Leading and trailing slashes of every part are removed and empty parts are
/// skipped. Query strings and fragments inside a part are kept verbatim.
///
/// ```
/// use ifc_core::urls::join_routes;
///
/// assert_eq!(join_routes(["a/", "/b/", "c"]), "a/b/c");
/// assert_eq!(join_routes(["", "", ""]), "");
/// ```
pub fn join_routes<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for part in parts {
        let part = strip_slashes(part.as_ref());
        if part.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(part);
    }
    joined
}
