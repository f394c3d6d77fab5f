//! Connection URL construction for the distribution endpoint.

use crate::constants::DISTRIBUTE_PATH;

/// Joins `key=value` pairs with `&`, in the given order.
///
/// Values are concatenated as-is (no percent-encoding). Pairs whose value is
/// `None` are skipped, so the result never carries a trailing separator or a
/// dangling `key=`.
pub fn to_query<K: AsRef<str>>(pairs: &[(K, Option<String>)]) -> String {
    pairs
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|value| format!("{}={value}", key.as_ref()))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds `<server_url>/distribute?name=<name>&port=<port>`.
pub fn distribute_url(server_url: &str, name: Option<&str>, port: Option<u16>) -> String {
    let query = to_query(&[
        ("name", name.map(str::to_string)),
        ("port", port.map(|p| p.to_string())),
    ]);
    let base = server_url.trim_end_matches('/');

    if query.is_empty() {
        format!("{base}{DISTRIBUTE_PATH}")
    } else {
        format!("{base}{DISTRIBUTE_PATH}?{query}")
    }
}
