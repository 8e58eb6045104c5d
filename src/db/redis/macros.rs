/// Reads a JSON value from the store, or computes and caches it. Hits and
/// misses are logged at debug level.
///
/// # Arguments
/// * `$cache`: a store with `get_json` and `set_json_in_background`
/// * `$key`: the full (namespaced) key
/// * `$ttl`: expiry in seconds for a freshly computed value
/// * `$block`: future producing the value on a cache miss
///
/// # Example
/// ```rust,ignore
/// let movie = cached!(cache, key, ttl, self.fetch_details(id))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_json(&key).await? {
            Some(hit) => {
                ::tracing::debug!(key = %key, "Catalog cache hit");
                Ok(hit)
            }
            None => {
                ::tracing::debug!(key = %key, ttl = $ttl, "Catalog cache miss");
                let value = $block.await?;
                $cache.set_json_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
