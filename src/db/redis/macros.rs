/// Read-through caching around an upstream call.
///
/// Looks the key up first and returns the cached value on a hit. On a miss
/// the block is awaited, its value queued for a background write, and
/// returned. A failed cache read is logged and treated as a miss, so an
/// unavailable Redis never turns into an upstream failure.
///
/// # Arguments
/// * `$cache`: a value with `get_from_cache` and `set_in_background`.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live of the written value, in seconds.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let videos: Vec<Video> = cached!(self.cache, CacheKey::Trending(category), 900, async {
///     fetch_trending().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        };

        match hit {
            Some(cached) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
