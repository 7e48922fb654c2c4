//! Per-key deduplication of concurrent provider fetches.

use std::future::Future;
use std::sync::Arc;

use converter_common::Result;
use dashmap::DashMap;
use tokio::sync::OnceCell;

type Call<T> = Arc<OnceCell<Result<T>>>;

/// Concurrent callers for one key share a single fetch and its outcome.
///
/// Failures are shared with the callers that were waiting but are not
/// remembered: once the fetch completes the key is free again.
pub(crate) struct FlightGroup<T> {
    calls: DashMap<String, Call<T>>,
}

impl<T: Clone> FlightGroup<T> {
    pub(crate) fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// Run `fetch` for `key` unless a fetch is already running, in which case
    /// wait for it and return its result.
    ///
    /// If the running fetch is cancelled, one of the waiters takes over.
    pub(crate) async fn run<F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let call = self
            .calls
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let release = Release {
            calls: &self.calls,
            key,
            call,
        };
        let result = release.call.get_or_init(fetch).await.clone();
        result
    }

    /// Number of keys with a fetch in progress.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}

/// Frees the key once its fetch has completed or its last caller is gone.
struct Release<'a, T> {
    calls: &'a DashMap<String, Call<T>>,
    key: &'a str,
    call: Call<T>,
}

impl<T> Drop for Release<'_, T> {
    fn drop(&mut self) {
        let call = &self.call;
        // map and this guard hold the only references when no one else waits
        self.calls.remove_if(self.key, |_, current| {
            Arc::ptr_eq(current, call) && (call.initialized() || Arc::strong_count(call) == 2)
        });
    }
}
