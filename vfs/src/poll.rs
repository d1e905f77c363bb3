use std::future::Future;
use std::task::{Context, Poll, Waker};

use crate::error::FetchError;
use crate::provider::VfsFuture;

/// Drive a fetch that completes without suspending, such as a read from
/// [`MemoryProvider`](crate::MemoryProvider), a `data:` URI or a blob.
///
/// # Panics
///
/// Panics if the future is still pending after one poll. Use an executor
/// for providers that actually wait.
pub fn poll_now<T>(mut fut: VfsFuture<T>) -> Result<T, FetchError> {
    let mut cx = Context::from_waker(Waker::noop());
    match fut.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("fetch suspended; poll_now only drives futures that are ready at once"),
    }
}
