use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use super::yield_now::{YieldNow, yield_now};

/// Error returned when a load is cancelled at a checkpoint.
///
/// The load pipeline converts this into [`GltfError::Cancelled`](crate::gltf::GltfError::Cancelled)
/// and drops everything it has built so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("load cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Token that signals cancellation to an in-flight load.
///
/// Cloning a token creates another handle to the same flag, so the caller
/// keeps one clone and hands another to [`Viewer::load`](crate::viewer::Viewer::load).
#[derive(Clone, Debug)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new token (not cancelled).
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` if cancellation has been signalled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Suspends once and then checks this token.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.clone())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`CancellationToken::checkpoint`].
///
/// Suspends once like [`YieldNow`], checking the token on both sides of the
/// suspension. A token cancelled before the first poll resolves immediately.
pub struct Checkpoint {
    inner: YieldNow,
    token: CancellationToken,
}

impl Checkpoint {
    fn new(token: CancellationToken) -> Self {
        Self {
            inner: yield_now(),
            token,
        }
    }
}

impl Future for Checkpoint {
    type Output = Result<(), Cancelled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Cancelled>> {
        self.token.check()?;
        let yielded = Pin::new(&mut self.inner).poll(cx);
        yielded.map(|()| self.token.check())
    }
}
