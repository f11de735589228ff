use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future that suspends the current task exactly once.
///
/// The load pipeline awaits one of these between expensive stages (image
/// decoding, compressed-geometry decoding, extension callbacks) so a host
/// executor can interleave other work and observe cancellation.
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

/// Creates a [`YieldNow`] future.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
