//! Double-buffered frame exchange between producer and consumer threads.
//!
//! The producer owns the back buffer outright and writes to it without any
//! locking; the front buffer sits behind a single mutex that the consumer
//! holds while it reads. `swap()` exchanges the two values under that mutex,
//! which is the only synchronization point between the two threads.
//!
//! Policy: the swap blocks while the consumer still holds the front buffer
//! (i.e. mid-encode). The alternative — a swap-pending flag the consumer
//! honors at its next safe point — trades that producer stall for sometimes
//! encoding a stale frame, and is deliberately not implemented here.

use parking_lot::Mutex;
use std::sync::Arc;

struct Shared<T> {
    front: Mutex<T>,
}

/// Producer-side handle: exclusive access to the back buffer plus `swap()`.
pub struct FrameWriter<T> {
    shared: Arc<Shared<T>>,
    back: T,
}

/// Consumer-side handle: locked access to the front buffer.
pub struct FrameReader<T> {
    shared: Arc<Shared<T>>,
}

/// Create a connected writer/reader pair. `front` is what the reader sees
/// first; `back` is the writer's initial drawing surface.
pub fn double_buffer<T>(front: T, back: T) -> (FrameWriter<T>, FrameReader<T>) {
    let shared = Arc::new(Shared {
        front: Mutex::new(front),
    });
    (
        FrameWriter {
            shared: shared.clone(),
            back,
        },
        FrameReader { shared },
    )
}

impl<T> FrameWriter<T> {
    /// The writable back buffer. Valid to mutate freely until `swap()`.
    pub fn back_mut(&mut self) -> &mut T {
        &mut self.back
    }

    /// Exchange front and back. O(1): only the two values move, no contents
    /// are copied. Blocks while the reader holds the front buffer.
    pub fn swap(&mut self) {
        let mut front = self.shared.front.lock();
        std::mem::swap(&mut *front, &mut self.back);
    }
}

impl<T> FrameReader<T> {
    /// Run `f` with the front buffer locked. The writer's `swap()` blocks for
    /// the duration, so the closure must not observe a torn frame.
    pub fn with_front<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut front = self.shared.front.lock();
        f(&mut front)
    }
}
