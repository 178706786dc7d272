use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Stops a [`FrameLoop`] from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            log::info!("Frame loop cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the previous frame.
    pub delta: f32,
    pub frame: u64,
}

/// Drives the unconditional per-frame update until cancelled.
pub struct FrameLoop {
    cancel: CancelHandle,
    last_frame: Instant,
    frame: u64,
}

impl FrameLoop {
    /// Frame deltas are clamped so a stalled window does not make the scrub jump.
    pub const MAX_DELTA: Duration = Duration::from_millis(100);

    pub fn new() -> Self {
        Self {
            cancel: CancelHandle::default(),
            last_frame: Instant::now(),
            frame: 0,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns the next tick, or `None` once the loop has been cancelled.
    pub fn next_frame(&mut self) -> Option<FrameTick> {
        self.next_frame_at(Instant::now())
    }

    fn next_frame_at(&mut self, now: Instant) -> Option<FrameTick> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let delta = now
            .saturating_duration_since(self.last_frame)
            .min(Self::MAX_DELTA);
        self.last_frame = now;
        self.frame += 1;

        Some(FrameTick {
            delta: delta.as_secs_f32(),
            frame: self.frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_until_cancelled() {
        let mut frame_loop = FrameLoop::new();
        let handle = frame_loop.cancel_handle();

        assert_eq!(frame_loop.next_frame().map(|tick| tick.frame), Some(1));
        assert_eq!(frame_loop.next_frame().map(|tick| tick.frame), Some(2));

        handle.cancel();
        assert!(frame_loop.is_cancelled());
        assert_eq!(frame_loop.next_frame(), None);
    }

    #[test]
    fn cancelling_from_another_thread_is_observed() {
        let mut frame_loop = FrameLoop::new();
        let handle = frame_loop.cancel_handle();

        std::thread::spawn(move || handle.cancel()).join().unwrap();
        assert_eq!(frame_loop.next_frame(), None);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut frame_loop = FrameLoop::new();
        let start = frame_loop.last_frame;

        let tick = frame_loop.next_frame_at(start + Duration::from_secs(5)).unwrap();
        assert_eq!(tick.delta, FrameLoop::MAX_DELTA.as_secs_f32());
    }
}
