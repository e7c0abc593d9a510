//! `requestAnimationFrame` driver with an explicit idle/active state machine.
//!
//! A widget hands its per-frame step to [`FrameLoop`]. The step returns
//! whether it wants another frame; when it returns `false` the loop goes
//! idle and issues no further requests until [`FrameLoop::wake`] is called
//! again (typically from an input handler). All state lives on the single
//! browser thread: event handlers and the frame callback never overlap.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

/// Upper bound on a single frame's `dt`, so a stalled tab doesn't cause a jump.
pub const MAX_FRAME_DT: f64 = 0.05;

/// `dt` assumed for the first frame after waking.
pub const DEFAULT_FRAME_DT: f64 = 1.0 / 60.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
	/// No frame requested. Waiting for input.
	#[default]
	Idle,
	/// A frame is requested or running.
	Active,
	/// Owner unmounted. Terminal.
	Stopped,
}

/// Pure scheduling state behind [`FrameLoop`].
#[derive(Clone, Debug, Default)]
pub struct LoopScheduler {
	state: LoopState,
	last_timestamp: Option<f64>,
}

impl LoopScheduler {
	#[cfg(test)]
	pub fn state(&self) -> LoopState {
		self.state
	}

	/// Idle -> Active. Returns true when the caller must request a frame.
	pub fn wake(&mut self) -> bool {
		if self.state == LoopState::Idle {
			self.state = LoopState::Active;
			self.last_timestamp = None;
			true
		} else {
			false
		}
	}

	/// Start a frame at `timestamp_ms`, returning the capped `dt` in seconds,
	/// or `None` if the loop is not active.
	pub fn begin_frame(&mut self, timestamp_ms: f64) -> Option<f64> {
		if self.state != LoopState::Active {
			return None;
		}
		let dt = match self.last_timestamp {
			Some(last) => ((timestamp_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT),
			None => DEFAULT_FRAME_DT,
		};
		self.last_timestamp = Some(timestamp_ms);
		Some(dt)
	}

	/// Finish a frame. Returns true when another frame must be requested.
	pub fn finish_frame(&mut self, keep_running: bool) -> bool {
		if self.state != LoopState::Active {
			return false;
		}
		if !keep_running {
			self.state = LoopState::Idle;
		}
		keep_running
	}

	pub fn stop(&mut self) {
		self.state = LoopState::Stopped;
	}
}

struct FrameLoopInner {
	scheduler: RefCell<LoopScheduler>,
	handle: Cell<Option<i32>>,
	callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoopInner {
	fn request(&self) {
		if self.handle.get().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(ref cb) = *self.callback.borrow() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				self.handle.set(Some(id));
			}
		}
	}
}

/// Browser frame loop. Cloning shares the same loop.
#[derive(Clone)]
pub struct FrameLoop {
	inner: Rc<FrameLoopInner>,
}

impl FrameLoop {
	/// Create an idle loop around `step`, which receives `dt` in seconds and
	/// returns whether it needs another frame.
	pub fn new(mut step: impl FnMut(f64) -> bool + 'static) -> Self {
		let inner = Rc::new(FrameLoopInner {
			scheduler: RefCell::new(LoopScheduler::default()),
			handle: Cell::new(None),
			callback: RefCell::new(None),
		});
		let weak: Weak<FrameLoopInner> = Rc::downgrade(&inner);
		*inner.callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			inner.handle.set(None);
			let Some(dt) = inner.scheduler.borrow_mut().begin_frame(timestamp) else {
				return;
			};
			let keep_running = step(dt);
			if inner.scheduler.borrow_mut().finish_frame(keep_running) {
				inner.request();
			}
		}));
		Self { inner }
	}

	/// Resume the loop if it is idle.
	pub fn wake(&self) {
		if self.inner.scheduler.borrow_mut().wake() {
			self.inner.request();
		}
	}

	/// Stop for good: cancel the pending frame and release the callback.
	pub fn stop(&self) {
		self.inner.scheduler.borrow_mut().stop();
		if let (Some(id), Some(window)) = (self.inner.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.inner.callback.borrow_mut().take();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wakes_once_and_goes_idle_when_settled() {
		let mut s = LoopScheduler::default();
		assert_eq!(s.state(), LoopState::Idle);
		assert!(s.wake());
		assert!(!s.wake(), "already active, no second request");

		assert_eq!(s.begin_frame(1000.0), Some(DEFAULT_FRAME_DT));
		assert!(s.finish_frame(true));
		let dt = s.begin_frame(1016.0).unwrap();
		assert!((dt - 0.016).abs() < 1e-9);
		assert!(!s.finish_frame(false));
		assert_eq!(s.state(), LoopState::Idle);
		assert_eq!(s.begin_frame(1032.0), None);
	}

	#[test]
	fn dt_is_capped_after_stall() {
		let mut s = LoopScheduler::default();
		s.wake();
		s.begin_frame(0.0);
		s.finish_frame(true);
		assert_eq!(s.begin_frame(5_000.0), Some(MAX_FRAME_DT));
	}

	#[test]
	fn stopped_never_wakes() {
		let mut s = LoopScheduler::default();
		s.wake();
		s.stop();
		assert!(!s.finish_frame(true));
		assert!(!s.wake());
		assert_eq!(s.state(), LoopState::Stopped);
	}
}
