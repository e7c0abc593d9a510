//! Thin wrappers over the browser primitives the widgets depend on:
//! resize and pixel-ratio observation, viewport intersection, timers and
//! environment queries.
//!
//! Each wrapper owns its JS callback and disconnects on drop, so a widget
//! only has to drop the wrapper on unmount.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, MediaQueryList, ResizeObserver};

/// Whether the user asked the OS for reduced motion.
pub fn prefers_reduced_motion() -> bool {
	web_sys::window()
		.and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
		.map(|mq| mq.matches())
		.unwrap_or(false)
}

/// Device pixel ratio, defaulting to 1.0 when unavailable or nonsensical.
pub fn device_pixel_ratio() -> f64 {
	web_sys::window()
		.map(|w| w.device_pixel_ratio())
		.filter(|dpr| dpr.is_finite() && *dpr > 0.0)
		.unwrap_or(1.0)
}

/// Wall-clock milliseconds, used to timestamp pointer samples.
pub fn now_ms() -> f64 {
	js_sys::Date::now()
}

/// Calls back whenever the observed element changes size.
pub struct ResizeWatcher {
	observer: ResizeObserver,
	_callback: Closure<dyn FnMut()>,
}

impl ResizeWatcher {
	pub fn observe(target: &Element, on_resize: impl FnMut() + 'static) -> Option<Self> {
		let callback = Closure::<dyn FnMut()>::new(on_resize);
		let observer = ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
		observer.observe(target);
		Some(Self {
			observer,
			_callback: callback,
		})
	}
}

impl Drop for ResizeWatcher {
	fn drop(&mut self) {
		self.observer.disconnect();
	}
}

/// Media query matching exactly the given device pixel ratio.
fn resolution_query(dpr: f64) -> String {
	format!("(resolution: {dpr}dppx)")
}

/// Calls back whenever the device pixel ratio changes, e.g. on browser zoom
/// or when the window moves to a screen with different density.
///
/// A resolution query only ever reports leaving its ratio, so the watcher
/// re-arms itself with the new ratio after every change.
pub struct PixelRatioWatcher {
	inner: Rc<PixelRatioQuery>,
}

struct PixelRatioQuery {
	query: RefCell<Option<MediaQueryList>>,
	callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl PixelRatioQuery {
	fn arm(&self) {
		self.disarm();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Ok(Some(query)) = window.match_media(&resolution_query(device_pixel_ratio())) else {
			return;
		};
		if let Some(callback) = self.callback.borrow().as_ref() {
			let _ = query.add_event_listener_with_callback("change", callback.as_ref().unchecked_ref());
		}
		*self.query.borrow_mut() = Some(query);
	}

	fn disarm(&self) {
		let Some(query) = self.query.borrow_mut().take() else {
			return;
		};
		if let Some(callback) = self.callback.borrow().as_ref() {
			let _ = query.remove_event_listener_with_callback("change", callback.as_ref().unchecked_ref());
		}
	}
}

impl PixelRatioWatcher {
	pub fn observe(mut on_change: impl FnMut() + 'static) -> Option<Self> {
		let inner = Rc::new(PixelRatioQuery {
			query: RefCell::new(None),
			callback: RefCell::new(None),
		});
		let weak: Weak<PixelRatioQuery> = Rc::downgrade(&inner);
		*inner.callback.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.arm();
			}
			on_change();
		}));
		inner.arm();
		if inner.query.borrow().is_none() {
			return None;
		}
		Some(Self { inner })
	}
}

impl Drop for PixelRatioWatcher {
	fn drop(&mut self) {
		self.inner.disarm();
	}
}

/// Calls back the first time (and every time) the target enters the viewport.
pub struct ViewportWatcher {
	observer: IntersectionObserver,
	_callback: Closure<dyn FnMut(js_sys::Array)>,
}

impl ViewportWatcher {
	pub fn observe(target: &Element, mut on_enter: impl FnMut() + 'static) -> Option<Self> {
		let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
			let entered = entries.iter().any(|entry| {
				entry
					.dyn_into::<IntersectionObserverEntry>()
					.map(|e| e.is_intersecting())
					.unwrap_or(false)
			});
			if entered {
				on_enter();
			}
		});
		let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref()).ok()?;
		observer.observe(target);
		Some(Self {
			observer,
			_callback: callback,
		})
	}
}

impl Drop for ViewportWatcher {
	fn drop(&mut self) {
		self.observer.disconnect();
	}
}

/// Coalesces bursts of calls into one callback after `delay_ms` of quiet.
pub struct Debouncer {
	delay_ms: i32,
	pending: Rc<Cell<Option<i32>>>,
	callback: Closure<dyn FnMut()>,
}

impl Debouncer {
	pub fn new(delay_ms: i32, mut action: impl FnMut() + 'static) -> Self {
		let pending = Rc::new(Cell::new(None));
		let pending_cb = pending.clone();
		let callback = Closure::<dyn FnMut()>::new(move || {
			pending_cb.set(None);
			action();
		});
		Self {
			delay_ms,
			pending,
			callback,
		}
	}

	/// (Re)start the quiet period.
	pub fn call(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(id) = self.pending.take() {
			window.clear_timeout_with_handle(id);
		}
		if let Ok(id) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
			self.callback.as_ref().unchecked_ref(),
			self.delay_ms,
		) {
			self.pending.set(Some(id));
		}
	}
}

impl Drop for Debouncer {
	fn drop(&mut self) {
		if let (Some(id), Some(window)) = (self.pending.take(), web_sys::window()) {
			window.clear_timeout_with_handle(id);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolution_query_names_the_exact_ratio() {
		assert_eq!(resolution_query(1.0), "(resolution: 1dppx)");
		assert_eq!(resolution_query(1.5), "(resolution: 1.5dppx)");
		assert_eq!(resolution_query(2.625), "(resolution: 2.625dppx)");
	}
}
