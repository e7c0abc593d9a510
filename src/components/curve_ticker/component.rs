//! Leptos component wrapping the curve ticker.
//!
//! Nodes for every item copy are rendered once per item set and container
//! size; the frame loop never creates or removes them, it only rewrites
//! their transform, opacity and visibility.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::either::Either;
use leptos::prelude::*;
use log::{debug, info};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, PointerEvent, WheelEvent};

use super::motion::{
	AppearSweep, ItemFrame, ItemStyle, MotionConfig, TickerGeometry, TickerMotion, layout_items,
};
use super::render;
use super::types::{TickerConfig, TickerItem};
use crate::components::frame_loop::FrameLoop;
use crate::components::host::{self, ResizeWatcher, ViewportWatcher};
use crate::components::responsive::{ResponsiveConfig, ResponsiveValues};
use crate::components::sanitize::sanitize_svg;

const NODE_BASE_STYLE: &str = "position: absolute; left: 0; top: 50%; white-space: nowrap; \
	user-select: none; pointer-events: none; will-change: transform, opacity;";

fn responsive_values(config: &TickerConfig, width: f64) -> ResponsiveValues {
	ResponsiveValues::new(
		&ResponsiveConfig::with_mobile_speed(config.mobile_speed_factor),
		width,
	)
}

/// Frames for a ticker that never moves.
fn static_frames(config: &TickerConfig, width: f64) -> Vec<ItemFrame> {
	let geometry = TickerGeometry::new(config.items.len(), config.gap, width);
	let style = ItemStyle::new(config, &responsive_values(config, width));
	let mut frames = Vec::new();
	layout_items(&geometry, 0.0, &AppearSweep::Disabled, &style, &mut frames);
	frames
}

/// Per-instance state shared by the frame loop and the input handlers.
struct TickerContext {
	config: TickerConfig,
	motion_config: MotionConfig,
	style: ItemStyle,
	geometry: TickerGeometry,
	motion: TickerMotion,
	nodes: Vec<HtmlElement>,
	frames: Vec<ItemFrame>,
	previous: Vec<ItemFrame>,
	/// Whether the ticker has been in view, i.e. the appear sweep may run.
	seen: bool,
}

impl TickerContext {
	fn new(config: TickerConfig, width: f64) -> Self {
		let motion = TickerMotion::new(
			config.direction,
			AppearSweep::new(config.appear, config.appear_duration),
		);
		let mut ctx = Self {
			motion_config: MotionConfig::new(&config, &ResponsiveValues::default()),
			style: ItemStyle::new(&config, &ResponsiveValues::default()),
			geometry: TickerGeometry::new(0, config.gap, width),
			config,
			motion,
			nodes: Vec::new(),
			frames: Vec::new(),
			previous: Vec::new(),
			seen: false,
		};
		ctx.resize(width);
		ctx
	}

	/// Recompute everything that depends on the container width.
	fn resize(&mut self, width: f64) {
		let responsive = responsive_values(&self.config, width);
		self.motion_config = MotionConfig::new(&self.config, &responsive);
		self.style = ItemStyle::new(&self.config, &responsive);
		self.geometry = TickerGeometry::new(self.config.items.len(), self.config.gap, width);
	}

	fn reconfigure(&mut self, config: TickerConfig) {
		if config.items != self.config.items {
			self.motion.offset = 0.0;
			self.motion.velocity = 0.0;
		}
		if config.direction != self.config.direction {
			self.motion.direction = config.direction;
		}
		if config.appear != self.config.appear || config.appear_duration != self.config.appear_duration {
			self.motion.appear = self.motion.appear.reconfigured(config.appear, config.appear_duration);
			if self.seen {
				self.motion.appear.start();
			}
		}
		let width = self.geometry.container_width;
		self.config = config;
		self.resize(width);
	}

	/// The ticker entered the viewport (or can't tell); let the sweep play.
	fn reveal(&mut self) {
		self.seen = true;
		self.motion.appear.start();
	}

	/// Whether there is anything for the frame loop to move.
	fn is_animated(&self) -> bool {
		self.geometry.node_count() > 0
	}

	/// Re-collect the rendered nodes after the view replaced them.
	fn refresh_nodes(&mut self, track: &Element) {
		let expected = self.geometry.node_count();
		let stale = self.nodes.len() != expected
			|| self.nodes.first().is_some_and(|node| !node.is_connected());
		if !stale {
			return;
		}
		let children = track.children();
		self.nodes = (0..children.length())
			.filter_map(|i| children.item(i))
			.filter_map(|el| el.dyn_into::<HtmlElement>().ok())
			.collect();
		self.previous.clear();
	}

	/// Advance the motion and lay out every node into `frames`. Returns
	/// `false` when there is nothing to move.
	fn advance(&mut self, dt: f64) -> bool {
		if !self.is_animated() {
			self.frames.clear();
			return false;
		}
		self.motion.step(dt, &self.motion_config, self.geometry.gap);
		layout_items(
			&self.geometry,
			self.motion.offset,
			&self.motion.appear,
			&self.style,
			&mut self.frames,
		);
		true
	}

	fn step(&mut self, dt: f64, track: &Element) -> bool {
		if !self.advance(dt) {
			return false;
		}
		self.refresh_nodes(track);
		render::apply_frames(&self.nodes, &self.frames, &self.previous);
		std::mem::swap(&mut self.frames, &mut self.previous);
		true
	}
}

/// Window-level listeners for one drag gesture.
///
/// Detached on release, but the closures stay alive until the next drag or
/// unmount since the release handler is one of them.
struct WindowDrag {
	on_move: Closure<dyn FnMut(PointerEvent)>,
	on_up: Closure<dyn FnMut(PointerEvent)>,
}

impl WindowDrag {
	fn attach(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let _ = window.add_event_listener_with_callback("pointermove", self.on_move.as_ref().unchecked_ref());
		for name in ["pointerup", "pointercancel"] {
			let _ = window.add_event_listener_with_callback(name, self.on_up.as_ref().unchecked_ref());
		}
	}

	fn detach(&self) {
		detach_listeners(self.on_move.as_ref(), self.on_up.as_ref());
	}
}

fn detach_listeners(on_move: &JsValue, on_up: &JsValue) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let _ = window.remove_event_listener_with_callback("pointermove", on_move.unchecked_ref());
	for name in ["pointerup", "pointercancel"] {
		let _ = window.remove_event_listener_with_callback(name, on_up.unchecked_ref());
	}
}

impl Drop for WindowDrag {
	fn drop(&mut self) {
		self.detach();
	}
}

/// Observers kept alive for the component's lifetime.
struct Watchers {
	_resize: Option<ResizeWatcher>,
	_viewport: Option<ViewportWatcher>,
}

/// Scrolls `items` along a curved track.
///
/// Pass the host property bag via the reactive `config` signal. The ticker
/// fills its parent; items are centered on the track's vertical midline and
/// displaced by the configured curve.
#[component]
pub fn CurveTicker(
	/// Host property bag.
	#[prop(into)]
	config: Signal<TickerConfig>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let track_ref = NodeRef::<leptos::html::Div>::new();
	let reduced_motion = host::prefers_reduced_motion();

	let validated = Memo::new(move |_| config.get().validated());
	let width = RwSignal::new(0.0_f64);
	let items = Memo::new(move |_| validated.with(|c| c.items.clone()));
	let item_color = Memo::new(move |_| validated.with(|c| c.item_color.clone()));
	let copies = Memo::new(move |_| {
		validated.with(|c| TickerGeometry::new(c.items.len(), c.gap, width.get()).copies)
	});

	let context: Rc<RefCell<Option<TickerContext>>> = Rc::new(RefCell::new(None));
	let watchers: Rc<RefCell<Option<Watchers>>> = Rc::new(RefCell::new(None));
	let drag: Rc<RefCell<Option<WindowDrag>>> = Rc::new(RefCell::new(None));

	let context_anim = context.clone();
	let frame_loop = FrameLoop::new(move |dt| {
		let Some(track) = track_ref.get_untracked() else {
			return false;
		};
		context_anim
			.borrow_mut()
			.as_mut()
			.is_some_and(|c| c.step(dt, &track))
	});

	let (context_cfg, watchers_init, loop_cfg) = (context.clone(), watchers.clone(), frame_loop.clone());
	Effect::new(move |_| {
		let cfg = validated.get();
		let Some(container) = container_ref.get() else {
			return;
		};

		let mounted = context_cfg.borrow().is_some();
		if !mounted {
			let measured = container.client_width() as f64;
			width.set(measured);
			info!("fx-widgets: ticker mounted with {} items", cfg.items.len());
			*context_cfg.borrow_mut() = Some(TickerContext::new(cfg.clone(), measured));

			let (context_rs, loop_rs, container_rs) = (context_cfg.clone(), loop_cfg.clone(), container.clone());
			let resize = ResizeWatcher::observe(&container, move || {
				let measured = container_rs.client_width() as f64;
				let animated = match *context_rs.borrow_mut() {
					Some(ref mut c) => {
						c.resize(measured);
						c.is_animated()
					}
					None => false,
				};
				width.set(measured);
				if animated && !reduced_motion {
					loop_rs.wake();
				}
			});
			// Observed even with the sweep off, so enabling it later knows
			// whether the ticker is already in view.
			let context_vp = context_cfg.clone();
			let viewport = ViewportWatcher::observe(&container, move || {
				if let Some(ref mut c) = *context_vp.borrow_mut() {
					c.reveal();
				}
			});
			if viewport.is_none() {
				debug!("fx-widgets: no viewport observer, revealing ticker immediately");
				if let Some(ref mut c) = *context_cfg.borrow_mut() {
					c.reveal();
				}
			}
			*watchers_init.borrow_mut() = Some(Watchers {
				_resize: resize,
				_viewport: viewport,
			});
		} else {
			debug!("fx-widgets: ticker config changed");
			if let Some(ref mut c) = *context_cfg.borrow_mut() {
				c.reconfigure(cfg.clone());
			}
		}

		if !reduced_motion && !cfg.items.is_empty() {
			loop_cfg.wake();
		}
	});

	let context_enter = context.clone();
	let on_pointerenter = move |_: PointerEvent| {
		if let Some(ref mut c) = *context_enter.borrow_mut() {
			c.motion.hovered = true;
		}
	};

	let context_leave = context.clone();
	let on_pointerleave = move |_: PointerEvent| {
		if let Some(ref mut c) = *context_leave.borrow_mut() {
			c.motion.hovered = false;
		}
	};

	let (context_down, drag_down) = (context.clone(), drag.clone());
	let on_pointerdown = move |ev: PointerEvent| {
		if reduced_motion || !validated.with_untracked(|c| c.draggable) || ev.button() != 0 {
			return;
		}
		let started = match *context_down.borrow_mut() {
			Some(ref mut c) if c.geometry.node_count() > 0 => {
				c.motion.drag_start(ev.client_x() as f64, host::now_ms());
				true
			}
			_ => false,
		};
		if !started {
			return;
		}
		ev.prevent_default();

		let context_move = context_down.clone();
		let on_move = Closure::<dyn FnMut(PointerEvent)>::new(move |ev: PointerEvent| {
			if let Some(ref mut c) = *context_move.borrow_mut() {
				c.motion.drag_move(ev.client_x() as f64, host::now_ms(), &c.motion_config);
			}
		});
		let context_up = context_down.clone();
		let move_fn: JsValue = on_move.as_ref().clone();
		let up_fn: Rc<RefCell<Option<JsValue>>> = Rc::new(RefCell::new(None));
		let up_fn_cb = up_fn.clone();
		let on_up = Closure::<dyn FnMut(PointerEvent)>::new(move |_: PointerEvent| {
			if let Some(ref mut c) = *context_up.borrow_mut() {
				c.motion.drag_end(host::now_ms(), &c.motion_config);
			}
			if let Some(ref up) = *up_fn_cb.borrow() {
				detach_listeners(&move_fn, up);
			}
		});
		*up_fn.borrow_mut() = Some(on_up.as_ref().clone());

		let gesture = WindowDrag { on_move, on_up };
		gesture.attach();
		// Replacing the previous gesture detaches and frees it.
		*drag_down.borrow_mut() = Some(gesture);
	};

	let context_wheel = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		if reduced_motion || !validated.with_untracked(|c| c.wheel_control) {
			return;
		}
		let (dx, dy) = (ev.delta_x(), ev.delta_y());
		let delta = if dx.abs() > dy.abs() { dx } else { dy };
		if let Some(ref mut c) = *context_wheel.borrow_mut() {
			ev.prevent_default();
			c.motion.wheel(delta, &c.motion_config);
		}
	};

	let cleanup = SendWrapper::new((frame_loop, context, watchers, drag));
	on_cleanup(move || {
		let (frame_loop, context, watchers, drag) = cleanup.take();
		frame_loop.stop();
		drag.borrow_mut().take();
		watchers.borrow_mut().take();
		context.borrow_mut().take();
	});

	let nodes_view = move || {
		let items: Vec<TickerItem> = items.get();
		let count = items.len();
		let copies = copies.get();
		let color = item_color.get();
		let statics = if reduced_motion {
			validated.with(|c| static_frames(c, width.get()))
		} else {
			Vec::new()
		};
		let contents: Vec<(Option<String>, String)> = items
			.iter()
			.map(|item| match item.svg.as_deref() {
				Some(svg) => (sanitize_svg(svg), String::new()),
				None => (None, item.text.clone()),
			})
			.collect();

		(0..count * copies)
			.map(|idx| {
				let (markup, text) = &contents[idx % count];
				let placement = statics
					.get(idx)
					.map(ItemFrame::inline_style)
					.unwrap_or_else(|| "visibility: hidden;".into());
				let style = format!("{NODE_BASE_STYLE} color: {color}; {placement}");
				let content = match markup {
					Some(html) => Either::Left(view! {
						<span class="curve-ticker-svg" inner_html=html.clone()></span>
					}),
					None => Either::Right(view! { <span>{text.clone()}</span> }),
				};
				view! {
					<div
						class="curve-ticker-item"
						aria-hidden=(idx >= count).then_some("true")
						style=style
					>
						{content}
					</div>
				}
			})
			.collect_view()
	};

	let label = move || validated.with(|c| c.label.clone());
	let container_style = move || {
		let cursor = if validated.with(|c| c.draggable) && !reduced_motion {
			"grab"
		} else {
			"default"
		};
		format!(
			"position: relative; width: 100%; height: 100%; overflow: hidden; \
			 touch-action: pan-y; cursor: {cursor};"
		)
	};

	view! {
		<div
			node_ref=container_ref
			class="curve-ticker"
			role="marquee"
			aria-label=label
			on:pointerenter=on_pointerenter
			on:pointerleave=on_pointerleave
			on:pointerdown=on_pointerdown
			on:wheel=on_wheel
			style=container_style
		>
			<div
				node_ref=track_ref
				class="curve-ticker-track"
				style="position: absolute; inset: 0;"
			>
				{nodes_view}
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::curve_ticker::CurveKind;
	use crate::components::curve_ticker::motion::edge_fade;

	fn config(items: usize) -> TickerConfig {
		TickerConfig {
			items: (0..items).map(|i| TickerItem::from(format!("item {i}").as_str())).collect(),
			gap: 200.0,
			curve: CurveKind::Flat,
			appear: true,
			..TickerConfig::default()
		}
		.validated()
	}

	#[test]
	fn static_frames_sit_at_rest_and_fade_only_at_edges() {
		let cfg = config(3);
		let frames = static_frames(&cfg, 1000.0);
		let geometry = TickerGeometry::new(3, 200.0, 1000.0);
		assert_eq!(frames.len(), geometry.node_count());

		let mut visible = 0;
		for (idx, frame) in frames.iter().enumerate() {
			assert_eq!(frame.visible, geometry.is_visible(geometry.item_position(idx, 0.0)));
			if !frame.visible {
				continue;
			}
			visible += 1;
			assert_eq!(frame.x, geometry.item_position(idx, 0.0));
			assert_eq!(frame.y, 0.0);
			assert_eq!(frame.opacity, edge_fade(frame.x, 1000.0, cfg.fade_distance));
		}
		assert!(visible > 0);
		assert!(frames.iter().any(|f| f.visible && f.opacity == 1.0));
	}

	#[test]
	fn static_frames_for_no_items_are_empty() {
		assert!(static_frames(&config(0), 1000.0).is_empty());
	}

	#[test]
	fn empty_ticker_does_not_animate() {
		let mut ctx = TickerContext::new(config(0), 800.0);
		assert!(!ctx.is_animated());
		assert!(!ctx.advance(1.0 / 60.0));
		assert!(ctx.frames.is_empty());
		assert_eq!(ctx.motion.offset, 0.0);
	}

	#[test]
	fn ticker_with_items_lays_out_every_node() {
		let mut ctx = TickerContext::new(config(2), 800.0);
		ctx.reveal();
		assert!(ctx.is_animated());
		assert!(ctx.advance(1.0 / 60.0));
		assert_eq!(ctx.frames.len(), ctx.geometry.node_count());
	}

	#[test]
	fn enabling_appear_after_reveal_plays_the_sweep() {
		let mut ctx = TickerContext::new(TickerConfig { appear: false, ..config(2) }, 800.0);
		assert_eq!(ctx.motion.appear, AppearSweep::Disabled);
		ctx.reveal();

		ctx.reconfigure(TickerConfig {
			appear_duration: 2.0,
			..config(2)
		});
		assert!(matches!(
			ctx.motion.appear,
			AppearSweep::Running { duration, .. } if duration == 2.0
		));

		ctx.reconfigure(TickerConfig { appear: false, ..config(2) });
		assert_eq!(ctx.motion.appear, AppearSweep::Disabled);
	}

	#[test]
	fn appear_waits_until_the_ticker_is_seen() {
		let mut ctx = TickerContext::new(TickerConfig { appear: false, ..config(2) }, 800.0);
		ctx.reconfigure(config(2));
		assert!(matches!(ctx.motion.appear, AppearSweep::Waiting { .. }));
		ctx.reveal();
		assert!(matches!(ctx.motion.appear, AppearSweep::Running { .. }));
	}
}
