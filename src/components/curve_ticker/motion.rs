//! Ticker motion: track geometry, per-item wrapping, and the
//! drag / momentum / snap state machine.
//!
//! The offset is an unbounded scroll distance along a virtual infinite
//! track. Every rendered copy of every item is wrapped individually against
//! the render period, so items leave and re-enter one at a time inside the
//! off-screen buffer instead of the whole strip jumping at once.
//!
//! Time-based smoothing uses `value += (target - value) * (1 - e^(-rate * dt))`,
//! which eases out and is independent of frame rate.

use super::curve::CurveKind;
use super::types::{Direction, TickerConfig};
use crate::components::responsive::ResponsiveValues;

/// Floor for the item gap, guarding every division by it.
pub const MIN_GAP: f64 = 1.0;
/// Fastest fling accepted from a drag, px/s.
pub const MAX_FLING_VELOCITY: f64 = 8_000.0;
/// Momentum below this (px/s) is dropped.
pub const MIN_MOMENTUM: f64 = 5.0;

/// Rate (1/s) at which the playback speed approaches its target.
const SPEED_LERP_RATE: f64 = 4.0;
/// Rate (1/s) of the snap ease toward the nearest item.
const SNAP_RATE: f64 = 10.0;
/// Snap distance (px) considered arrived.
const SNAP_EPSILON: f64 = 0.5;
/// Weight of the newest drag sample in the release velocity.
const DRAG_VELOCITY_SMOOTHING: f64 = 0.8;
/// Pointer held still this long (ms) before release means no fling.
const DRAG_RELEASE_STALE_MS: f64 = 100.0;
/// Shortest interval (s) between drag samples used for velocity.
const MIN_SAMPLE_INTERVAL: f64 = 0.001;
/// Width of the staggered reveal window, as a fraction of the container.
const APPEAR_STAGGER_WINDOW: f64 = 0.25;
/// Distance (px) items rise while being revealed.
const APPEAR_RISE: f64 = 24.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn ease_out_quad(t: f64) -> f64 {
	1.0 - (1.0 - t) * (1.0 - t)
}

/// Derived sizes for one ticker: how many copies tile the track and where
/// the item wrap happens.
#[derive(Clone, Debug, PartialEq)]
pub struct TickerGeometry {
	pub item_count: usize,
	pub gap: f64,
	pub copies: usize,
	pub container_width: f64,
	/// Off-screen margin on each side inside which items wrap.
	pub buffer: f64,
}

impl TickerGeometry {
	pub fn new(item_count: usize, gap: f64, container_width: f64) -> Self {
		let gap = if gap.is_finite() { gap.max(MIN_GAP) } else { MIN_GAP };
		let container_width = if container_width.is_finite() {
			container_width.max(0.0)
		} else {
			0.0
		};
		let buffer = gap;
		let copies = if item_count == 0 {
			0
		} else {
			let cycle = item_count as f64 * gap;
			(((container_width + buffer) / cycle).ceil() as usize + 1).max(2)
		};
		Self {
			item_count,
			gap,
			copies,
			container_width,
			buffer,
		}
	}

	/// Length of one logical cycle of items.
	pub fn total_item_width(&self) -> f64 {
		self.item_count as f64 * self.gap
	}

	/// Span after which the rendered strip repeats.
	pub fn period(&self) -> f64 {
		self.copies as f64 * self.total_item_width()
	}

	/// Number of rendered nodes (items × copies).
	pub fn node_count(&self) -> usize {
		self.item_count * self.copies
	}

	/// Center position of rendered node `idx` for `offset`, in
	/// `[-total_item_width, period - total_item_width)`.
	pub fn item_position(&self, idx: usize, offset: f64) -> f64 {
		let period = self.period();
		if period <= 0.0 {
			return 0.0;
		}
		(idx as f64 * self.gap - offset).rem_euclid(period) - self.total_item_width()
	}

	pub fn is_visible(&self, x: f64) -> bool {
		x >= -self.buffer && x <= self.container_width + self.buffer
	}
}

/// One-shot reveal played when the ticker first enters the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AppearSweep {
	/// No reveal; items are fully shown.
	Disabled,
	/// Waiting to enter the viewport; items hidden and still.
	Waiting { duration: f64 },
	Running { elapsed: f64, duration: f64 },
	Done,
}

impl AppearSweep {
	pub fn new(enabled: bool, duration: f64) -> Self {
		if enabled {
			AppearSweep::Waiting {
				duration: duration.max(0.01),
			}
		} else {
			AppearSweep::Disabled
		}
	}

	/// Begin the sweep. Only the first call has any effect.
	pub fn start(&mut self) {
		if let AppearSweep::Waiting { duration } = *self {
			*self = AppearSweep::Running {
				elapsed: 0.0,
				duration,
			};
		}
	}

	/// Carry the sweep over to new settings. Progress made so far is kept;
	/// enabling it on a live ticker starts over from [`AppearSweep::Waiting`].
	pub fn reconfigured(self, enabled: bool, duration: f64) -> Self {
		let duration = duration.max(0.01);
		match self {
			_ if !enabled => AppearSweep::Disabled,
			AppearSweep::Disabled | AppearSweep::Waiting { .. } => AppearSweep::Waiting { duration },
			AppearSweep::Running { elapsed, .. } => AppearSweep::Running { elapsed, duration },
			AppearSweep::Done => AppearSweep::Done,
		}
	}

	pub fn advance(&mut self, dt: f64) {
		if let AppearSweep::Running { elapsed, duration } = *self {
			let elapsed = elapsed + dt;
			*self = if elapsed >= duration {
				AppearSweep::Done
			} else {
				AppearSweep::Running { elapsed, duration }
			};
		}
	}

	/// Eased trace progress in [0, 1].
	pub fn progress(&self) -> f64 {
		match *self {
			AppearSweep::Disabled | AppearSweep::Done => 1.0,
			AppearSweep::Waiting { .. } => 0.0,
			AppearSweep::Running { elapsed, duration } => {
				ease_out_cubic((elapsed / duration).clamp(0.0, 1.0))
			}
		}
	}

	/// Reveal amount for an item at normalized position `nx` (0 = left
	/// edge, 1 = right edge). Sweeps left to right.
	pub fn reveal(&self, nx: f64) -> f64 {
		let progress = self.progress();
		if progress >= 1.0 {
			return 1.0;
		}
		let local = (progress * (1.0 + APPEAR_STAGGER_WINDOW) - nx.clamp(0.0, 1.0))
			/ APPEAR_STAGGER_WINDOW;
		ease_out_quad(local.clamp(0.0, 1.0))
	}
}

/// Motion tunables resolved for the current layout.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionConfig {
	/// Autonomous speed after responsive scaling, px/s.
	pub speed: f64,
	pub pause_on_hover: bool,
	pub snap_to_item: bool,
	pub momentum_damping: f64,
	pub drag_changes_direction: bool,
}

impl MotionConfig {
	pub fn new(config: &TickerConfig, responsive: &ResponsiveValues) -> Self {
		Self {
			speed: config.speed * responsive.speed_factor,
			pause_on_hover: config.pause_on_hover,
			snap_to_item: config.snap_to_item,
			momentum_damping: config.momentum_damping,
			drag_changes_direction: config.drag_changes_direction,
		}
	}
}

/// Who is driving the offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
	/// Autonomous scrolling.
	Idle,
	/// Offset follows the pointer.
	Dragging,
	/// Released with velocity; decaying.
	Momentum,
	/// Easing toward the nearest item.
	Snapping,
}

/// Mutable motion state for one mounted ticker.
#[derive(Clone, Debug)]
pub struct TickerMotion {
	pub offset: f64,
	/// Momentum velocity, px/s (positive grows the offset).
	pub velocity: f64,
	/// Smoothed autonomous speed, px/s.
	pub current_speed: f64,
	pub direction: Direction,
	pub hovered: bool,
	pub appear: AppearSweep,
	phase: DragPhase,
	last_sample: Option<(f64, f64)>,
}

impl TickerMotion {
	pub fn new(direction: Direction, appear: AppearSweep) -> Self {
		Self {
			offset: 0.0,
			velocity: 0.0,
			current_speed: 0.0,
			direction,
			hovered: false,
			appear,
			phase: DragPhase::Idle,
			last_sample: None,
		}
	}

	#[cfg(test)]
	pub fn phase(&self) -> DragPhase {
		self.phase
	}

	/// Advance one frame of `dt` seconds.
	pub fn step(&mut self, dt: f64, config: &MotionConfig, gap: f64) {
		let dt = dt.max(0.0);
		self.appear.advance(dt);

		let target = if config.pause_on_hover && self.hovered {
			0.0
		} else {
			config.speed * self.appear.progress()
		};
		self.current_speed += (target - self.current_speed) * (1.0 - (-SPEED_LERP_RATE * dt).exp());

		match self.phase {
			DragPhase::Dragging => {}
			DragPhase::Momentum => {
				self.velocity *= config.momentum_damping.powf(dt * 60.0);
				self.offset += self.velocity * dt;
				if self.velocity.abs() < MIN_MOMENTUM {
					self.velocity = 0.0;
					self.phase = self.after_release(config);
				}
			}
			DragPhase::Snapping => {
				let gap = gap.max(MIN_GAP);
				let target = (self.offset / gap).round() * gap;
				let diff = target - self.offset;
				if diff.abs() < SNAP_EPSILON {
					self.offset = target;
					self.phase = DragPhase::Idle;
				} else {
					self.offset += diff * (1.0 - (-SNAP_RATE * dt).exp());
				}
			}
			DragPhase::Idle => {
				self.offset += self.current_speed * dt * self.direction.sign();
			}
		}
	}

	fn after_release(&self, config: &MotionConfig) -> DragPhase {
		if config.snap_to_item {
			DragPhase::Snapping
		} else {
			DragPhase::Idle
		}
	}

	/// Pointer pressed at `x` (px) at `time_ms`.
	pub fn drag_start(&mut self, x: f64, time_ms: f64) {
		self.phase = DragPhase::Dragging;
		self.velocity = 0.0;
		self.current_speed = 0.0;
		self.last_sample = Some((x, time_ms));
	}

	/// Pointer moved to `x` while pressed.
	pub fn drag_move(&mut self, x: f64, time_ms: f64, config: &MotionConfig) {
		if self.phase != DragPhase::Dragging {
			return;
		}
		let Some((last_x, last_t)) = self.last_sample else {
			self.last_sample = Some((x, time_ms));
			return;
		};
		let dx = x - last_x;
		let interval = ((time_ms - last_t) / 1000.0).max(MIN_SAMPLE_INTERVAL);
		self.offset -= dx;

		let instant = (-dx / interval).clamp(-MAX_FLING_VELOCITY, MAX_FLING_VELOCITY);
		self.velocity += (instant - self.velocity) * DRAG_VELOCITY_SMOOTHING;

		if config.drag_changes_direction && dx != 0.0 {
			self.direction = if dx < 0.0 {
				Direction::Left
			} else {
				Direction::Right
			};
		}
		self.last_sample = Some((x, time_ms));
	}

	/// Pointer released at `time_ms`.
	pub fn drag_end(&mut self, time_ms: f64, config: &MotionConfig) {
		if self.phase != DragPhase::Dragging {
			return;
		}
		let stale = self
			.last_sample
			.is_some_and(|(_, t)| time_ms - t > DRAG_RELEASE_STALE_MS);
		self.last_sample = None;
		if stale || self.velocity.abs() < MIN_MOMENTUM {
			self.velocity = 0.0;
			self.phase = self.after_release(config);
		} else {
			self.phase = DragPhase::Momentum;
		}
	}

	/// Scroll-wheel input of `delta` px.
	pub fn wheel(&mut self, delta: f64, config: &MotionConfig) {
		if self.phase == DragPhase::Dragging || !delta.is_finite() {
			return;
		}
		self.offset += delta;
		self.velocity = 0.0;
		self.phase = self.after_release(config);
	}
}

/// Presentation of one rendered node for a frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemFrame {
	pub visible: bool,
	pub x: f64,
	pub y: f64,
	pub rotation: f64,
	pub opacity: f64,
	pub scale: f64,
}

impl ItemFrame {
	/// Compositor-only transform: translation, optional rotation and scale.
	pub fn transform(&self) -> String {
		let mut t = format!(
			"translate3d({:.2}px, {:.2}px, 0) translate(-50%, -50%)",
			self.x, self.y
		);
		if self.rotation != 0.0 {
			t.push_str(&format!(" rotateZ({:.2}deg)", self.rotation));
		}
		if self.scale != 1.0 {
			t.push_str(&format!(" scale({})", self.scale));
		}
		t
	}

	/// Inline style for the node. Used for statically rendered frames.
	pub fn inline_style(&self) -> String {
		if !self.visible {
			return "visibility: hidden;".into();
		}
		format!(
			"visibility: visible; transform: {}; opacity: {:.3};",
			self.transform(),
			self.opacity
		)
	}
}

/// Linear fade over `distance` px at both edges.
pub fn edge_fade(x: f64, width: f64, distance: f64) -> f64 {
	if distance <= 0.0 {
		return 1.0;
	}
	(x.min(width - x) / distance).clamp(0.0, 1.0)
}

/// Item styling shared by every node.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemStyle {
	pub curve: CurveKind,
	pub rotate: bool,
	pub scale: f64,
	/// Edge fade distance after responsive scaling, px.
	pub fade_distance: f64,
}

impl ItemStyle {
	pub fn new(config: &TickerConfig, responsive: &ResponsiveValues) -> Self {
		Self {
			curve: config.curve.clone(),
			rotate: config.rotate_items,
			scale: config.item_scale,
			fade_distance: config.fade_distance * responsive.fade_factor,
		}
	}
}

/// Compute the frame of every rendered node into `out`.
pub fn layout_items(
	geometry: &TickerGeometry,
	offset: f64,
	appear: &AppearSweep,
	style: &ItemStyle,
	out: &mut Vec<ItemFrame>,
) {
	out.clear();
	let width = geometry.container_width;
	for idx in 0..geometry.node_count() {
		let x = geometry.item_position(idx, offset);
		if !geometry.is_visible(x) {
			out.push(ItemFrame::default());
			continue;
		}
		let point = style.curve.evaluate(x, width);
		let reveal = appear.reveal(if width > 0.0 { x / width } else { 0.0 });
		out.push(ItemFrame {
			visible: true,
			x,
			y: point.y + (1.0 - reveal) * APPEAR_RISE,
			rotation: if style.rotate { point.rotation } else { 0.0 },
			opacity: edge_fade(x, width, style.fade_distance) * reveal,
			scale: style.scale,
		});
	}
}
