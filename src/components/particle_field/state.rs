//! Particle simulation: pointer perturbation, spring return and settling.
//!
//! All coordinates are device pixels in "particle space": the padded canvas
//! whose top-left corner sits `pad` pixels above and left of the image.
//!
//! Constants are tuned per 60 Hz frame. [`ParticleField::tick`] scales them
//! by `dt × 60`, so the motion looks the same at any refresh rate and is
//! identical to a fixed-tick integration at exactly 60 Hz. Longer frames are
//! split into sub-steps of at most one 60 Hz frame each; a single scaled step
//! would let a stiff spring overshoot and never settle.

use crate::components::theme::Color;

use super::types::ParticleFieldConfig;

/// Pointer position used while no pointer is over the field.
pub const FAR_AWAY: f64 = -1.0e6;

/// Pointer speed (px per 60 Hz frame) below which the pointer is ignored.
const MIN_POINTER_SPEED: f64 = 0.5;
/// Weight of the newest pointer delta in the smoothed velocity.
const POINTER_SMOOTHING: f64 = 0.5;
/// Pointer velocity retained per frame once events stop arriving.
const POINTER_DECAY: f64 = 0.8;
/// How much pointer velocity transfers to particles ("smudge").
const SMUDGE_FACTOR: f64 = 0.35;
/// Scale of the radial push relative to `repulsion_strength`.
const REPULSION_SCALE: f64 = 0.25;
/// Scale of the tangential push relative to `swirl`.
const SWIRL_SCALE: f64 = 0.5;
/// Drift + speed under which a particle snaps home and counts as settled.
const SETTLE_EPSILON: f64 = 0.05;
/// Longest frame (in 60 Hz frames) integrated in one step.
const MAX_FRAME_SCALE: f64 = 3.0;

/// Speed (px per frame) above which a particle leaves a trail.
pub const TRAIL_SPEED: f64 = 2.0;
/// Most trailing squares painted behind one particle.
pub const MAX_TRAIL: usize = 4;
/// Trail reach as a multiple of one frame's travel.
const TRAIL_LENGTH: f64 = 1.5;
/// Alpha of the trail square nearest the particle.
const TRAIL_ALPHA: f64 = 0.5;

/// One sampled square of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub origin_x: f64,
	pub origin_y: f64,
	pub vx: f64,
	pub vy: f64,
	pub color: Color,
	pub size: f64,
}

impl Particle {
	pub fn new(x: f64, y: f64, color: Color, size: f64) -> Self {
		Self {
			x,
			y,
			origin_x: x,
			origin_y: y,
			vx: 0.0,
			vy: 0.0,
			color,
			size,
		}
	}

	/// Manhattan distance from the rest position.
	pub fn drift(&self) -> f64 {
		(self.x - self.origin_x).abs() + (self.y - self.origin_y).abs()
	}

	/// Whether the particle must be painted over the base image.
	pub fn is_displaced(&self) -> bool {
		self.x != self.origin_x || self.y != self.origin_y
	}

	pub fn speed(&self) -> f64 {
		self.vx.hypot(self.vy)
	}
}

/// Last known pointer position and smoothed velocity, in particle space.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerState {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
}

impl Default for PointerState {
	fn default() -> Self {
		Self {
			x: FAR_AWAY,
			y: FAR_AWAY,
			vx: 0.0,
			vy: 0.0,
		}
	}
}

impl PointerState {
	pub fn is_far(&self) -> bool {
		self.x <= FAR_AWAY / 2.0 || self.y <= FAR_AWAY / 2.0
	}

	/// Record a new pointer sample. The first sample after leaving only sets
	/// the position, so re-entry never produces a velocity spike.
	pub fn move_to(&mut self, x: f64, y: f64) {
		if self.is_far() {
			*self = Self {
				x,
				y,
				vx: 0.0,
				vy: 0.0,
			};
			return;
		}
		let (dx, dy) = (x - self.x, y - self.y);
		self.vx += (dx - self.vx) * POINTER_SMOOTHING;
		self.vy += (dy - self.vy) * POINTER_SMOOTHING;
		self.x = x;
		self.y = y;
	}

	pub fn leave(&mut self) {
		*self = Self::default();
	}

	pub fn speed(&self) -> f64 {
		self.vx.hypot(self.vy)
	}

	fn decay(&mut self, frame_scale: f64) {
		let retain = POINTER_DECAY.powf(frame_scale);
		self.vx *= retain;
		self.vy *= retain;
		if self.speed() < 0.01 {
			self.vx = 0.0;
			self.vy = 0.0;
		}
	}
}

/// Physics tunables in particle space.
#[derive(Clone, Debug, PartialEq)]
pub struct Physics {
	/// Influence radius in device px.
	pub radius: f64,
	pub return_speed: f64,
	pub friction: f64,
	pub repulsion_strength: f64,
	pub swirl: f64,
}

impl Physics {
	pub fn from_config(config: &ParticleFieldConfig, dpr: f64) -> Self {
		Self {
			radius: (config.dispersion_radius * dpr).max(1.0),
			return_speed: config.return_speed,
			friction: config.friction,
			repulsion_strength: config.repulsion_strength,
			swirl: config.swirl,
		}
	}
}

/// A square painted behind a fast particle to fake motion blur.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailMark {
	pub x: f64,
	pub y: f64,
	pub alpha: f64,
}

/// Trailing squares for `p`, nearest first. Empty below [`TRAIL_SPEED`].
pub fn trail_marks(p: &Particle) -> impl Iterator<Item = TrailMark> + '_ {
	let speed = p.speed();
	let count = if speed > TRAIL_SPEED {
		((speed / TRAIL_SPEED).floor() as usize).clamp(1, MAX_TRAIL)
	} else {
		0
	};
	(1..=count).map(move |i| {
		let t = i as f64 / (count + 1) as f64;
		TrailMark {
			x: p.x - p.vx * TRAIL_LENGTH * t,
			y: p.y - p.vy * TRAIL_LENGTH * t,
			alpha: TRAIL_ALPHA * (1.0 - t),
		}
	})
}

/// The simulated particle set for one built image.
///
/// Replaced wholesale on rebuild; individual particles are never removed.
#[derive(Clone, Debug)]
pub struct ParticleField {
	pub particles: Vec<Particle>,
	pub pointer: PointerState,
	physics: Physics,
}

impl ParticleField {
	pub fn new(particles: Vec<Particle>, physics: Physics) -> Self {
		Self {
			particles,
			pointer: PointerState::default(),
			physics,
		}
	}

	/// Swap tunables without resampling.
	pub fn set_physics(&mut self, physics: Physics) {
		self.physics = physics;
	}

	/// Advance by `dt` seconds. Returns whether anything is still moving
	/// (i.e. whether another frame is needed).
	pub fn tick(&mut self, dt: f64) -> bool {
		let k = (dt * 60.0).clamp(0.0, MAX_FRAME_SCALE);
		// Tolerance keeps an exact 60 Hz frame from rounding up to two sub-steps.
		let steps = ((k - 1e-6).ceil() as usize).max(1);
		let h = k / steps as f64;
		let mut moving = false;
		for _ in 0..steps {
			moving = self.integrate(h);
			self.pointer.decay(h);
		}
		moving || self.pointer.speed() > MIN_POINTER_SPEED
	}

	/// One sub-step of `k` 60 Hz frames (`k <= 1`). Returns whether any
	/// particle is still away from rest.
	fn integrate(&mut self, k: f64) -> bool {
		let physics = &self.physics;
		let friction = physics.friction.powf(k);
		let radius = physics.radius;
		let radius_sq = radius * radius;
		let max_velocity = 0.5 * radius;

		let pointer = &self.pointer;
		let pointer_speed = pointer.speed();
		let interacting = !pointer.is_far() && pointer_speed > MIN_POINTER_SPEED;

		let mut moving = false;
		for p in &mut self.particles {
			if interacting {
				let (dx, dy) = (p.x - pointer.x, p.y - pointer.y);
				let dist_sq = dx * dx + dy * dy;
				if dist_sq < radius_sq {
					let dist = dist_sq.sqrt().max(1e-3);
					let falloff = (1.0 - dist / radius).powi(2);
					let (nx, ny) = (dx / dist, dy / dist);
					let push = physics.repulsion_strength * REPULSION_SCALE * falloff;
					let twist = physics.swirl * SWIRL_SCALE * falloff;
					p.vx += (pointer.vx * SMUDGE_FACTOR * falloff + nx * push - ny * twist) * k;
					p.vy += (pointer.vy * SMUDGE_FACTOR * falloff + ny * push + nx * twist) * k;
				}
			}

			p.vx += (p.origin_x - p.x) * physics.return_speed * k;
			p.vy += (p.origin_y - p.y) * physics.return_speed * k;
			p.vx *= friction;
			p.vy *= friction;

			let speed = p.speed();
			if speed > max_velocity {
				let s = max_velocity / speed;
				p.vx *= s;
				p.vy *= s;
			}

			p.x += p.vx * k;
			p.y += p.vy * k;

			if p.drift() + p.vx.abs() + p.vy.abs() < SETTLE_EPSILON {
				p.x = p.origin_x;
				p.y = p.origin_y;
				p.vx = 0.0;
				p.vy = 0.0;
			} else {
				moving = true;
			}
		}
		moving
	}

	/// Particles that must be painted over the clean base image.
	pub fn displaced(&self) -> impl Iterator<Item = &Particle> {
		self.particles.iter().filter(|p| p.is_displaced())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DT: f64 = 1.0 / 60.0;

	fn physics() -> Physics {
		Physics::from_config(&ParticleFieldConfig::default(), 1.0)
	}

	fn settled(field: &ParticleField) -> bool {
		field.particles.iter().all(|p| !p.is_displaced() && p.vx == 0.0 && p.vy == 0.0)
	}

	fn grid(n: usize, spacing: f64) -> Vec<Particle> {
		(0..n * n)
			.map(|i| {
				let (cx, cy) = ((i % n) as f64, (i / n) as f64);
				Particle::new(cx * spacing, cy * spacing, Color::rgb(200, 10, 10), spacing)
			})
			.collect()
	}

	#[test]
	fn fast_pointer_pushes_nearby_particles() {
		let mut field = ParticleField::new(grid(10, 4.0), physics());
		field.pointer.move_to(10.0, 18.0);
		field.pointer.move_to(20.0, 18.0);
		assert!(field.tick(DT));
		assert!(field.displaced().count() > 0);
		// The smudge follows the pointer's direction of travel.
		let moved_right = field.particles.iter().filter(|p| p.vx > 0.0).count();
		assert!(moved_right > 0);
	}

	#[test]
	fn idle_pointer_does_not_perturb() {
		let mut field = ParticleField::new(grid(5, 4.0), physics());
		field.pointer.move_to(8.0, 8.0);
		assert!(!field.tick(DT));
		assert!(settled(&field));
	}

	#[test]
	fn settles_back_to_origin_and_halts() {
		let mut field = ParticleField::new(grid(8, 4.0), physics());
		for p in &mut field.particles {
			p.x += 25.0;
			p.y -= 10.0;
			p.vx = 6.0;
		}
		field.pointer.x = 5_000.0;
		field.pointer.y = 5_000.0;

		let mut frames = 0;
		while field.tick(DT) {
			frames += 1;
			assert!(frames < 2_000, "never settled");
		}
		assert!(settled(&field));
		for p in &field.particles {
			assert_eq!((p.x, p.y), (p.origin_x, p.origin_y));
		}
		// Once settled, further ticks are no-ops that keep reporting idle.
		assert!(!field.tick(DT));
	}

	#[test]
	fn velocity_is_clamped_to_half_radius() {
		let mut field = ParticleField::new(grid(1, 4.0), physics());
		field.particles[0].vx = 10_000.0;
		field.tick(DT);
		assert!(field.particles[0].speed() <= 0.5 * field.physics.radius + 1e-9);
	}

	#[test]
	fn swirl_adds_tangential_motion() {
		let mut still = physics();
		still.repulsion_strength = 0.0;
		let mut swirling = still.clone();
		swirling.swirl = 4.0;

		let run = |physics: Physics| {
			let mut field =
				ParticleField::new(vec![Particle::new(20.0, 0.0, Color::rgb(0, 0, 0), 2.0)], physics);
			field.pointer.move_to(0.0, 0.0);
			field.pointer.move_to(0.0, 0.001);
			field.pointer.vx = 1.0;
			field.pointer.vy = 0.0;
			field.tick(DT);
			field.particles[0].vy
		};
		assert!((run(still)).abs() < 1e-9);
		assert!(run(swirling) > 0.0);
	}

	#[test]
	fn reentry_does_not_spike_velocity() {
		let mut pointer = PointerState::default();
		pointer.move_to(100.0, 100.0);
		assert_eq!(pointer.speed(), 0.0);
		pointer.move_to(104.0, 100.0);
		assert_eq!(pointer.vx, 2.0);
		pointer.leave();
		assert!(pointer.is_far());
		pointer.move_to(0.0, 0.0);
		assert_eq!(pointer.speed(), 0.0);
	}

	#[test]
	fn trails_only_for_fast_particles() {
		let mut p = Particle::new(50.0, 50.0, Color::rgb(1, 1, 1), 2.0);
		p.vx = 1.0;
		assert_eq!(trail_marks(&p).count(), 0);

		p.vx = 5.0;
		let marks: Vec<_> = trail_marks(&p).collect();
		assert_eq!(marks.len(), 2);
		assert!(marks.iter().all(|m| m.x < p.x));
		assert!(marks[0].alpha > marks[1].alpha);

		p.vx = 100.0;
		assert_eq!(trail_marks(&p).count(), MAX_TRAIL);
	}

	#[test]
	fn long_frame_matches_two_short_ones() {
		let mut a = ParticleField::new(grid(1, 4.0), physics());
		let mut b = a.clone();
		a.particles[0].x += 10.0;
		b.particles[0].x += 10.0;
		a.tick(DT);
		a.tick(DT);
		b.tick(2.0 * DT);
		assert!((a.particles[0].x - b.particles[0].x).abs() < 1e-9);
		assert!((a.particles[0].vx - b.particles[0].vx).abs() < 1e-9);
	}

	#[test]
	fn stiff_spring_settles_at_low_frame_rates() {
		for dt in [0.04, 0.05] {
			for return_speed in [0.6, 1.0] {
				let stiff = Physics {
					radius: 60.0,
					return_speed,
					friction: 0.9,
					repulsion_strength: 4.0,
					swirl: 0.0,
				};
				let mut field = ParticleField::new(grid(1, 4.0), stiff);
				field.particles[0].x += 20.0;

				let mut frames = 0;
				while field.tick(dt) {
					frames += 1;
					assert!(frames < 1_000, "dt {dt}, return speed {return_speed}: never settled");
				}
				assert!(settled(&field));
				assert_eq!(field.particles[0].drift(), 0.0);
			}
		}
	}
}
