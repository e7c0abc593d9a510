//! Leptos component wrapping the particle field canvas.
//!
//! The component loads the configured image, samples it into particles and
//! wires pointer handlers that perturb them. The frame loop only runs while
//! particles are in motion: pointer movement wakes it, settling stops it.
//! Container resizes are debounced before the particles are rebuilt.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlImageElement, PointerEvent};

use super::layout::{FieldLayout, sample_particles, sampling_step};
use super::render::{self, BaseImage};
use super::state::{ParticleField, Physics};
use super::types::{FieldError, ParticleFieldConfig};
use crate::components::frame_loop::FrameLoop;
use crate::components::host::{self, Debouncer, PixelRatioWatcher, ResizeWatcher};

/// Quiet period after the last resize before particles are rebuilt.
const RESIZE_DEBOUNCE_MS: i32 = 150;

/// Everything derived from one build pass.
struct FieldContext {
	layout: FieldLayout,
	field: ParticleField,
	base: BaseImage,
	ctx: CanvasRenderingContext2d,
}

/// An in-flight or completed image load. Detaches its handlers on drop so a
/// superseded load can never call into freed closures.
struct ImageLoader {
	image: HtmlImageElement,
	_on_load: Closure<dyn FnMut()>,
	_on_error: Closure<dyn FnMut()>,
}

impl Drop for ImageLoader {
	fn drop(&mut self) {
		self.image.set_onload(None);
		self.image.set_onerror(None);
	}
}

/// Resize plumbing kept alive for the component's lifetime.
struct Watchers {
	_resize: Option<ResizeWatcher>,
	_pixel_ratio: Option<PixelRatioWatcher>,
	_debounce: Rc<Debouncer>,
}

fn build(
	image: &HtmlImageElement,
	container: &Element,
	canvas: &HtmlCanvasElement,
	config: &ParticleFieldConfig,
) -> Result<FieldContext, FieldError> {
	let dpr = host::device_pixel_ratio();
	let layout = FieldLayout::compute(
		image.natural_width() as f64,
		image.natural_height() as f64,
		container.client_width() as f64,
		container.client_height() as f64,
		dpr,
		config.dispersion_radius,
	)?;

	let (base, pixels) = render::rasterize(image, &layout)?;
	let (bw, bh) = (layout.buffer_width as usize, layout.buffer_height as usize);
	let step = sampling_step(config.particle_size, dpr, bw, bh);
	let particles = sample_particles(&pixels, bw, bh, step, layout.pad);

	canvas.set_width(layout.canvas_width);
	canvas.set_height(layout.canvas_height);
	let (left, top, width, height) = layout.canvas_css_rect();
	let style = web_sys::HtmlElement::style(canvas);
	let _ = style.set_property("left", &format!("{left}px"));
	let _ = style.set_property("top", &format!("{top}px"));
	let _ = style.set_property("width", &format!("{width}px"));
	let _ = style.set_property("height", &format!("{height}px"));

	let ctx = render::context_2d(canvas)?;
	Ok(FieldContext {
		field: ParticleField::new(particles, Physics::from_config(config, dpr)),
		layout,
		base,
		ctx,
	})
}

/// Renders an image that disperses into particles around the pointer.
///
/// Pass the host property bag via the reactive `config` signal. The widget
/// fills its parent; the canvas overflows the container by a margin derived
/// from the dispersion radius so displaced particles are never clipped.
#[component]
pub fn ParticleFieldCanvas(
	/// Host property bag.
	#[prop(into)]
	config: Signal<ParticleFieldConfig>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let error = RwSignal::new(None::<String>);
	let reduced_motion = host::prefers_reduced_motion();

	let context: Rc<RefCell<Option<FieldContext>>> = Rc::new(RefCell::new(None));
	let loaded: Rc<RefCell<Option<HtmlImageElement>>> = Rc::new(RefCell::new(None));
	let loader: Rc<RefCell<Option<ImageLoader>>> = Rc::new(RefCell::new(None));
	let watchers: Rc<RefCell<Option<Watchers>>> = Rc::new(RefCell::new(None));

	let context_anim = context.clone();
	let frame_loop = FrameLoop::new(move |dt| {
		let mut guard = context_anim.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return false;
		};
		let keep_running = c.field.tick(dt);
		render::render(&c.field, &c.ctx, &c.base, &c.layout);
		keep_running
	});

	let (context_build, loaded_build) = (context.clone(), loaded.clone());
	let rebuild: Rc<dyn Fn()> = Rc::new(move || {
		let (Some(container), Some(canvas)) = (container_ref.get_untracked(), canvas_ref.get_untracked())
		else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(image) = loaded_build.borrow().clone() else {
			return;
		};
		let cfg = config.get_untracked().validated();

		match build(&image, &container, &canvas, &cfg) {
			Ok(c) => {
				info!(
					"fx-widgets: particle field built with {} particles ({}x{} CSS px at {}x)",
					c.field.particles.len(),
					c.layout.css_width,
					c.layout.css_height,
					c.layout.dpr
				);
				render::render_static(&c.ctx, &c.base, &c.layout);
				*context_build.borrow_mut() = Some(c);
				error.set(None);
			}
			Err(e) => {
				warn!("fx-widgets: particle field build failed: {}", e);
				*context_build.borrow_mut() = None;
				render::clear(&canvas);
				error.set(Some(cfg.error_text.clone()));
			}
		}
	});

	let (loaded_load, loader_load, context_load, rebuild_load) =
		(loaded.clone(), loader.clone(), context.clone(), rebuild.clone());
	let load_image = move |src: &str, error_text: String| {
		// The previous image stays neither interactive nor visible while the
		// new one loads, or after it fails.
		loader_load.borrow_mut().take();
		loaded_load.borrow_mut().take();
		context_load.borrow_mut().take();
		if let Some(canvas) = canvas_ref.get_untracked() {
			render::clear(&canvas);
		}
		if src.is_empty() {
			warn!("fx-widgets: {}", FieldError::MissingSource);
			error.set(Some(error_text));
			return;
		}
		let Ok(image) = HtmlImageElement::new() else {
			error.set(Some(error_text));
			return;
		};
		image.set_cross_origin(Some("anonymous"));

		let error_text_err = error_text.clone();
		let (loaded_ok, rebuild_ok, image_ok) = (loaded_load.clone(), rebuild_load.clone(), image.clone());
		let on_load = Closure::<dyn FnMut()>::new(move || {
			if image_ok.natural_width() == 0 || image_ok.natural_height() == 0 {
				warn!("fx-widgets: {}", FieldError::EmptyImage);
				error.set(Some(error_text.clone()));
				return;
			}
			*loaded_ok.borrow_mut() = Some(image_ok.clone());
			rebuild_ok();
		});
		let failed_src = src.to_string();
		let on_error = Closure::<dyn FnMut()>::new(move || {
			warn!("fx-widgets: {}", FieldError::ImageLoad(failed_src.clone()));
			error.set(Some(error_text_err.clone()));
		});
		image.set_onload(Some(on_load.as_ref().unchecked_ref()));
		image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
		image.set_src(src);

		*loader_load.borrow_mut() = Some(ImageLoader {
			image,
			_on_load: on_load,
			_on_error: on_error,
		});
	};

	let (context_cfg, watchers_init, rebuild_cfg) = (context.clone(), watchers.clone(), rebuild.clone());
	Effect::new(move |prev: Option<ParticleFieldConfig>| {
		let cfg = config.get().validated();

		if watchers_init.borrow().is_none() {
			if let Some(container) = container_ref.get() {
				let rebuild_resize = rebuild_cfg.clone();
				let debounce = Rc::new(Debouncer::new(RESIZE_DEBOUNCE_MS, move || {
					debug!("fx-widgets: particle field resized, rebuilding");
					rebuild_resize();
				}));
				let (debounce_resize, debounce_dpr) = (debounce.clone(), debounce.clone());
				let resize = ResizeWatcher::observe(&container, move || debounce_resize.call());
				let pixel_ratio = PixelRatioWatcher::observe(move || {
					debug!("fx-widgets: device pixel ratio changed");
					debounce_dpr.call();
				});
				*watchers_init.borrow_mut() = Some(Watchers {
					_resize: resize,
					_pixel_ratio: pixel_ratio,
					_debounce: debounce,
				});
			}
		}

		match prev {
			Some(ref old) if old.image == cfg.image && cfg.needs_rebuild(old) => {
				debug!("fx-widgets: sampling parameters changed, rebuilding");
				rebuild_cfg();
			}
			Some(ref old) if old.image == cfg.image => {
				if let Some(ref mut c) = *context_cfg.borrow_mut() {
					c.field.set_physics(Physics::from_config(&cfg, c.layout.dpr));
				}
			}
			_ => load_image(&cfg.image, cfg.error_text.clone()),
		}
		cfg
	});

	let (context_pm, loop_pm) = (context.clone(), frame_loop.clone());
	let on_pointermove = move |ev: PointerEvent| {
		if reduced_motion {
			return;
		}
		let Some(container) = container_ref.get_untracked() else {
			return;
		};
		let rect = container.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		if let Some(ref mut c) = *context_pm.borrow_mut() {
			let (px, py) = c.layout.to_particle_space(x, y);
			c.field.pointer.move_to(px, py);
		}
		loop_pm.wake();
	};

	let context_pl = context.clone();
	let on_pointerleave = move |_: PointerEvent| {
		if let Some(ref mut c) = *context_pl.borrow_mut() {
			c.field.pointer.leave();
		}
	};

	let cleanup = SendWrapper::new((frame_loop, context, loaded, loader, watchers));
	on_cleanup(move || {
		let (frame_loop, context, loaded, loader, watchers) = cleanup.take();
		frame_loop.stop();
		watchers.borrow_mut().take();
		loader.borrow_mut().take();
		loaded.borrow_mut().take();
		context.borrow_mut().take();
	});

	let error_style = move || {
		format!(
			"position: absolute; inset: 0; display: flex; align-items: center; \
			 justify-content: center; font: 14px sans-serif; color: {};",
			config.with(|c| c.validated().error_color)
		)
	};
	let label = move || config.with(|c| c.alt.clone());

	view! {
		<div
			node_ref=container_ref
			class="particle-field"
			role="img"
			aria-label=label
			on:pointermove=on_pointermove
			on:pointerleave=on_pointerleave
			style="position: relative; width: 100%; height: 100%; touch-action: none;"
		>
			<canvas
				node_ref=canvas_ref
				class="particle-field-canvas"
				aria-hidden="true"
				style="position: absolute; display: block; pointer-events: none;"
			/>
			{move || {
				error
					.get()
					.map(|msg| {
						view! {
							<div
								class="particle-field-error"
								style=error_style
							>
								{msg}
							</div>
						}
					})
			}}
		</div>
	}
}
