//! Particle dispersion image.
//!
//! Renders a raster image as a grid of colored square particles on a canvas:
//! - Contain-fit sampling at device resolution, one particle per visible cell
//! - Pointer smudge, radial repulsion and optional swirl around the cursor
//! - Spring return with friction, settling back to a pixel-exact image
//! - Motion-blur trails for fast particles
//! - A frame loop that sleeps whenever the field is at rest
//!
//! # Example
//!
//! ```ignore
//! use fx_widgets::{ParticleFieldCanvas, ParticleFieldConfig};
//!
//! let config = ParticleFieldConfig {
//!     image: "/logo.png".into(),
//!     dispersion_radius: 80.0,
//!     ..Default::default()
//! };
//!
//! view! { <ParticleFieldCanvas config=config /> }
//! ```

mod component;
pub(crate) mod layout;
mod render;
pub(crate) mod state;
mod types;

pub use component::ParticleFieldCanvas;
pub use types::{FieldError, ParticleFieldConfig};
