//! Curve ticker: a tiled, endlessly scrolling strip of items whose track is
//! bent into a curve.
//!
//! [`CurveTicker`] is the Leptos entry point. The pure parts live beside it:
//!
//! - `curve`: track curves and tangent rotation
//! - `motion`: geometry, per-item wrapping and the drag / momentum / snap
//!   state machine

mod component;
pub(crate) mod curve;
pub(crate) mod motion;
mod render;
mod types;

pub use component::CurveTicker;
pub use curve::CurveKind;
pub use types::{Direction, TickerConfig, TickerItem};
