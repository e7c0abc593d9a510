//! Widgets and the browser plumbing they share.

pub mod curve_ticker;
pub(crate) mod frame_loop;
pub(crate) mod host;
pub(crate) mod numeric;
pub mod particle_field;
pub(crate) mod responsive;
pub(crate) mod sanitize;
pub(crate) mod theme;
