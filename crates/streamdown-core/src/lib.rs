//! `streamdown-core` provides the primitives shared by the streamdown widgets.
//!
//! This crate is intentionally small and event-loop agnostic: you drive input and
//! rendering from your app, widgets never own timers or spawn threads. Everything
//! runs on the main thread.
//!
//! Useful entry points:
//! - [`viewport::ViewportState`]: scroll/clamp state for widgets with larger-than-area content.
//! - [`render`]: clipped span rendering and a minimal scrollbar.
//! - [`overlay::PopoverState`]: transient hover popovers anchored near the pointer.
//! - [`input`]: backend-agnostic input events, with an optional `crossterm` feature for
//!   conversion from crossterm events.
pub mod input;
pub mod overlay;
pub mod render;
pub mod theme;
pub mod viewport;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;
