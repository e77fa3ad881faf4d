//! Streaming markdown rendering for `streamdown`.
//!
//! The crate has three layers:
//!
//! - [`highlight`]: the `??text??` inline-highlight transform. A pure rewriting
//!   pass over text leaves, applied while markdown is converted into renderable
//!   blocks. Highlighted spans carry a hover label.
//! - [`reveal`]: the incremental reveal controller. A sans-io session that
//!   discloses a fixed payload as a growing prefix on one clock and blinks a
//!   caret flag on a second, independent clock. The host polls it and asks for
//!   the next wake-up deadline; there are no timers to leak.
//! - [`view`] and [`streaming`]: a markdown view (parse, wrap, scroll, hover
//!   hit-testing) and [`streaming::RevealView`], which feeds the controller's
//!   prefix into the view and draws the caret and hover popovers.
//!
//! ## Minimal example
//!
//! ```rust,no_run
//! use std::time::Instant;
//! use streamdown_markdown::streaming::RevealView;
//!
//! let mut view = RevealView::default();
//! view.set_source("# Hello\n\nStreaming ??highlighted?? markdown.", Instant::now());
//!
//! // In your event loop:
//! let now = Instant::now();
//! let needs_redraw = view.poll(now);
//! let wake_up = view.next_deadline(); // sleep until then (or the next input event)
//! # let _ = (needs_redraw, wake_up);
//! ```
pub mod highlight;
pub mod reveal;
pub mod streaming;
pub mod view;
