//! Rendering module
//!
//! Translates a normalized connection descriptor into configuration text
//! for one of the supported on-premises daemons.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     FormatRegistry (facade)         │
//! └──────────────┬──────────────────────┘
//!                │
//!    ┌───────────┼───────────┬──────────┐
//!    │           │           │          │
//!    ▼           ▼           ▼          ▼
//! ┌──────┐   ┌──────┐   ┌──────┐   ┌──────┐
//! │ sswan│   │racoon│   │quagga│   │ bird │  <- Renderers
//! └──────┘   └──────┘   └──────┘   └──────┘
//! ```
//!
//! Each renderer implements the `Renderer` trait and owns its target
//! daemon's configuration grammar completely; the registry is the only
//! dispatch point. Renderers are pure functions over the descriptor:
//! identical input yields byte-identical output, and tunnel 1 always
//! precedes tunnel 2 in the rendered text.

pub mod renderer;
pub mod registry;
pub mod strongswan;
pub mod racoon;
pub mod quagga;
pub mod bird;

pub use renderer::{ConfigFormat, Rendered, Renderer, RendererFactory};
pub use registry::FormatRegistry;
