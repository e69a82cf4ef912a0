//! GainForge DSP library — high-gain tube amp signal chain.
//!
//! Pure DSP math with no audio framework dependencies.

// Building blocks
pub mod filters;
pub mod smoother;

// Amp stages
pub mod preamp;
pub mod rectifier;
pub mod tone_stack;
pub mod voicing;

// Controls
pub mod params;
pub mod state;

// Engine
pub mod driver;
pub mod engine;

pub use driver::AmpDriver;
pub use engine::{ChannelEngine, EngineState};
pub use params::{AmpParams, RectifierMode};
pub use state::{AmpState, StateError};
pub use voicing::{Mode, Voice};
