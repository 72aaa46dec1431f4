//! Driver for a Lumencor SPECTRA X style light engine on a 9600 8E1 serial link.
//!
//! [`LightEngine`] encodes channel enable, intensity and temperature requests
//! into the engine's fixed binary frames and tracks the enable register so
//! toggles flip exactly the requested channels.

pub mod channel;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod shared;

pub use channel::{Channel, DacBank, Filter};
pub use config::ControllerConfig;
pub use device::LightEngine;
pub use error::{Error, Result};
pub use shared::SharedLightEngine;
