//! Core library for the day-and-night watchface companion.
//!
//! This crate defines:
//! - The location → sun data → watch message sequence
//! - Abstractions over the location source, HTTP transport and watch channel
//! - Shared domain models and the classified error taxonomy
//! - Configuration handling
//!
//! It is used by `daynight-cli`, but the adapters are traits so other hosts
//! can plug in their own platform capabilities.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod forwarder;
pub mod location;
pub mod model;
pub mod pipeline;

pub use config::Config;
pub use error::{ChannelError, LocationError, Stage, SyncError};
pub use fetcher::{HttpTransport, ReqwestTransport, SunTimeFetcher};
pub use forwarder::{JsonLinesChannel, MessageChannel};
pub use location::{FixedLocation, IpLocation, LocationProvider, PositionOptions};
pub use model::{Coordinates, MessageKey, OutboundMessage, Position, SunTimes};
pub use pipeline::{Companion, SequenceReport, SequenceState};
