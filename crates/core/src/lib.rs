pub mod config;
pub mod error;
pub mod plan;
pub mod post;
pub mod style;
pub mod tone;

pub use config::Config;
pub use error::*;
pub use plan::PlanTier;
pub use post::*;
pub use style::*;
pub use tone::{PostLength, Tone};
