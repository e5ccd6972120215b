mod sdk_trait;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "web")]
pub mod web;

pub use sdk_trait::*;
