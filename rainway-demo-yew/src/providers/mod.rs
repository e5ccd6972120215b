mod demo_provider;

pub use demo_provider::{DemoProvider, DemoProviderProps};
