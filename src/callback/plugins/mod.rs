//! Built-in callback plugins.

mod default;
mod minimal;
mod null;

pub use default::DefaultCallback;
pub use minimal::MinimalCallback;
pub use null::NullCallback;
