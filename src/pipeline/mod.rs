pub mod builder;
pub mod cancel;
pub mod defaults;
pub mod runtime;
pub mod traits;
