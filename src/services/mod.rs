pub mod export;
pub mod fetch;
pub mod log;

pub use export::*;
pub use fetch::*;
pub use log::*;
