#![doc = include_str!("../README.md")]

pub mod checkpoint;
pub mod cli;
pub mod discover;
pub mod engine;
pub mod error;
pub mod extract;
pub mod navigate;
pub mod normalize;
pub mod resolve;
pub mod selectors;
pub mod services;
pub mod session;
pub mod types;

pub use checkpoint::{CheckpointStore, FileCheckpoint};
pub use engine::*;
pub use error::*;
pub use navigate::{Navigator, OnExhaust};
pub use resolve::{FighterCache, Resolver};
pub use services::*;
pub use session::{Element, MemorySession, PageSession};
pub use types::*;
