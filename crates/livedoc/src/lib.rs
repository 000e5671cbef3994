pub mod error;
pub mod types;

pub mod binding;
pub mod cache;
pub mod events;
pub mod remote;
