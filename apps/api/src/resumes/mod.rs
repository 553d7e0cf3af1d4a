//! Resume submission: the caller that wraps the upload pipeline with the
//! duplicate-application guard, file storage and persistence.

pub mod files;
pub mod handlers;
pub mod pipeline;
pub mod service;
pub mod store;

#[cfg(test)]
pub mod memory;
