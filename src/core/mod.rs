//! # Core Module
//!
//! Small shared-ownership primitives used throughout the engine.
//!
//! The whole simulation runs on the frame thread, so the only primitive the
//! engine needs is a single-threaded, reference-counted resource handle.
//!
//! ## Key Components
//! - `StResource`: Single-threaded reference-counted resource with interior mutability
//!
//! ## Usage
//! ```rust
//! use voxel_sandbox::core::StResource;
//!
//! let overlay = StResource::new(Vec::<u8>::new());
//! let shared = overlay.clone();
//! shared.get_mut().push(1);
//! assert_eq!(overlay.get().len(), 1);
//! ```

pub mod st_resource;

pub use st_resource::StResource;
