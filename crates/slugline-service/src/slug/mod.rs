//! The slug engine: configuration, token building, scope and uniqueness
//! resolution, lifecycle and lookup.

pub mod engine;
pub mod lookup;
pub mod options;
pub mod registry;
pub mod scope;
pub mod token;
pub mod uniqueness;

pub use engine::SlugEngine;
pub use lookup::{LookupArg, LookupMode, LookupOptions};
pub use options::{ScopeDescriptor, SlugConfig, SlugOptions};
pub use registry::{Association, RegisteredType, TypeDefinition, TypeRegistry};
