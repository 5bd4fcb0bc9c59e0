//! Content provider contract and registry for Trellis.
//!
//! Listing pages and artifact detail routes are backed by pluggable
//! [`ContentProvider`]s. The engine owns the [`ProviderRegistry`] mapping
//! artifact types to providers; everything behind the contract (storage,
//! query execution, tiering) belongs to the provider.
//!
//! The `mock` feature adds [`MockProvider`], an in-memory implementation
//! used by the server's router tests.

#[cfg(feature = "mock")]
mod mock;
mod provider;
mod registry;

#[cfg(feature = "mock")]
pub use mock::MockProvider;
pub use provider::{
    AccessVerdict, ContentItem, ContentProvider, QueryParams, QueryResult, SortDirection,
    TypeConfig, Viewer,
};
pub use registry::{ProviderRegistry, RegistryStats};
