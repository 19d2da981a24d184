pub mod bulk;
pub mod provider;

pub use bulk::BulkProvider;
pub use provider::{Provider, ProviderInfo, SourceMode, TransformMode};
