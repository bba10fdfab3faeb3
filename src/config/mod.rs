pub mod schema;

pub use schema::{AxonConfig, AxonMode, Config, DebateSettings, StorageConfig};
