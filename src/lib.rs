#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod axon;
pub mod config;
pub mod debate;
pub mod error;

pub use axon::{AxonAdapter, CompletionProvider, create_adapter};
pub use config::{AxonMode, Config};
pub use debate::{DebateRunner, DebateSession, DebateView, SqliteDebateStore};
pub use error::{AxonConsoleError, Result};
