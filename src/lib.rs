pub mod adapters;
#[cfg(feature = "server")]
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::PublishSettings;
pub use core::{
    executor::WorkflowExecutor,
    publisher::{EndpointPublisher, NotifyPolicy},
    store::WorkflowStore,
};
pub use utils::error::{ConnectError, Result};
