pub mod build_number;
pub mod builder;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod git;
pub mod notify;
pub mod options;
pub mod pipeline;
pub mod publish;
pub mod remote;
pub mod tagger;
pub mod tools;
pub mod ui;
pub mod version;
pub mod warnings;

pub use error::{DeployError, Result};
