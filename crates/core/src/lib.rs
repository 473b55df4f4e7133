mod assets;
mod provider;

pub mod completion;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod title;

#[cfg(test)]
mod test_utils;

pub use crate::assets::{find_system_message_file, get_config_dir, get_data_dir};
pub use crate::provider::llm::get_completion_llm;
