pub mod chronos_client;

pub use chronos_client::{ChronosApi, ChronosClient};
