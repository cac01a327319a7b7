pub mod event_store;
pub mod preferences;
pub mod session;
pub mod storage;
pub mod summary;
pub mod tracker;
