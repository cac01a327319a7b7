pub mod calendar;
pub mod cli;
pub mod clients;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod runtime;
pub mod service;
pub mod tasks;
