pub mod bot;
pub mod config;
pub mod error;
pub mod form;
pub mod messenger;
pub mod quiz;
pub mod store;
