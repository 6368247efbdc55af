pub mod config;
pub mod error;
pub mod pages;
pub mod records;
pub mod session;
pub mod shared;
pub mod ui;
pub mod urls;
