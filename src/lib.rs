//! ISO 9001 quality management server.

pub mod audits;
pub mod auth;
pub mod core;
pub mod dashboard;
pub mod directory;
pub mod documents;
pub mod kpis;
pub mod main_module;
pub mod nonconformities;
pub mod processes;
pub mod risks;
pub mod security;
pub mod training;
