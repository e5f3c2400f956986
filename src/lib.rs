pub mod annotate;
pub mod auth;
pub mod canon;
pub mod config;
pub mod export;
pub mod layout;
pub mod model;
pub mod producer;
pub mod publish;
pub mod registry;
pub mod sink;
pub mod table;
