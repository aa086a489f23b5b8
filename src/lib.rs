pub mod api;
pub mod book;
pub mod client;
pub mod config;
pub mod controller;
pub mod lookup;
pub mod validation;
