pub mod app;
pub mod auth;
pub mod config;
pub mod pages;
pub mod state;
pub mod users;
