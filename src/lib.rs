pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod entity;
pub mod handler;
pub mod predicate;
