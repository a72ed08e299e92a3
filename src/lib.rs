pub mod admin;
pub mod app;
pub mod config;
pub mod db;
pub mod game;
pub mod identity;
pub mod ledger;
pub mod models;
pub mod progress;
pub mod shell;
