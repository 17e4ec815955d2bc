pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod geo;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;
