//! Resource model and the ports the application layer depends on.

pub mod models;
pub mod notification;
pub mod ports;
pub mod resource;
pub mod status;
