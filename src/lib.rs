pub mod aggregate;
pub mod database;
pub mod model;
pub mod pipeline;
pub mod repository;
pub mod screen;
pub mod state;
pub mod wire;
