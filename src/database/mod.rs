pub mod repo;
pub mod schema;
pub mod tags;
