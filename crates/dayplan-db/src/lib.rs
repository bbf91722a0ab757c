//! Persistence layer for dayplan: row models, query functions, connection
//! pooling and embedded migrations.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
