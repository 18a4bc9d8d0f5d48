pub mod ancestors;
pub mod engine;
