pub mod generator;
pub mod inventory;
