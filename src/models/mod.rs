pub mod label;
pub mod recipe;
pub mod user;
