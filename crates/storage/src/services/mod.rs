pub mod catalog;
pub mod participation;
pub mod settlement;
