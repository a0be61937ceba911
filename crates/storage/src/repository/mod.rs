pub mod event;
pub mod participation;
pub mod payment;
pub mod sector;
