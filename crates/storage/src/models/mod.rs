pub mod event;
pub mod participation_request;
pub mod payment;
pub mod sector;
pub mod user;

pub use event::{Event, EventTargetSector};
pub use participation_request::{ParticipationRequest, ParticipationStatus};
pub use payment::{Payment, PaymentStatus};
pub use sector::Sector;
pub use user::Role;
