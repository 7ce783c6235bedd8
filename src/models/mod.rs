pub mod booking;
pub mod criteria;
pub mod doctor;
pub mod session;
pub mod trigger;

pub use booking::{Booking, BookingStatus, PatientInfo};
pub use criteria::ParsedCriteria;
pub use doctor::{Doctor, DoctorOffer, Slot};
pub use session::{FlowStage, SessionParams};
pub use trigger::Trigger;
