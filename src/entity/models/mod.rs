pub mod exception_management;
pub mod nems_subscription;
pub mod participant_demographic;

pub use exception_management::ExceptionManagement;
pub use nems_subscription::NemsSubscription;
pub use participant_demographic::ParticipantDemographic;
