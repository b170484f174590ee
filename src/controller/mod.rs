mod controller;
mod error;
mod scheduler;
mod state_machine;
mod types;

pub use controller::TransferController;
pub use error::{UploadError, UploadResult};
pub use scheduler::UploadScheduler;
pub use state_machine::{StatusEvent, StatusMachine};
pub use types::{UploadOutcome, UploadRequest};
