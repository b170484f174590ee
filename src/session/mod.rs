mod session;
mod types;

pub use session::{StopAction, TransferSession};
pub use types::{Operation, SessionSnapshot, UploadStatus};
