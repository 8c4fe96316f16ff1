pub mod clock;
pub mod filename;
pub mod storage_service;
pub mod upload_service;

pub use clock::{Clock, SystemClock};
pub use storage_service::{PendingWrite, StorageService};
pub use upload_service::UploadService;
