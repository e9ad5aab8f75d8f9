mod batch;
mod diff;
mod init;

pub use self::batch::batch;
pub use self::diff::diff;
pub use self::init::init;
