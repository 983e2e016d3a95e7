//! Services separating image I/O and format handling from request logic

pub mod fetch;
pub mod format;
pub mod io;

pub use fetch::ImageFetcher;
pub use format::OutputFormatHandler;
pub use io::ImageIOService;
