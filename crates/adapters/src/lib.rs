//! image-relay adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `reddit`: Reddit API post source
//! - `http_fetch`: HTTP image downloader
//! - `telegram`: Telegram Bot API photo sink
//! - `seen_file`: Flat-file seen-set store
//! - `stubs`: Canned implementations for tests and offline runs

mod http_fetch;
mod reddit;
mod seen_file;
mod stubs;
mod telegram;

pub use http_fetch::HttpImageFetcher;
pub use reddit::RedditPostSource;
pub use seen_file::FileSeenStore;
pub use stubs::{RecordingPhotoSink, StubPostSource};
pub use telegram::TelegramPhotoSink;
