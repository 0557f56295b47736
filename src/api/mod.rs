pub mod captions;
pub mod types;
pub mod ytdlp;

pub use captions::InnertubeTranscripts;
pub use types::{
    ListingEntry, PlatformError, TranscriptError, TranscriptSource, TranscriptVariant,
    VideoDetail, VideoPlatform,
};
pub use ytdlp::YtDlpPlatform;
