pub mod collect;
pub mod info;
pub mod jobs;
pub mod videos;
