//! Builders for server transcripts

mod replies;

pub use replies::ReplyBuilder;
