//! Assistant reply sources
//!
//! - `HttpReplyClient`: remote chat-completion endpoint
//! - `KeywordReplyClient`: offline triage rules

mod client;
mod keyword;
pub mod messages;

pub use client::{reply_or_fallback, HttpReplyClient, ReplyClient, EMPTY_REPLY, FALLBACK_REPLY};
pub use keyword::{
    KeywordReplyClient, ACKNOWLEDGE_REPLY, GENERAL_PRACTICE_REPLY, URGENT_CARE_REPLY,
};
pub use messages::{ReplyRequest, ReplyResponse};
