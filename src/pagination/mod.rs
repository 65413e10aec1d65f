//! Pagination module
//!
//! Cursor-based continuation over the comments endpoint.
//!
//! # Overview
//!
//! Each page response carries a forward token (`next_min_id`), a backward
//! token (`next_max_id`) and more-available flags. [`CommentsPage::next_page`]
//! turns those into either the next [`Cursor`] or [`NextPage::Done`].

mod types;

pub use types::{
    CommentsPage, Cursor, NextPage, RawComment, RawUser, StringOrNumber, BACKWARD_PARAM,
    FORWARD_PARAM,
};
