// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod comment_repository;
pub mod follow_repository;
pub mod like_repository;
pub mod message_repository;
pub mod note_repository;
pub mod notification_repository;
pub mod user_repository;

pub use comment_repository::*;
pub use follow_repository::*;
pub use like_repository::*;
pub use message_repository::*;
pub use note_repository::*;
pub use notification_repository::*;
pub use user_repository::*;
