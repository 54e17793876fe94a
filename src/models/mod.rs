// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod comment;
pub mod follow;
pub mod geo;
pub mod message;
pub mod note;
pub mod notification;
pub mod user;

pub use comment::*;
pub use follow::*;
pub use message::*;
pub use note::*;
pub use notification::*;
pub use user::*;
