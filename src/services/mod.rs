// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod analytics_service;
pub mod auth_service;
pub mod cache;
pub mod comment_service;
pub mod firestore_client;
pub mod follow_service;
pub mod message_service;
pub mod note_service;
pub mod notification_service;
pub mod seeder;
pub mod sync_service;
pub mod user_service;

pub use analytics_service::*;
pub use auth_service::*;
pub use cache::*;
pub use comment_service::*;
pub use firestore_client::FirestoreClient;
pub use follow_service::*;
pub use message_service::*;
pub use note_service::*;
pub use notification_service::*;
pub use sync_service::*;
pub use user_service::*;
