// src/services/comment_service.rs

use crate::db::{CommentRepository, NoteRepository};
use crate::errors::BoardError;
use crate::models::{CommentResponse, CreateCommentRequest, NotificationKind, User};
use crate::services::{FirestoreClient, NotesCache, NotificationService, SyncService, UserService};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub struct CommentService;

impl CommentService {
    /// Comments of a note, newest first, with authors embedded
    pub async fn list_for_note(pool: &PgPool, note_id: Uuid) -> Result<Vec<CommentResponse>, BoardError> {
        let comments = CommentRepository::list_by_note(pool, note_id).await?;
        let author_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
        let authors = UserService::map_by_id(pool, &author_ids).await?;

        Ok(comments
            .iter()
            .map(|c| c.to_response(authors.get(&c.user_id).map(User::to_response)))
            .collect())
    }

    pub async fn add_comment(
        pool: &PgPool,
        firestore: Option<&FirestoreClient>,
        cache: &NotesCache,
        req: &CreateCommentRequest,
    ) -> Result<CommentResponse, BoardError> {
        req.validate()
            .map_err(|e| BoardError::ValidationError(e.to_string()))?;

        let mut note = NoteRepository::get_by_id(pool, req.note_id).await?;
        let author = UserService::given_or_first(pool, req.user_id).await?;

        let comment = CommentRepository::create(pool, note.id, author.id, &req.content, None).await?;
        note.comments_count = NoteRepository::increment_comments_count(pool, note.id).await?;
        cache.clear().await;

        NotificationService::notify(pool, NotificationKind::Comment, note.user_id, &author, Some(note.id)).await;
        SyncService::sync_comment(firestore, &comment, &note, &author).await;

        log::info!("User {} commented on note {}", author.id, note.id);
        Ok(comment.to_response(Some(author.to_response())))
    }
}
