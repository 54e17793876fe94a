// src/services/sync_service.rs
// DOCUMENTATION: Firestore synchronization service
// PURPOSE: Mirror local writes to Firestore and rebuild the local store from it

use crate::db::{
    CommentRepository, DeletedNoteRepository, FollowRepository, LikeRepository,
    MessageRepository, NoteRepository, NotificationRepository, UserRepository,
};
use crate::errors::BoardError;
use crate::models::geo::point_from_lat_lng;
use crate::models::{Comment, NewNote, NewUser, Note, User};
use crate::services::firestore_client::{
    Document, FieldTransform, Fields, FirestoreClient, Value, Write,
};
use chrono::{DateTime, TimeZone, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use uuid::Uuid;

/// Prefixes of bare base64 JPEG, PNG and GIF payloads
const BASE64_IMAGE_SIGNATURES: [&str; 3] = ["/9j/", "iVBOR", "R0lGOD"];

/// Synchronization statistics
/// DOCUMENTATION: Tracks results of a full Firestore import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    /// Firestore project that was imported
    pub project_id: String,
    /// Users created from the users collection
    pub users_imported: u32,
    /// Users created on the fly for unknown uids
    pub placeholder_users: u32,
    pub notes_imported: u32,
    /// Notes skipped (tombstoned or ownerless)
    pub notes_skipped: u32,
    pub comments_imported: u32,
    /// Comments skipped (empty, duplicate or unmatched)
    pub comments_skipped: u32,
    /// Follow edges restored from users/{uid}/following
    pub follows_imported: u32,
    pub messages_imported: u32,
    /// Error messages encountered
    pub errors: Vec<String>,
    /// Total sync duration in seconds
    pub duration_seconds: u64,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl SyncStats {
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            users_imported: 0,
            placeholder_users: 0,
            notes_imported: 0,
            notes_skipped: 0,
            comments_imported: 0,
            comments_skipped: 0,
            follows_imported: 0,
            messages_imported: 0,
            errors: Vec::new(),
            duration_seconds: 0,
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    /// Mark sync as completed
    pub fn complete(&mut self, duration: u64) {
        self.duration_seconds = duration;
        self.completed_at = Some(Utc::now().to_rfc3339());
    }
}

/// Add the data-URI prefix to bare base64 images; other values pass through
pub fn normalize_profile_pic(pic: Option<&str>) -> Option<String> {
    let pic = pic?;
    if pic.starts_with("http") || pic.starts_with("data:image/") {
        return Some(pic.to_string());
    }
    if BASE64_IMAGE_SIGNATURES.iter().any(|sig| pic.starts_with(sig)) {
        return Some(format!("data:image/jpeg;base64,{}", pic));
    }
    Some(pic.to_string())
}

/// Email given to users created for an unknown uid
pub fn placeholder_email(uid: &str) -> String {
    format!("temp_{}@user.com", uid)
}

/// First string present among `keys`
fn first_str<'a>(doc: &'a Document, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| doc.get_str(k))
}

/// Firestore timestamp or epoch millis
pub fn document_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::TimestampValue(t) => Some(*t),
        Value::IntegerValue(ms) => Utc.timestamp_millis_opt(*ms).single(),
        _ => None,
    }
}

/// Non-negative counter field, saturating at i32::MAX
fn counter(doc: &Document, field: &str) -> i32 {
    let v = doc.get_i64(field).unwrap_or(0).max(0);
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Map a users/{uid} document to an insert payload
pub fn user_from_document(doc: &Document) -> NewUser {
    let uid = doc.id().to_string();
    let email = doc
        .get_str("email")
        .filter(|e| !e.is_empty())
        .map(String::from)
        .unwrap_or_else(|| placeholder_email(&uid));

    NewUser {
        name: first_str(doc, &["name", "displayName", "username"]).map(String::from),
        email,
        password_hash: None,
        firebase_uid: Some(uid),
        profile_pic_url: normalize_profile_pic(first_str(doc, &["profilePic", "profilePicUrl"])),
        current_tier: doc.get_str("currentTier").map(String::from),
        last_location: None,
        followers_count: counter(doc, "followersCount"),
        following_count: counter(doc, "followingCount"),
    }
}

/// Uid a users/{uid}/following/{id} edge points at
pub fn followed_uid(edge: &Document) -> &str {
    edge.get_str("followingId")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| edge.id())
}

/// A messages/{id} document decoded into local terms
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMessage {
    pub from_uid: String,
    pub to_uid: String,
    pub text: String,
    pub anonymous: bool,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl ImportedMessage {
    /// None when either party or the text is missing
    pub fn from_document(doc: &Document) -> Option<Self> {
        let from_uid = doc.get_str("fromUserId").filter(|s| !s.is_empty())?;
        let to_uid = doc.get_str("toUserId").filter(|s| !s.is_empty())?;
        let text = first_str(doc, &["messageText", "text"])?;
        Some(Self {
            from_uid: from_uid.to_string(),
            to_uid: to_uid.to_string(),
            text: text.to_string(),
            anonymous: doc.get_bool("anonymous").unwrap_or(false),
            read: doc.get_bool("read").unwrap_or(false),
            created_at: document_timestamp(doc.get("timestamp")),
        })
    }
}

/// A notes/{id} document decoded into local terms
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedNote {
    pub doc_id: String,
    pub content: String,
    pub location: Option<Point<f64>>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub owner_uid: Option<String>,
    pub owner_name: Option<String>,
    pub owner_pic: Option<String>,
    pub image_base64: Option<String>,
}

impl ImportedNote {
    pub fn from_document(doc: &Document) -> Self {
        let content = first_str(doc, &["note", "content", "text"])
            .unwrap_or("No Content")
            .to_string();

        let lat = doc.get_f64("lat").or_else(|| doc.get_f64("latitude"));
        let lng = doc.get_f64("lon").or_else(|| doc.get_f64("longitude"));
        let location = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(point_from_lat_lng(lat, lng)),
            _ => doc
                .get_geo_point("location")
                .map(|p| point_from_lat_lng(p.latitude, p.longitude)),
        };

        Self {
            doc_id: doc.id().to_string(),
            content,
            location,
            created_at: document_timestamp(doc.get("timestamp")).unwrap_or_else(Utc::now),
            likes_count: counter(doc, "likeCount"),
            comments_count: counter(doc, "commentsCount"),
            owner_uid: doc.get_str("userId").map(String::from),
            owner_name: doc.get_str("userName").map(String::from),
            owner_pic: normalize_profile_pic(doc.get_str("userProfilePic")),
            image_base64: doc.get_str("imageBase64").map(String::from),
        }
    }

    fn to_new_note(&self, user_id: Uuid) -> NewNote {
        NewNote {
            user_id,
            firebase_id: Some(self.doc_id.clone()),
            content: Some(self.content.clone()),
            summary: None,
            location: self.location,
            created_at: Some(self.created_at),
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            image_base64: self.image_base64.clone(),
            image_width: None,
            image_height: None,
        }
    }
}

/// Fields written to notes/{id}; the set the mobile client reads
pub fn note_fields(note: &Note, owner: &User, liked_by: &[String], now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("note".into(), note.content.clone().into());
    fields.insert("lat".into(), note.lat.into());
    fields.insert("lon".into(), note.lng.into());
    fields.insert(
        "location".into(),
        match (note.lat, note.lng) {
            (Some(lat), Some(lng)) => Value::geo_point(lat, lng),
            _ => Value::null(),
        },
    );
    fields.insert("userId".into(), owner.external_id().into());
    fields.insert("userName".into(), owner.display_name().into());
    fields.insert("likeCount".into(), note.likes_count.into());
    fields.insert(
        "likedBy".into(),
        Value::array(liked_by.iter().map(|id| Value::from(id.as_str()))),
    );
    fields.insert("commentsCount".into(), note.comments_count.into());
    fields.insert("timestamp".into(), now.into());
    fields
}

pub fn comment_fields(comment: &Comment, author: &User, now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".into(), comment.id.to_string().into());
    fields.insert("text".into(), comment.content.clone().into());
    fields.insert("userId".into(), author.external_id().into());
    fields.insert("userName".into(), author.display_name().into());
    fields.insert("timestamp".into(), now.into());
    fields
}

pub fn user_fields(user: &User) -> Fields {
    let mut fields = Fields::new();
    fields.insert("username".into(), user.email.clone().into());
    fields.insert("email".into(), user.email.clone().into());
    fields.insert("displayName".into(), user.name.clone().into());
    fields
}

/// Atomic like/unlike: array union or removal plus a counter step
pub fn like_writes(note_doc_id: &str, liker_id: &str, liked: bool) -> Vec<Write> {
    let liker = vec![Value::from(liker_id)];
    let array_op = if liked {
        FieldTransform::AppendMissingElements {
            field: "likedBy".into(),
            values: liker,
        }
    } else {
        FieldTransform::RemoveAllFromArray {
            field: "likedBy".into(),
            values: liker,
        }
    };
    vec![Write::Transform {
        path: format!("notes/{}", note_doc_id),
        transforms: vec![
            array_op,
            FieldTransform::Increment {
                field: "likeCount".into(),
                by: if liked { 1 } else { -1 },
            },
        ],
    }]
}

/// Edge documents on both sides plus counter steps
pub fn follow_writes(follower: &User, target: &User, follow: bool) -> Vec<Write> {
    let follower_uid = follower.external_id();
    let target_uid = target.external_id();
    let following_path = format!("users/{}/following/{}", follower_uid, target_uid);
    let followers_path = format!("users/{}/followers/{}", target_uid, follower_uid);
    let step = if follow { 1 } else { -1 };

    let mut writes = if follow {
        let mut following = Fields::new();
        following.insert("followingId".into(), target_uid.clone().into());
        following.insert("followingName".into(), target.name.clone().into());

        let mut followers = Fields::new();
        followers.insert("followerId".into(), follower_uid.clone().into());
        followers.insert("followerName".into(), follower.name.clone().into());

        vec![
            Write::Set { path: following_path, fields: following },
            Write::Set { path: followers_path, fields: followers },
        ]
    } else {
        vec![
            Write::Delete { path: following_path },
            Write::Delete { path: followers_path },
        ]
    };

    writes.push(Write::Transform {
        path: format!("users/{}", follower_uid),
        transforms: vec![FieldTransform::Increment {
            field: "followingCount".into(),
            by: step,
        }],
    });
    writes.push(Write::Transform {
        path: format!("users/{}", target_uid),
        transforms: vec![FieldTransform::Increment {
            field: "followersCount".into(),
            by: step,
        }],
    });
    writes
}

/// messages/{auto} payload; sender masked when anonymous
pub fn message_fields(
    sender: &User,
    to_uid: &str,
    text: &str,
    anonymous: bool,
    now: DateTime<Utc>,
) -> Fields {
    let (name, pic) = crate::models::visible_sender(Some(sender), anonymous);
    let mut fields = Fields::new();
    fields.insert("fromUserId".into(), sender.external_id().into());
    fields.insert("fromUserName".into(), name.into());
    fields.insert("fromUserProfilePic".into(), pic.into());
    fields.insert("toUserId".into(), to_uid.into());
    fields.insert("messageText".into(), text.into());
    fields.insert("timestamp".into(), now.timestamp_millis().into());
    fields.insert("anonymous".into(), anonymous.into());
    fields.insert("read".into(), false.into());
    fields
}

fn message_notification_fields(message: &Fields, message_id: &str) -> Fields {
    let mut fields = Fields::new();
    for key in ["fromUserId", "fromUserName", "fromUserProfilePic", "messageText", "timestamp"] {
        if let Some(v) = message.get(key) {
            fields.insert(key.into(), v.clone());
        }
    }
    if let Some(to) = message.get("toUserId") {
        fields.insert("toUserId".into(), to.clone());
    }
    fields.insert("type".into(), "message".into());
    fields.insert("messageId".into(), message_id.into());
    fields.insert("read".into(), false.into());
    fields
}

/// Sync service for Firestore integration
/// DOCUMENTATION: Mirror helpers never fail the caller; they log and move on
pub struct SyncService;

impl SyncService {
    pub async fn sync_user(firestore: Option<&FirestoreClient>, user: &User) {
        let Some(fs) = firestore else { return };
        let path = format!("users/{}", user.external_id());
        match fs.set_document(&path, user_fields(user)).await {
            Ok(_) => log::debug!("[Firestore] Synced user {}", path),
            Err(e) => log::warn!("[Firestore] Failed to sync user {}: {}", path, e),
        }
    }

    /// Mirror a note; returns the document id on success
    pub async fn sync_note(
        firestore: Option<&FirestoreClient>,
        note: &Note,
        owner: &User,
        liked_by: &[String],
    ) -> Option<String> {
        let fs = firestore?;
        let doc_id = note.external_id();
        let path = format!("notes/{}", doc_id);
        match fs.set_document(&path, note_fields(note, owner, liked_by, Utc::now())).await {
            Ok(_) => {
                log::info!("[Firestore] Synced note {}", doc_id);
                Some(doc_id)
            }
            Err(e) => {
                log::warn!("[Firestore] Failed to sync note {}: {}", doc_id, e);
                None
            }
        }
    }

    pub async fn sync_comment(
        firestore: Option<&FirestoreClient>,
        comment: &Comment,
        note: &Note,
        author: &User,
    ) {
        let Some(fs) = firestore else { return };
        let path = format!("notes/{}/comments/{}", note.external_id(), comment.id);
        match fs.set_document(&path, comment_fields(comment, author, Utc::now())).await {
            Ok(_) => log::debug!("[Firestore] Synced comment {}", path),
            Err(e) => log::warn!("[Firestore] Failed to sync comment {}: {}", path, e),
        }
    }

    pub async fn delete_note(firestore: Option<&FirestoreClient>, doc_id: &str) {
        let Some(fs) = firestore else { return };
        let path = format!("notes/{}", doc_id);
        match fs.delete_document(&path).await {
            Ok(()) => log::info!("[Firestore] Deleted note {}", doc_id),
            Err(e) => log::warn!("[Firestore] Failed to delete note {}: {}", doc_id, e),
        }
    }

    pub async fn update_note_like(
        firestore: Option<&FirestoreClient>,
        note_doc_id: &str,
        liker_id: &str,
        liked: bool,
    ) {
        let Some(fs) = firestore else { return };
        // transforms on a missing document would create a stub
        match fs.get_document(&format!("notes/{}", note_doc_id)).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::debug!("[Firestore] Note {} not mirrored, skipping like update", note_doc_id);
                return;
            }
            Err(e) => {
                log::warn!("[Firestore] Failed to read note {}: {}", note_doc_id, e);
                return;
            }
        }
        match fs.commit(&like_writes(note_doc_id, liker_id, liked)).await {
            Ok(()) => log::debug!("[Firestore] Like on {} by {} -> {}", note_doc_id, liker_id, liked),
            Err(e) => log::warn!("[Firestore] Failed to update like on {}: {}", note_doc_id, e),
        }
    }

    pub async fn write_follow(
        firestore: Option<&FirestoreClient>,
        follower: &User,
        target: &User,
        follow: bool,
    ) {
        let Some(fs) = firestore else { return };
        match fs.commit(&follow_writes(follower, target, follow)).await {
            Ok(()) => log::debug!(
                "[Firestore] {} {} -> {}",
                if follow { "Follow" } else { "Unfollow" },
                follower.external_id(),
                target.external_id()
            ),
            Err(e) => log::warn!("[Firestore] Failed to write follow edge: {}", e),
        }
    }

    /// Mirror a message and its notification; returns the message doc id
    pub async fn send_message(
        firestore: Option<&FirestoreClient>,
        sender: &User,
        to_uid: &str,
        text: &str,
        anonymous: bool,
    ) -> Option<String> {
        let fs = firestore?;
        let fields = message_fields(sender, to_uid, text, anonymous, Utc::now());
        let doc = match fs.add_document("messages", fields.clone()).await {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("[Firestore] Failed to send message to {}: {}", to_uid, e);
                return None;
            }
        };
        let message_id = doc.id().to_string();

        if let Err(e) = fs
            .add_document("notifications", message_notification_fields(&fields, &message_id))
            .await
        {
            log::warn!("[Firestore] Failed to create message notification: {}", e);
        }
        Some(message_id)
    }

    /// Rebuild the local store from Firestore
    /// DOCUMENTATION: Firestore is the source of truth; tombstones survive
    ///
    /// Process:
    /// 1. Read users, their following edges, notes and messages
    /// 2. Clear local tables (deleted_notes kept) once every read succeeded
    /// 3. Import users, then follow edges
    /// 4. Import notes, skipping tombstoned ones, creating placeholder owners
    /// 5. Import each note's comments subcollection, then messages
    pub async fn sync_from_firestore(
        pool: &PgPool,
        firestore: &FirestoreClient,
    ) -> Result<SyncStats, BoardError> {
        let start_time = Instant::now();
        let mut stats = SyncStats::new(firestore.project_id().to_string());

        log::info!("Starting Firestore sync (tombstones preserved)");

        let user_docs = firestore.list_documents("users").await?;
        let mut edge_docs = Vec::with_capacity(user_docs.len());
        for doc in &user_docs {
            let path = format!("users/{}/following", doc.id());
            edge_docs.push((doc.id().to_string(), firestore.list_documents(&path).await?));
        }
        let note_docs = firestore.list_documents("notes").await?;
        let message_docs = firestore.list_documents("messages").await?;
        log::info!(
            "Fetched {} users, {} notes, {} messages",
            user_docs.len(),
            note_docs.len(),
            message_docs.len()
        );

        Self::clear_local(pool).await?;
        log::info!("Local database cleared");

        let mut uid_cache: HashMap<String, Uuid> = HashMap::new();

        // Users
        for doc in &user_docs {
            let new_user = user_from_document(doc);
            match UserRepository::create(pool, &new_user).await {
                Ok(user) => {
                    stats.users_imported += 1;
                    uid_cache.insert(doc.id().to_string(), user.id);
                }
                Err(e) => stats.errors.push(format!("user {}: {}", doc.id(), e)),
            }
        }
        log::info!("Imported {} users", stats.users_imported);

        // Follows
        for (follower_uid, edges) in &edge_docs {
            let Some(follower_id) = uid_cache.get(follower_uid).copied() else {
                continue;
            };
            for edge in edges {
                let target_uid = followed_uid(edge).to_string();
                let followed_id = match Self::resolve_user(
                    pool,
                    &mut uid_cache,
                    &target_uid,
                    edge.get_str("followingName"),
                    None,
                    &mut stats,
                )
                .await
                {
                    Ok(id) => id,
                    Err(e) => {
                        stats.errors.push(format!("follow {} -> {}: {}", follower_uid, target_uid, e));
                        continue;
                    }
                };
                match FollowRepository::insert_edge(pool, follower_id, followed_id).await {
                    Ok(true) => stats.follows_imported += 1,
                    Ok(false) => {}
                    Err(e) => stats.errors.push(format!("follow {} -> {}: {}", follower_uid, target_uid, e)),
                }
            }
        }
        log::info!("Imported {} follow edges", stats.follows_imported);

        // Notes
        let mut by_doc_id: HashMap<String, Uuid> = HashMap::new();
        let mut by_content: HashMap<String, Uuid> = HashMap::new();

        for doc in &note_docs {
            let imported = ImportedNote::from_document(doc);

            match DeletedNoteRepository::is_tombstoned(pool, &imported.doc_id, &imported.content).await {
                Ok(true) => {
                    log::debug!("Skipping deleted note {}", imported.doc_id);
                    stats.notes_skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    stats.errors.push(format!("note {}: {}", imported.doc_id, e));
                    continue;
                }
            }

            let Some(uid) = imported.owner_uid.as_deref() else {
                stats.notes_skipped += 1;
                continue;
            };

            let owner_id = match Self::resolve_user(
                pool,
                &mut uid_cache,
                uid,
                imported.owner_name.as_deref().or(Some("Unknown User")),
                imported.owner_pic.clone(),
                &mut stats,
            )
            .await
            {
                Ok(id) => id,
                Err(e) => {
                    stats.errors.push(format!("note {} owner {}: {}", imported.doc_id, uid, e));
                    continue;
                }
            };

            match NoteRepository::create(pool, &imported.to_new_note(owner_id)).await {
                Ok(note) => {
                    stats.notes_imported += 1;
                    by_doc_id.insert(imported.doc_id.clone(), note.id);
                    by_content.entry(imported.content.clone()).or_insert(note.id);
                }
                Err(e) => stats.errors.push(format!("note {}: {}", imported.doc_id, e)),
            }
        }
        log::info!(
            "Imported {} notes ({} skipped)",
            stats.notes_imported,
            stats.notes_skipped
        );

        // Comments
        let mut seen: HashSet<String> = HashSet::new();
        for doc in &note_docs {
            let note_id = match by_doc_id.get(doc.id()) {
                Some(id) => *id,
                None => match first_str(doc, &["note", "content"]).and_then(|c| by_content.get(c)) {
                    Some(id) => *id,
                    None => continue,
                },
            };

            let path = format!("notes/{}/comments", doc.id());
            let comment_docs = match firestore.list_documents(&path).await {
                Ok(docs) => docs,
                Err(e) => {
                    stats.errors.push(format!("comments of {}: {}", doc.id(), e));
                    continue;
                }
            };

            for comment_doc in comment_docs {
                let text = match first_str(&comment_doc, &["text", "content"]) {
                    Some(t) if !t.is_empty() => t.to_string(),
                    _ => {
                        stats.comments_skipped += 1;
                        continue;
                    }
                };

                let key = format!("{}|{}", note_id, text);
                if seen.contains(&key) {
                    stats.comments_skipped += 1;
                    continue;
                }

                let Some(uid) = comment_doc.get_str("userId") else {
                    stats.comments_skipped += 1;
                    continue;
                };

                let author_id = match Self::resolve_user(
                    pool,
                    &mut uid_cache,
                    uid,
                    comment_doc.get_str("userName").or(Some("Unknown")),
                    None,
                    &mut stats,
                )
                .await
                {
                    Ok(id) => id,
                    Err(e) => {
                        stats.errors.push(format!("comment author {}: {}", uid, e));
                        continue;
                    }
                };

                let created_at = document_timestamp(comment_doc.get("timestamp"));
                match CommentRepository::create(pool, note_id, author_id, &text, created_at).await {
                    Ok(_) => {
                        seen.insert(key);
                        stats.comments_imported += 1;
                    }
                    Err(e) => stats.errors.push(format!("comment {}: {}", comment_doc.id(), e)),
                }
            }
        }

        // Messages
        for doc in &message_docs {
            let Some(message) = ImportedMessage::from_document(doc) else {
                continue;
            };
            let from_id =
                match Self::resolve_user(pool, &mut uid_cache, &message.from_uid, None, None, &mut stats).await {
                    Ok(id) => id,
                    Err(e) => {
                        stats.errors.push(format!("message {} sender: {}", doc.id(), e));
                        continue;
                    }
                };
            let to_id =
                match Self::resolve_user(pool, &mut uid_cache, &message.to_uid, None, None, &mut stats).await {
                    Ok(id) => id,
                    Err(e) => {
                        stats.errors.push(format!("message {} recipient: {}", doc.id(), e));
                        continue;
                    }
                };
            match MessageRepository::import(
                pool,
                from_id,
                to_id,
                &message.text,
                message.anonymous,
                message.read,
                message.created_at,
            )
            .await
            {
                Ok(_) => stats.messages_imported += 1,
                Err(e) => stats.errors.push(format!("message {}: {}", doc.id(), e)),
            }
        }
        log::info!("Imported {} messages", stats.messages_imported);

        stats.complete(start_time.elapsed().as_secs());

        log::info!(
            "Firestore sync completed: {} users, {} follows, {} notes, {} comments, {} messages, {} errors in {}s",
            stats.users_imported,
            stats.follows_imported,
            stats.notes_imported,
            stats.comments_imported,
            stats.messages_imported,
            stats.errors.len(),
            stats.duration_seconds
        );

        Ok(stats)
    }

    async fn clear_local(pool: &PgPool) -> Result<(), BoardError> {
        CommentRepository::delete_all(pool).await?;
        LikeRepository::delete_all(pool).await?;
        MessageRepository::delete_all(pool).await?;
        FollowRepository::delete_all(pool).await?;
        NotificationRepository::delete_all(pool).await?;
        NoteRepository::delete_all(pool).await?;
        UserRepository::delete_all(pool).await?;
        Ok(())
    }

    /// Local id for a Firestore uid, creating a placeholder user when unknown
    async fn resolve_user(
        pool: &PgPool,
        cache: &mut HashMap<String, Uuid>,
        uid: &str,
        name: Option<&str>,
        profile_pic_url: Option<String>,
        stats: &mut SyncStats,
    ) -> Result<Uuid, BoardError> {
        if let Some(id) = cache.get(uid) {
            return Ok(*id);
        }

        let id = match UserRepository::find_by_firebase_uid(pool, uid).await? {
            Some(user) => user.id,
            None => {
                let placeholder = NewUser {
                    name: name.map(String::from),
                    email: placeholder_email(uid),
                    firebase_uid: Some(uid.to_string()),
                    profile_pic_url,
                    ..Default::default()
                };
                let user = UserRepository::create(pool, &placeholder).await?;
                stats.placeholder_users += 1;
                log::debug!("Created placeholder user for uid {}", uid);
                user.id
            }
        };

        cache.insert(uid.to_string(), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ANONYMOUS_SENDER;
    use serde_json::json;

    fn doc(id: &str, fields: serde_json::Value) -> Document {
        serde_json::from_value(json!({
            "name": format!("projects/p/databases/(default)/documents/c/{}", id),
            "fields": fields,
        }))
        .unwrap()
    }

    fn user(uid: Option<&str>, name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.map(String::from),
            email: "ana@x.io".into(),
            password_hash: None,
            firebase_uid: uid.map(String::from),
            profile_pic_url: Some("https://pics/a.png".into()),
            current_tier: None,
            lat: None,
            lng: None,
            followers_count: 0,
            following_count: 0,
            total_likes_received: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_profile_pic() {
        assert_eq!(
            normalize_profile_pic(Some("/9j/4AAQ")).as_deref(),
            Some("data:image/jpeg;base64,/9j/4AAQ")
        );
        assert_eq!(
            normalize_profile_pic(Some("iVBORw0")).as_deref(),
            Some("data:image/jpeg;base64,iVBORw0")
        );
        assert_eq!(
            normalize_profile_pic(Some("R0lGODlh")).as_deref(),
            Some("data:image/jpeg;base64,R0lGODlh")
        );
        assert_eq!(
            normalize_profile_pic(Some("https://x/y.png")).as_deref(),
            Some("https://x/y.png")
        );
        assert_eq!(
            normalize_profile_pic(Some("data:image/png;base64,AAA")).as_deref(),
            Some("data:image/png;base64,AAA")
        );
        assert_eq!(normalize_profile_pic(Some("avatar-7")).as_deref(), Some("avatar-7"));
        assert_eq!(normalize_profile_pic(None), None);
    }

    #[test]
    fn test_user_document_name_and_picture_fallbacks() {
        let d = doc("uid1", json!({
            "email": {"stringValue": "a@b.c"},
            "displayName": {"stringValue": "Display"},
            "username": {"stringValue": "user"},
            "profilePicUrl": {"stringValue": "iVBORabc"}
        }));
        let u = user_from_document(&d);
        assert_eq!(u.firebase_uid.as_deref(), Some("uid1"));
        assert_eq!(u.email, "a@b.c");
        assert_eq!(u.name.as_deref(), Some("Display"));
        assert_eq!(u.profile_pic_url.as_deref(), Some("data:image/jpeg;base64,iVBORabc"));

        let bare = user_from_document(&doc("uid2", json!({})));
        assert_eq!(bare.email, "temp_uid2@user.com");
        assert!(bare.name.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_firestore_aborts_before_clearing() {
        // nothing listens on either port; a cleared store would fail with a database error
        let pool = PgPool::connect_lazy("postgresql://127.0.0.1:9/visiboard").unwrap();
        let firestore = FirestoreClient::new("http://127.0.0.1:9/v1".into(), "board".into(), None, 10);

        let err = SyncService::sync_from_firestore(&pool, &firestore).await.unwrap_err();
        assert!(matches!(err, BoardError::ExternalApiError(_)), "got {:?}", err);
    }

    #[test]
    fn test_user_document_carries_follow_counters() {
        let d = doc("uid1", json!({
            "followersCount": {"integerValue": "12"},
            "followingCount": {"integerValue": "-1"}
        }));
        let u = user_from_document(&d);
        assert_eq!(u.followers_count, 12);
        assert_eq!(u.following_count, 0);

        let u = user_from_document(&doc("uid2", json!({})));
        assert_eq!((u.followers_count, u.following_count), (0, 0));
    }

    #[test]
    fn test_followed_uid_prefers_field_over_doc_id() {
        let edge = doc("b", json!({"followingId": {"stringValue": "b-uid"}}));
        assert_eq!(followed_uid(&edge), "b-uid");

        let edge = doc("b", json!({"followingName": {"stringValue": "Ben"}}));
        assert_eq!(followed_uid(&edge), "b");

        let edge = doc("b", json!({"followingId": {"stringValue": ""}}));
        assert_eq!(followed_uid(&edge), "b");
    }

    #[test]
    fn test_message_document_mapping() {
        let d = doc("m1", json!({
            "fromUserId": {"stringValue": "a"},
            "toUserId": {"stringValue": "b"},
            "messageText": {"stringValue": "hi"},
            "timestamp": {"integerValue": "1700000000000"},
            "anonymous": {"booleanValue": true},
            "read": {"booleanValue": true}
        }));
        let m = ImportedMessage::from_document(&d).unwrap();
        assert_eq!((m.from_uid.as_str(), m.to_uid.as_str()), ("a", "b"));
        assert_eq!(m.text, "hi");
        assert!(m.anonymous && m.read);
        assert_eq!(m.created_at.unwrap().timestamp_millis(), 1_700_000_000_000);

        let d = doc("m2", json!({
            "fromUserId": {"stringValue": "a"},
            "toUserId": {"stringValue": "b"},
            "messageText": {"stringValue": "hi"}
        }));
        let m = ImportedMessage::from_document(&d).unwrap();
        assert!(!m.anonymous && !m.read);
        assert!(m.created_at.is_none());

        let d = doc("m3", json!({
            "fromUserId": {"stringValue": "a"},
            "messageText": {"stringValue": "hi"}
        }));
        assert!(ImportedMessage::from_document(&d).is_none());
    }

    #[test]
    fn test_counters_saturate_instead_of_wrapping() {
        let d = doc("n1", json!({
            "likeCount": {"integerValue": "4294967297"},
            "commentsCount": {"integerValue": "7"}
        }));
        let n = ImportedNote::from_document(&d);
        assert_eq!(n.likes_count, i32::MAX);
        assert_eq!(n.comments_count, 7);
    }

    #[test]
    fn test_note_content_fallbacks() {
        let d = doc("n1", json!({"text": {"stringValue": "from text"}}));
        assert_eq!(ImportedNote::from_document(&d).content, "from text");

        let d = doc("n2", json!({
            "note": {"stringValue": "from note"},
            "content": {"stringValue": "from content"}
        }));
        assert_eq!(ImportedNote::from_document(&d).content, "from note");

        let d = doc("n3", json!({}));
        assert_eq!(ImportedNote::from_document(&d).content, "No Content");
    }

    #[test]
    fn test_note_location_fallbacks() {
        let d = doc("n1", json!({
            "lat": {"doubleValue": 1.0},
            "lon": {"doubleValue": 2.0},
            "location": {"geoPointValue": {"latitude": 9.0, "longitude": 9.0}}
        }));
        let p = ImportedNote::from_document(&d).location.unwrap();
        assert_eq!((p.x(), p.y()), (2.0, 1.0));

        let d = doc("n2", json!({
            "latitude": {"doubleValue": 3.0},
            "longitude": {"integerValue": "4"}
        }));
        let p = ImportedNote::from_document(&d).location.unwrap();
        assert_eq!((p.x(), p.y()), (4.0, 3.0));

        let d = doc("n3", json!({
            "location": {"geoPointValue": {"latitude": 5.0, "longitude": 6.0}}
        }));
        let p = ImportedNote::from_document(&d).location.unwrap();
        assert_eq!((p.x(), p.y()), (6.0, 5.0));

        let d = doc("n4", json!({"lat": {"doubleValue": 1.0}}));
        assert!(ImportedNote::from_document(&d).location.is_none());
    }

    #[test]
    fn test_note_timestamp_and_counts() {
        let d = doc("n1", json!({
            "timestamp": {"integerValue": "1700000000000"},
            "likeCount": {"integerValue": "3"},
            "commentsCount": {"integerValue": "-2"},
            "userId": {"stringValue": "u1"},
            "userProfilePic": {"stringValue": "/9j/xyz"}
        }));
        let n = ImportedNote::from_document(&d);
        assert_eq!(n.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(n.likes_count, 3);
        assert_eq!(n.comments_count, 0);
        assert_eq!(n.owner_uid.as_deref(), Some("u1"));
        assert_eq!(n.owner_pic.as_deref(), Some("data:image/jpeg;base64,/9j/xyz"));
        assert_eq!(n.to_new_note(Uuid::nil()).firebase_id.as_deref(), Some("n1"));

        let before = Utc::now();
        let n = ImportedNote::from_document(&doc("n2", json!({"timestamp": {"stringValue": "x"}})));
        assert!(n.created_at >= before);

        let d = doc("n3", json!({"timestamp": {"timestampValue": "2024-05-01T12:00:00Z"}}));
        assert_eq!(
            ImportedNote::from_document(&d).created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_like_writes() {
        let writes = like_writes("n1", "u1", true);
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            Write::Transform { path, transforms } => {
                assert_eq!(path, "notes/n1");
                assert!(matches!(transforms[0], FieldTransform::AppendMissingElements { .. }));
                assert_eq!(
                    transforms[1],
                    FieldTransform::Increment { field: "likeCount".into(), by: 1 }
                );
            }
            other => panic!("unexpected write {:?}", other),
        }

        match &like_writes("n1", "u1", false)[0] {
            Write::Transform { transforms, .. } => {
                assert!(matches!(transforms[0], FieldTransform::RemoveAllFromArray { .. }));
                assert_eq!(
                    transforms[1],
                    FieldTransform::Increment { field: "likeCount".into(), by: -1 }
                );
            }
            other => panic!("unexpected write {:?}", other),
        }
    }

    #[test]
    fn test_follow_writes() {
        let a = user(Some("a"), Some("Ana"));
        let b = user(Some("b"), Some("Ben"));

        let writes = follow_writes(&a, &b, true);
        assert_eq!(writes.len(), 4);
        assert!(matches!(&writes[0], Write::Set { path, .. } if path == "users/a/following/b"));
        assert!(matches!(&writes[1], Write::Set { path, .. } if path == "users/b/followers/a"));

        let writes = follow_writes(&a, &b, false);
        assert!(matches!(&writes[0], Write::Delete { path } if path == "users/a/following/b"));
        assert!(matches!(&writes[1], Write::Delete { path } if path == "users/b/followers/a"));
        match &writes[3] {
            Write::Transform { path, transforms } => {
                assert_eq!(path, "users/b");
                assert_eq!(
                    transforms[0],
                    FieldTransform::Increment { field: "followersCount".into(), by: -1 }
                );
            }
            other => panic!("unexpected write {:?}", other),
        }
    }

    #[test]
    fn test_message_fields_mask_anonymous_sender() {
        let sender = user(Some("a"), Some("Ana"));
        let fields = message_fields(&sender, "b", "hi", true, Utc::now());
        assert_eq!(fields["fromUserName"], Value::from(ANONYMOUS_SENDER));
        assert_eq!(fields["fromUserProfilePic"], Value::null());
        assert_eq!(fields["anonymous"], Value::from(true));

        let notification = message_notification_fields(&fields, "m1");
        assert_eq!(notification["type"], Value::from("message"));
        assert_eq!(notification["messageId"], Value::from("m1"));
        assert_eq!(notification["toUserId"], Value::from("b"));

        let named = message_fields(&sender, "b", "hi", false, Utc::now());
        assert_eq!(named["fromUserName"], Value::from("Ana"));
        assert_eq!(named["fromUserProfilePic"], Value::from("https://pics/a.png"));
    }

    #[test]
    fn test_note_fields_cover_mobile_schema() {
        let owner = user(Some("u1"), None);
        let note = Note {
            id: Uuid::new_v4(),
            firebase_id: None,
            user_id: owner.id,
            content: Some("hello".into()),
            summary: None,
            lat: Some(1.0),
            lng: Some(2.0),
            created_at: Utc::now(),
            likes_count: 2,
            comments_count: 1,
            image_base64: None,
            image_width: None,
            image_height: None,
        };
        let fields = note_fields(&note, &owner, &["u9".to_string()], Utc::now());
        for key in [
            "note", "lat", "lon", "location", "userId", "userName", "likeCount", "likedBy",
            "commentsCount", "timestamp",
        ] {
            assert!(fields.contains_key(key), "missing {}", key);
        }
        assert_eq!(fields["location"], Value::geo_point(1.0, 2.0));
        assert_eq!(fields["userName"], Value::from("ana"));
        assert_eq!(fields["likeCount"], Value::IntegerValue(2));
    }
}
