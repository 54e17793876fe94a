// src/services/seeder.rs
// DOCUMENTATION: Startup data checks

use crate::db::UserRepository;
use crate::errors::BoardError;
use crate::models::{
    avatar_url, NewUser, DEFAULT_AVATAR_STYLE, DEMO_USER_EMAIL, DEMO_USER_NAME, DEMO_USER_UID,
};
use sqlx::PgPool;

/// Ensure at least the demo account exists and every user has a name
pub async fn seed(pool: &PgPool) -> Result<(), BoardError> {
    log::info!("Checking user data...");

    if UserRepository::count(pool).await? == 0 {
        log::info!("No users found, creating demo user");
        UserRepository::create(
            pool,
            &NewUser {
                name: Some(DEMO_USER_NAME.to_string()),
                email: DEMO_USER_EMAIL.to_string(),
                firebase_uid: Some(DEMO_USER_UID.to_string()),
                profile_pic_url: Some(avatar_url(DEMO_USER_NAME, DEFAULT_AVATAR_STYLE)),
                ..Default::default()
            },
        )
        .await?;
        return Ok(());
    }

    for user in UserRepository::list_nameless(pool).await? {
        log::info!("Fixing user with empty name: {}", user.email);
        let pic = match user.profile_pic_url {
            Some(_) => None,
            None => Some(avatar_url(DEMO_USER_NAME, DEFAULT_AVATAR_STYLE)),
        };
        UserRepository::update_profile(pool, user.id, DEMO_USER_NAME, pic.as_deref()).await?;
    }

    log::info!("User data check complete");
    Ok(())
}
