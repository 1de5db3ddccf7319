use tracing::{info, warn};

use super::{
    dto::UserCreate,
    model::{NewUser, User, UserUpdate},
    repo::DuplicateEmail,
};
use crate::{
    auth::{
        handlers::MIN_PASSWORD_LEN,
        services::{is_valid_email, normalize_email},
    },
    error::AppError,
    state::AppState,
};

fn check_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::BadRequest("Password too short".into()));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        warn!("invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    Ok(())
}

/// The store's unique-email check is the one that wins a race with another writer.
fn conflict_if_duplicate(e: anyhow::Error, detail: &str) -> AppError {
    if e.is::<DuplicateEmail>() {
        warn!("email already registered");
        AppError::Conflict(detail.into())
    } else {
        AppError::Internal(e)
    }
}

pub async fn create_user(state: &AppState, input: UserCreate) -> Result<User, AppError> {
    let email = normalize_email(&input.email);
    check_email(&email)?;
    check_password(&input.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hashed_password = state.passwords.hash(&input.password)?;
    let user = state
        .users
        .insert(NewUser {
            email,
            full_name: input.full_name,
            hashed_password,
            is_active: input.is_active,
            is_superuser: input.is_superuser,
        })
        .await
        .map_err(|e| conflict_if_duplicate(e, "Email already registered"))?;
    info!(user_id = %user.id, "user created");
    Ok(user)
}

/// Applies a partial update; a supplied password is re-hashed before merging.
pub async fn update_user(state: &AppState, user: &User, mut update: UserUpdate) -> Result<User, AppError> {
    if let Some(email) = update.email.as_deref() {
        let email = normalize_email(email);
        check_email(&email)?;
        if let Some(other) = state.users.find_by_email(&email).await? {
            if other.id != user.id {
                return Err(AppError::Conflict("User with this email already exists".into()));
            }
        }
        update.email = Some(email);
    }

    let hashed_password = match update.password.as_deref() {
        Some(password) => {
            check_password(password)?;
            Some(state.passwords.hash(password)?)
        }
        None => None,
    };

    let updated = state
        .users
        .update(&user.merged(&update, hashed_password))
        .await
        .map_err(|e| conflict_if_duplicate(e, "User with this email already exists"))?;
    info!(user_id = %updated.id, "user updated");
    Ok(updated)
}

/// Creates the configured first superuser when no account with that email exists.
pub async fn ensure_first_superuser(state: &AppState) -> anyhow::Result<()> {
    let Some(seed) = state.config.first_superuser.clone() else {
        return Ok(());
    };
    let email = normalize_email(&seed.email);
    if state.users.find_by_email(&email).await?.is_some() {
        return Ok(());
    }
    let input = UserCreate {
        email,
        password: seed.password,
        full_name: None,
        is_active: true,
        is_superuser: true,
    };
    create_user(state, input)
        .await
        .map_err(|e| anyhow::anyhow!("seed first superuser: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SuperuserSeed;
    use std::sync::Arc;

    fn register(email: &str, password: &str) -> UserCreate {
        UserCreate {
            email: email.into(),
            password: password.into(),
            full_name: None,
            is_active: true,
            is_superuser: false,
        }
    }

    #[tokio::test]
    async fn create_hashes_and_normalizes() {
        let state = AppState::fake();
        let user = create_user(&state, register(" New@Example.com", "Secret123")).await.unwrap();
        assert_eq!(user.email, "new@example.com");
        assert_ne!(user.hashed_password, "Secret123");
        assert!(state.passwords.verify("Secret123", &user.hashed_password));
        assert!(user.is_active);
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_bad_input() {
        let state = AppState::fake();
        create_user(&state, register("a@example.com", "Secret123")).await.unwrap();

        let dup = create_user(&state, register("A@example.com", "Secret123")).await.err();
        assert!(matches!(dup, Some(AppError::Conflict(_))));
        let short = create_user(&state, register("b@example.com", "short")).await.err();
        assert!(matches!(short, Some(AppError::BadRequest(_))));
        let bad = create_user(&state, register("not-an-email", "Secret123")).await.err();
        assert!(matches!(bad, Some(AppError::BadRequest(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_signups_for_one_email_yield_one_account() {
        let state = AppState::fake();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    create_user(&state, register("race@example.com", "Secret123")).await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("expected conflict, got {:?}", other),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(state.users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn store_level_duplicate_maps_to_conflict() {
        let state = AppState::fake();
        state.seed_user("a@example.com", "Secret123", false).await;
        let err = state
            .users
            .insert(NewUser {
                email: "a@example.com".into(),
                full_name: None,
                hashed_password: "x".into(),
                is_active: true,
                is_superuser: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            conflict_if_duplicate(err, "taken"),
            AppError::Conflict(detail) if detail == "taken"
        ));
        let other = conflict_if_duplicate(anyhow::anyhow!("db down"), "taken");
        assert!(matches!(other, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn update_rehashes_password() {
        let state = AppState::fake();
        let user = state.seed_user("a@example.com", "Secret123", false).await;
        let updated = update_user(
            &state,
            &user,
            UserUpdate {
                password: Some("Another456".into()),
                is_superuser: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(state.passwords.verify("Another456", &updated.hashed_password));
        assert!(!state.passwords.verify("Secret123", &updated.hashed_password));
        assert!(updated.is_superuser);
        assert_eq!(updated.email, user.email);
    }

    #[tokio::test]
    async fn update_refuses_taken_email() {
        let state = AppState::fake();
        state.seed_user("a@example.com", "Secret123", false).await;
        let b = state.seed_user("b@example.com", "Secret123", false).await;
        let err = update_user(
            &state,
            &b,
            UserUpdate {
                email: Some("a@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .err();
        assert!(matches!(err, Some(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn first_superuser_is_seeded_once() {
        let mut state = AppState::fake();
        let mut config = (*state.config).clone();
        config.first_superuser = Some(SuperuserSeed {
            email: "admin@example.com".into(),
            password: "ChangeMe123".into(),
        });
        state.config = Arc::new(config);

        ensure_first_superuser(&state).await.unwrap();
        ensure_first_superuser(&state).await.unwrap();

        assert_eq!(state.users.count().await.unwrap(), 1);
        let admin = state.users.find_by_email("admin@example.com").await.unwrap().unwrap();
        assert!(admin.is_superuser);
    }
}
