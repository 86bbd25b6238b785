//! `/users` resource backed by a read-only in-memory store.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::core::context::AppContext;
use crate::web::error::ApiError;
use crate::web::response::ServiceResponse;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fixed set of users, built at startup
#[derive(Debug, Clone, Default)]
pub struct UserRepository {
    users: Vec<User>,
}

impl UserRepository {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Two sample users
    pub fn seeded() -> Self {
        let now = Utc::now();
        let later = now + Duration::days(5);
        Self::new(vec![
            User {
                id: 1,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                age: 42,
                created_at: now,
                updated_at: later,
            },
            User {
                id: 2,
                name: "Robert".to_string(),
                email: "robert@example.com".to_string(),
                age: 21,
                created_at: now,
                updated_at: later,
            },
        ])
    }

    pub fn find_all(&self) -> &[User] {
        &self.users
    }

    pub fn find_by_id(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "User",
    responses(
        (status = 200, description = "Users found", body = [User]),
        (status = 404, description = "No Users found")
    )
)]
pub async fn list_users(State(ctx): State<Arc<AppContext>>) -> Result<ServiceResponse<Vec<User>>, ApiError> {
    let users = ctx.users.find_all();
    if users.is_empty() {
        return Err(ApiError::NotFound("No Users found".to_string()));
    }
    Ok(ServiceResponse::success("Users found", Some(users.to_vec())))
}

/// Fetch one user by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "User",
    params(("id" = i64, Path, description = "Positive numeric user id")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<ServiceResponse<User>, ApiError> {
    let id = parse_user_id(&id)?;
    let user = ctx
        .users
        .find_by_id(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ServiceResponse::success("User found", Some(user)))
}

fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("ID must be a numeric value".to_string()))?;
    if id <= 0 {
        return Err(ApiError::Validation("ID must be a positive number".to_string()));
    }
    Ok(id)
}
