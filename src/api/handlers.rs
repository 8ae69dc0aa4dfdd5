use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{Post, User};
use crate::services::{
    category_affinity, collaborative, text_similarity, CategoryAffinity, Collaborative,
    RecommendContext, Recommender, ScoredPost, Snapshot,
};

use super::state::SnapshotSource;
use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            following: user.following.iter().copied().collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub target_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub author_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub categories: Vec<String>,
    pub author: AuthorSummary,
    pub like_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Builds a post summary, tolerating authors that no longer resolve
fn summarize(post: &Post, users: &HashMap<Uuid, User>) -> PostSummary {
    let name = users
        .get(&post.author_id)
        .map(|u| u.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    PostSummary {
        id: post.id,
        title: post.title.clone(),
        categories: post.categories.clone(),
        author: AuthorSummary {
            id: post.author_id,
            name,
        },
        like_count: post.like_count(),
        created_at: post.created_at,
    }
}

#[derive(Debug, Serialize)]
pub struct ScoredPostSummary {
    #[serde(flatten)]
    pub post: PostSummary,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub category: Vec<PostSummary>,
    pub collaborative: Vec<PostSummary>,
}

// Handlers

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("User name must not be empty".to_string()));
    }

    let user = User::new(name.to_string());
    let response = UserResponse::from(&user);

    let mut inner = state.inner.write().await;
    inner.users.insert(user.id, user);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all users
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserResponse>> {
    let inner = state.inner.read().await;
    let users: Vec<UserResponse> = inner.users.values().map(UserResponse::from).collect();
    Json(users)
}

/// Toggle following of another user
pub async fn toggle_follow(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<FollowRequest>,
) -> AppResult<Json<FollowResponse>> {
    if user_id == request.target_id {
        return Err(AppError::InvalidInput("Users cannot follow themselves".to_string()));
    }

    let mut inner = state.inner.write().await;
    if !inner.users.contains_key(&request.target_id) {
        return Err(AppError::NotFound(format!("Unknown user: {}", request.target_id)));
    }
    let user = inner
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown user: {user_id}")))?;

    let following = user.toggle_follow(request.target_id);
    Ok(Json(FollowResponse { following }))
}

/// Delete a user, cascading their posts, likes, and follow edges
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut inner = state.inner.write().await;
    if inner.users.remove(&user_id).is_none() {
        return Err(AppError::NotFound(format!("Unknown user: {user_id}")));
    }

    inner.likes.remove_user(user_id);

    let authored: Vec<Uuid> = inner
        .posts
        .values()
        .filter(|post| post.author_id == user_id)
        .map(|post| post.id)
        .collect();
    for post_id in authored {
        inner.posts.remove(&post_id);
        inner.likes.remove_post(post_id);
    }

    for post in inner.posts.values_mut() {
        post.liked_by.remove(&user_id);
    }
    for user in inner.users.values_mut() {
        user.following.remove(&user_id);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Create a new post
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostSummary>)> {
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Post title must not be empty".to_string()));
    }

    let mut inner = state.inner.write().await;
    if !inner.users.contains_key(&request.author_id) {
        return Err(AppError::NotFound(format!("Unknown user: {}", request.author_id)));
    }

    let post = Post::new(request.title, request.body, request.categories, request.author_id);
    let response = summarize(&post, &inner.users);
    inner.posts.insert(post.id, post);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all posts
pub async fn list_posts(State(state): State<AppState>) -> Json<Vec<PostSummary>> {
    let inner = state.inner.read().await;
    let posts: Vec<PostSummary> = inner
        .posts
        .values()
        .map(|post| summarize(post, &inner.users))
        .collect();
    Json(posts)
}

/// Delete a post, cascading removal from the like-graph
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut inner = state.inner.write().await;
    if inner.posts.remove(&post_id).is_none() {
        return Err(AppError::NotFound(format!("Unknown post: {post_id}")));
    }
    inner.likes.remove_post(post_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle a like edge between a user and a post
///
/// The like-graph and the post's `liked_by` mirror update under the same
/// write lock, so the toggle is atomic from the caller's perspective.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(request): Json<LikeRequest>,
) -> AppResult<Json<LikeResponse>> {
    let mut inner = state.inner.write().await;
    if !inner.users.contains_key(&request.user_id) {
        return Err(AppError::NotFound(format!("Unknown user: {}", request.user_id)));
    }
    if !inner.posts.contains_key(&post_id) {
        return Err(AppError::NotFound(format!("Unknown post: {post_id}")));
    }

    let liked = inner.likes.toggle(request.user_id, post_id);
    let post = inner
        .posts
        .get_mut(&post_id)
        .ok_or_else(|| AppError::Internal("Post vanished during like toggle".to_string()))?;
    if liked {
        post.liked_by.insert(request.user_id);
    } else {
        post.liked_by.remove(&request.user_id);
    }

    Ok(Json(LikeResponse {
        liked,
        like_count: post.like_count(),
    }))
}

/// Rank posts by lexical similarity to a free-text query
pub async fn search_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<ScoredPostSummary>>> {
    let snapshot = state.snapshot().await;
    let ranked = text_similarity::score_by_text(&params.q, &snapshot)?;

    tracing::info!(
        request_id = %request_id,
        results = ranked.len(),
        "Text similarity ranking computed"
    );

    let ranked = match params.limit {
        Some(limit) => ranked.into_iter().take(limit).collect(),
        None => ranked,
    };
    scored_summaries(&state, &snapshot, ranked).await.map(Json)
}

/// Rank posts related to an existing post
pub async fn related_posts(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<Vec<ScoredPostSummary>>> {
    let snapshot = state.snapshot().await;
    let ranked = text_similarity::related_posts(post_id, &snapshot)?;
    scored_summaries(&state, &snapshot, ranked).await.map(Json)
}

/// Recommend unseen posts from the user's preferred categories
pub async fn category_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<PostSummary>>> {
    let snapshot = state.snapshot().await;
    let ranked = category_affinity::recommend_by_category(user_id, &snapshot)?;

    let limit = params.limit.unwrap_or(state.config.default_limit);
    let ranked: Vec<Uuid> = ranked.into_iter().take(limit).collect();
    summaries(&state, &snapshot, &ranked).await.map(Json)
}

/// Recommend posts liked by users with overlapping like histories
pub async fn collaborative_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<ScoredPostSummary>>> {
    let snapshot = state.snapshot().await;
    let ranked = collaborative::recommend_collaborative(user_id, &snapshot)?;

    let limit = params.limit.unwrap_or(state.config.default_limit);
    let ranked: Vec<ScoredPost> = ranked.into_iter().take(limit).collect();
    scored_summaries(&state, &snapshot, ranked).await.map(Json)
}

/// Compose the user-centric strategies side by side for the home feed
pub async fn home_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<HomeResponse>> {
    let snapshot = state.snapshot().await;
    let ctx = RecommendContext::for_user(user_id);
    let limit = state.config.default_limit;

    let category = ranked_section(&CategoryAffinity, &snapshot, &ctx, limit, &request_id)?;
    let collaborative = ranked_section(&Collaborative, &snapshot, &ctx, limit, &request_id)?;

    Ok(Json(HomeResponse {
        category: summaries(&state, &snapshot, &category).await?,
        collaborative: summaries(&state, &snapshot, &collaborative).await?,
    }))
}

/// Runs one strategy through the common interface and caps the ranking
fn ranked_section(
    strategy: &dyn Recommender,
    snapshot: &Snapshot,
    ctx: &RecommendContext,
    limit: usize,
    request_id: &RequestId,
) -> AppResult<Vec<Uuid>> {
    let ranked = strategy.recommend(snapshot, ctx)?;

    tracing::info!(
        request_id = %request_id,
        strategy = strategy.name(),
        results = ranked.len(),
        "Strategy ranking computed"
    );

    Ok(ranked.into_iter().take(limit).collect())
}

async fn summaries(
    state: &AppState,
    snapshot: &Snapshot,
    ranked: &[Uuid],
) -> AppResult<Vec<PostSummary>> {
    let inner = state.inner.read().await;
    Ok(ranked
        .iter()
        .filter_map(|id| snapshot.post(*id))
        .map(|post| summarize(post, &inner.users))
        .collect())
}

async fn scored_summaries(
    state: &AppState,
    snapshot: &Snapshot,
    ranked: Vec<ScoredPost>,
) -> AppResult<Vec<ScoredPostSummary>> {
    let inner = state.inner.read().await;
    Ok(ranked
        .into_iter()
        .filter_map(|scored| {
            snapshot.post(scored.post_id).map(|post| ScoredPostSummary {
                post: summarize(post, &inner.users),
                score: scored.score,
            })
        })
        .collect())
}
