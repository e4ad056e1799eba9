use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_name: String,
    pub desired_job: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub content: String,
    pub user_id: i64,
    pub author_name: String,
    pub main_image_id: Option<i64>,
    pub views: i64,
    pub is_solved: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A row of the post listing, with counters folded in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub content: String,
    pub user_id: i64,
    pub author_name: String,
    pub main_image_id: Option<i64>,
    pub main_image_path: Option<String>,
    pub views: i64,
    pub is_solved: bool,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub owner_type: String,
    pub owner_id: i64,
    pub path: String,
    pub original_name: String,
    pub seq: i64,
    pub user_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub content: String,
    pub seq: i64,
    pub is_selected: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScrappedPost {
    pub scrap_id: i64,
    pub post_id: i64,
    pub scrapped_at: String,
    pub title: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub main_image_id: Option<i64>,
    pub views: i64,
    pub is_solved: bool,
    pub like_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub related_value: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub schedule_date: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Grass {
    pub id: i64,
    pub user_id: i64,
    pub grass_date: String,
    pub is_login: bool,
    pub is_code: bool,
    pub is_post: bool,
    pub is_comment: bool,
}
