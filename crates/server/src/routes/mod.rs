pub mod auth;
pub mod comments;
pub mod likes;
pub mod my;
pub mod posts;
pub mod schedules;
