/// Domain models
///
/// # Models
///
/// - `user`: User accounts, creation input and the public [`user::UserView`]
/// - `task`: To-do items, creation/partial-update inputs and [`task::TaskView`]
///
/// Each model carries its own PostgreSQL queries. They take a
/// `&mut PgConnection` so callers decide the transaction boundary; see
/// [`crate::db::postgres::PgStore`].

pub mod task;
pub mod user;
