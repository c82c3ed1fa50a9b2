use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub author_id: Option<i64>,
}

#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}
