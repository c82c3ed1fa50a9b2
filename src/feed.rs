//! Post listings. Every feed is the same newest-first query narrowed by a
//! [`FeedFilter`], counted first so the requested page can be resolved before
//! any rows are fetched.

use crate::{
    db::Db,
    errors::ApiError,
    models::post::{PostCard, PostRow},
    pagination::{Page, PageWindow, POSTS_PER_PAGE},
};

pub(crate) const SELECT_POST_CARDS: &str = "
    SELECT p.id, p.text, p.pub_date, p.image,
           u.id AS author_id, u.username AS author_username,
           u.first_name AS author_first_name, u.last_name AS author_last_name,
           pr.avatar AS author_avatar,
           g.id AS group_id, g.title AS group_title, g.slug AS group_slug,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
    LEFT JOIN profiles pr ON pr.user_id = u.id
    LEFT JOIN post_groups g ON g.id = p.group_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author this user follows.
    FollowedBy(i64),
}

impl FeedFilter {
    fn where_clause(&self) -> &'static str {
        match self {
            FeedFilter::All => "",
            FeedFilter::Group(_) => " WHERE p.group_id = ?",
            FeedFilter::Author(_) => " WHERE p.author_id = ?",
            FeedFilter::FollowedBy(_) => {
                " WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)"
            }
        }
    }

    fn param(&self) -> Option<i64> {
        match *self {
            FeedFilter::All => None,
            FeedFilter::Group(id) | FeedFilter::Author(id) | FeedFilter::FollowedBy(id) => Some(id),
        }
    }
}

pub async fn count_posts(db: &Db, filter: FeedFilter) -> Result<i64, ApiError> {
    let sql = format!("SELECT COUNT(*) FROM posts p{}", filter.where_clause());
    let mut q = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(id) = filter.param() {
        q = q.bind(id);
    }
    Ok(q.fetch_one(&db.0).await?)
}

pub async fn fetch_page(
    db: &Db,
    filter: FeedFilter,
    requested: Option<&str>,
) -> Result<Page<PostCard>, ApiError> {
    let count = count_posts(db, filter).await?;
    let window = PageWindow::resolve(count, POSTS_PER_PAGE, requested);

    let sql = format!(
        "{SELECT_POST_CARDS}{} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?",
        filter.where_clause()
    );
    let mut q = sqlx::query_as::<_, PostRow>(&sql);
    if let Some(id) = filter.param() {
        q = q.bind(id);
    }
    let rows = q
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&db.0)
        .await?;

    Ok(Page::new(rows.into_iter().map(PostCard::from).collect(), window))
}

pub async fn post_card(db: &Db, post_id: i64) -> Result<Option<PostCard>, ApiError> {
    let sql = format!("{SELECT_POST_CARDS} WHERE p.id = ?");
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_id)
        .fetch_optional(&db.0)
        .await?;
    Ok(row.map(PostCard::from))
}
