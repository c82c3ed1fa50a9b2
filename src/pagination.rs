use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use serde::Serialize;

use crate::errors::ApiError;

pub const POSTS_PER_PAGE: i64 = 10;

/// The raw `page` query value. A repeated key keeps the last value and an
/// unparsable query string reads as no page at all.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn from_query_string(query: &str) -> Self {
        let page = web::Query::<Vec<(String, String)>>::from_query(query)
            .ok()
            .and_then(|pairs| {
                pairs
                    .into_inner()
                    .into_iter()
                    .rev()
                    .find(|(key, _)| key == "page")
                    .map(|(_, value)| value)
            });
        Self { page }
    }
}

impl FromRequest for PageQuery {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_query_string(req.query_string())))
    }
}

/// Where a requested page lands inside a list of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    #[serde(skip)]
    pub per_page: i64,
}

impl PageWindow {
    /// Resolves the raw `page` query value. Garbage falls back to the first
    /// page, numbers outside `1..=num_pages` clamp to the last one.
    pub fn resolve(count: i64, per_page: i64, requested: Option<&str>) -> Self {
        let count = count.max(0);
        let num_pages = if count == 0 { 1 } else { (count + per_page - 1) / per_page };
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n >= 1 && n <= num_pages => n,
            Some(Ok(_)) => num_pages,
        };
        Self { number, num_pages, count, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// One page of results plus the navigation data templates need.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<i64>,
    pub next_page_number: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, window: PageWindow) -> Self {
        Self {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            previous_page_number: window.has_previous().then(|| window.number - 1),
            next_page_number: window.has_next().then(|| window.number + 1),
        }
    }

    /// Slices an already materialized list.
    #[cfg(test)]
    pub fn from_vec(items: Vec<T>, per_page: i64, requested: Option<&str>) -> Self {
        let window = PageWindow::resolve(items.len() as i64, per_page, requested);
        let object_list = items
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit() as usize)
            .collect();
        Self::new(object_list, window)
    }
}
