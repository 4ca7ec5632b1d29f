//! Keyword search over projects.
//!
//! A query is a list of whitespace-separated keywords. A project matches when
//! every keyword occurs, case-sensitively, in its name or its details.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::project::{Project, SearchForm};
use crate::pagination::{Page, Paginator, PAGE_SIZE};

pub const KEYWORD_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordQuery {
    keywords: Vec<String>,
}

impl KeywordQuery {
    /// Matches every project.
    pub fn all() -> Self {
        Self::default()
    }

    /// Duplicates are kept; they do not change the result.
    pub fn parse(input: &str) -> Self {
        Self {
            keywords: input.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Build the query for a search request. Anything that is not a valid
    /// submission searches for everything.
    pub fn from_form(form: Option<&SearchForm>) -> Self {
        match form.and_then(|form| clean_keyword(&form.keyword)) {
            Some(keyword) => Self::parse(keyword),
            None => Self::all(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Append the WHERE clause for this query; no keywords means no clause.
    pub fn push_filter(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if self.keywords.is_empty() {
            return;
        }
        builder.push(" WHERE ");
        for (i, kw) in self.keywords.iter().enumerate() {
            if i > 0 {
                builder.push(" AND ");
            }
            // instr() is case-sensitive where LIKE is not
            builder
                .push("(instr(name, ")
                .push_bind(kw.clone())
                .push(") > 0 OR instr(details, ")
                .push_bind(kw.clone())
                .push(") > 0)");
        }
    }
}

/// Form rules for the keyword field: required, trimmed, bounded length.
fn clean_keyword(raw: &str) -> Option<&str> {
    let keyword = raw.trim();
    if keyword.is_empty() || keyword.chars().count() > KEYWORD_MAX_LENGTH {
        None
    } else {
        Some(keyword)
    }
}

pub async fn find_page(
    db: &SqlitePool,
    query: &KeywordQuery,
    raw_page: Option<&str>,
) -> Result<Page<Project>, sqlx::Error> {
    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM projects");
    query.push_filter(&mut count_query);
    let count = count_query
        .build_query_scalar::<i64>()
        .fetch_one(db)
        .await?;

    let paginator = Paginator::new(count, PAGE_SIZE);
    let number = paginator.resolve(raw_page);

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM projects");
    query.push_filter(&mut select);
    select
        .push(" ORDER BY id LIMIT ")
        .push_bind(paginator.per_page())
        .push(" OFFSET ")
        .push_bind(paginator.offset(number));
    let projects = select.build_query_as::<Project>().fetch_all(db).await?;

    tracing::debug!(
        keywords = ?query.keywords(),
        count,
        page = number,
        "project page fetched"
    );
    Ok(paginator.page(number, projects))
}
