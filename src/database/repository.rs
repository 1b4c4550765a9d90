use std::collections::HashMap;

use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AccountSummary, Owned, Populated};
use crate::types::Role;

/// Which rows of a document table an account may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Owned by or assigned to the account.
    Involving(Uuid),
    AssignedTo(Uuid),
}

impl Scope {
    pub fn visible_to(account_id: Uuid, role: Role) -> Self {
        match role {
            Role::Admin => Scope::All,
            Role::User => Scope::Involving(account_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive substring match.
    Contains(&'static str, String),
    Text(&'static str, String),
    Bool(&'static str, bool),
}

/// Requested page; `page` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp raw values: page >= 1, 1 <= limit <= 100, unparseable values fall back to defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l != 0)
            .unwrap_or(Self::DEFAULT_LIMIT as i64)
            .clamp(1, Self::MAX_LIMIT as i64);

        Self {
            page: page.min(u32::MAX as i64) as u32,
            limit: limit as u32,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: Self::DEFAULT_LIMIT }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = request.limit.max(1) as i64;
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
pub fn like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('%');
    for c in input.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope, filters: &[Filter]) {
    match scope {
        Scope::All => {}
        Scope::Involving(id) => {
            qb.push(" AND (owner_id = ")
                .push_bind(id)
                .push(" OR assigned_to_id = ")
                .push_bind(id)
                .push(")");
        }
        Scope::AssignedTo(id) => {
            qb.push(" AND assigned_to_id = ").push_bind(id);
        }
    }

    for filter in filters {
        match filter {
            Filter::Contains(column, value) => {
                qb.push(format!(" AND {} ILIKE ", column))
                    .push_bind(like_pattern(value));
            }
            Filter::Text(column, value) => {
                qb.push(format!(" AND {} = ", column)).push_bind(value.clone());
            }
            Filter::Bool(column, value) => {
                qb.push(format!(" AND {} = ", column)).push_bind(*value);
            }
        }
    }
}

/// Newest-first listing of `table`, paginated when `page` is given.
/// `table` and filter columns are compile-time identifiers, never user input.
pub async fn list<T>(
    pool: &PgPool,
    table: &'static str,
    scope: Scope,
    filters: &[Filter],
    page: Option<PageRequest>,
) -> Result<Listing<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE TRUE", table));
    push_conditions(&mut select, scope, filters);
    select.push(" ORDER BY created_at DESC");

    let Some(request) = page else {
        let items = select.build_query_as::<T>().fetch_all(pool).await?;
        return Ok(Listing { items, pagination: None });
    };

    select
        .push(" LIMIT ")
        .push_bind(request.limit as i64)
        .push(" OFFSET ")
        .push_bind(request.offset());

    let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} WHERE TRUE", table));
    push_conditions(&mut count, scope, filters);

    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;
    let items = select.build_query_as::<T>().fetch_all(pool).await?;

    Ok(Listing {
        items,
        pagination: Some(Pagination::new(request, total)),
    })
}

pub async fn account_summaries(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, AccountSummary>, DatabaseError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<AccountSummary> = sqlx::query_as(
        "SELECT id, project_name, email, role FROM accounts WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|summary| (summary.id, summary)).collect())
}

/// Attach owner and assignee summaries with a single account lookup.
pub async fn populate<T: Owned>(
    pool: &PgPool,
    docs: Vec<T>,
) -> Result<Vec<Populated<T>>, DatabaseError> {
    let mut ids: Vec<Uuid> = docs
        .iter()
        .flat_map(|doc| std::iter::once(doc.owner_id()).chain(doc.assigned_to_id()))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let summaries = account_summaries(pool, &ids).await?;

    Ok(docs
        .into_iter()
        .map(|doc| {
            let owner = summaries.get(&doc.owner_id()).cloned();
            let assigned_to = doc.assigned_to_id().and_then(|id| summaries.get(&id).cloned());
            Populated { doc, owner, assigned_to }
        })
        .collect())
}

pub async fn populate_one<T: Owned>(pool: &PgPool, doc: T) -> Result<Populated<T>, DatabaseError> {
    let mut populated = populate(pool, vec![doc]).await?;
    populated
        .pop()
        .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
}
