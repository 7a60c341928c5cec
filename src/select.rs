use std::fmt;
use std::sync::Arc;

use crate::error::DbFacadeError;
use crate::escape::SqlEscape;
use crate::interpolate::fill_template;
use crate::types::DbValue;

/// One term of a WHERE (or HAVING) clause.
///
/// Raw strings pass through verbatim; pairs have every `?` in the template
/// replaced by the escaped value; subqueries render through
/// [`Select::assemble`]; groups AND-join a nested term list.
#[derive(Debug, Clone)]
pub enum WhereTerm {
    Raw(String),
    Pair(String, DbValue),
    Subquery(Select),
    Group(Vec<WhereTerm>),
}

impl WhereTerm {
    #[must_use]
    pub fn raw(expr: impl Into<String>) -> Self {
        WhereTerm::Raw(expr.into())
    }

    #[must_use]
    pub fn pair(template: impl Into<String>, value: impl Into<DbValue>) -> Self {
        WhereTerm::Pair(template.into(), value.into())
    }

    fn render(&self, escaper: &dyn SqlEscape) -> Result<String, DbFacadeError> {
        match self {
            WhereTerm::Raw(s) => Ok(s.clone()),
            WhereTerm::Pair(template, value) => fill_template(template, value, escaper),
            WhereTerm::Subquery(select) => select.assemble(),
            WhereTerm::Group(terms) => render_terms(terms, escaper),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            WhereTerm::Raw(s) => s.trim().is_empty(),
            WhereTerm::Pair(template, _) => template.trim().is_empty(),
            WhereTerm::Subquery(_) => false,
            WhereTerm::Group(terms) => terms.iter().all(WhereTerm::is_blank),
        }
    }
}

impl From<&str> for WhereTerm {
    fn from(expr: &str) -> Self {
        WhereTerm::Raw(expr.to_string())
    }
}

impl From<String> for WhereTerm {
    fn from(expr: String) -> Self {
        WhereTerm::Raw(expr)
    }
}

impl<V: Into<DbValue>> From<(&str, V)> for WhereTerm {
    fn from((template, value): (&str, V)) -> Self {
        WhereTerm::Pair(template.to_string(), value.into())
    }
}

impl From<Select> for WhereTerm {
    fn from(select: Select) -> Self {
        WhereTerm::Subquery(select)
    }
}

impl From<Vec<WhereTerm>> for WhereTerm {
    fn from(terms: Vec<WhereTerm>) -> Self {
        WhereTerm::Group(terms)
    }
}

/// A normalized WHERE clause: a sequence of terms, parenthesized and
/// AND-joined at render time. A bare term converts into a one-element
/// sequence.
#[derive(Debug, Clone, Default)]
pub struct Where(Vec<WhereTerm>);

impl Where {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, term: impl Into<WhereTerm>) -> Self {
        self.0.push(term.into());
        self
    }

    #[must_use]
    pub fn terms(&self) -> &[WhereTerm] {
        &self.0
    }

    /// True when there is nothing to render: no terms, or only blank ones.
    /// `update` and `remove` reject blank clauses before rendering.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(WhereTerm::is_blank)
    }

    /// Render the clause body (without the `WHERE` keyword).
    ///
    /// # Errors
    ///
    /// Returns an error if a subquery term fails to assemble.
    pub fn render(&self, escaper: &dyn SqlEscape) -> Result<String, DbFacadeError> {
        render_terms(&self.0, escaper)
    }
}

impl From<WhereTerm> for Where {
    fn from(term: WhereTerm) -> Self {
        Where(vec![term])
    }
}

impl From<&str> for Where {
    fn from(expr: &str) -> Self {
        Where(vec![WhereTerm::from(expr)])
    }
}

impl From<String> for Where {
    fn from(expr: String) -> Self {
        Where(vec![WhereTerm::from(expr)])
    }
}

impl<V: Into<DbValue>> From<(&str, V)> for Where {
    fn from(pair: (&str, V)) -> Self {
        Where(vec![WhereTerm::from(pair)])
    }
}

impl From<Select> for Where {
    fn from(select: Select) -> Self {
        Where(vec![WhereTerm::Subquery(select)])
    }
}

impl From<Vec<WhereTerm>> for Where {
    fn from(terms: Vec<WhereTerm>) -> Self {
        Where(terms)
    }
}

impl FromIterator<WhereTerm> for Where {
    fn from_iter<I: IntoIterator<Item = WhereTerm>>(iter: I) -> Self {
        Where(iter.into_iter().collect())
    }
}

pub(crate) fn render_terms(
    terms: &[WhereTerm],
    escaper: &dyn SqlEscape,
) -> Result<String, DbFacadeError> {
    let rendered = terms
        .iter()
        .map(|term| Ok(format!("({})", term.render(escaper)?)))
        .collect::<Result<Vec<_>, DbFacadeError>>()?;
    Ok(rendered.join(" AND "))
}

/// A fluent SELECT builder bound to one adapter's escaper.
///
/// Clause fragments accumulate in structured form until [`assemble`]
/// renders them into a single SQL string; WHERE and HAVING values are
/// escaped inline at assembly time. A `Select` is not reusable across
/// unrelated adapters, since it escapes with the one that created it.
///
/// ```rust,no_run
/// # use db_facade::prelude::*;
/// # async fn demo(db: &mut DbFacade) -> Result<(), DbFacadeError> {
/// let select = db
///     .select()?
///     .columns(["id", "name"])
///     .from("player")
///     .and_where(("score > ?", 40))
///     .order_by("name")
///     .limit(10);
/// let rows = db.fetch_all(select, &[]).await?;
/// # let _ = rows;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Select {
    escaper: Arc<dyn SqlEscape + Send + Sync>,
    distinct: bool,
    columns: Vec<String>,
    from: Option<String>,
    wheres: Vec<WhereTerm>,
    group_by: Vec<String>,
    having: Vec<WhereTerm>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    #[must_use]
    pub fn new(escaper: Arc<dyn SqlEscape + Send + Sync>) -> Self {
        Self {
            escaper,
            distinct: false,
            columns: Vec::new(),
            from: None,
            wheres: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add column fragments. Fragments are caller-supplied SQL used
    /// verbatim, so expressions and aliases work. No columns means `*`.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Set the table; the name is identifier-quoted at assembly time.
    #[must_use]
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.from = Some(table.into());
        self
    }

    #[must_use]
    pub fn and_where(mut self, term: impl Into<WhereTerm>) -> Self {
        self.wheres.push(term.into());
        self
    }

    #[must_use]
    pub fn group_by(mut self, fragment: impl Into<String>) -> Self {
        self.group_by.push(fragment.into());
        self
    }

    #[must_use]
    pub fn having(mut self, term: impl Into<WhereTerm>) -> Self {
        self.having.push(term.into());
        self
    }

    /// Add an ORDER BY fragment, used verbatim (`"name DESC"` works).
    #[must_use]
    pub fn order_by(mut self, fragment: impl Into<String>) -> Self {
        self.order_by.push(fragment.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render the accumulated clauses into one SQL string.
    ///
    /// # Errors
    ///
    /// Returns an error if a WHERE or HAVING subquery fails to assemble.
    pub fn assemble(&self) -> Result<String, DbFacadeError> {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        if let Some(table) = &self.from {
            sql.push_str(" FROM ");
            sql.push_str(&self.escaper.escape_table(table));
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_terms(&self.wheres, self.escaper.as_ref())?);
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&render_terms(&self.having, self.escaper.as_ref())?);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }
}

// Manual Debug because the escaper handle is not Debug
impl fmt::Debug for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("distinct", &self.distinct)
            .field("columns", &self.columns)
            .field("from", &self.from)
            .field("wheres", &self.wheres)
            .field("group_by", &self.group_by)
            .field("having", &self.having)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
