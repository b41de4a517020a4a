//! `$filter` → parameterized SQL predicates.
//!
//! Accepted terms, implicitly AND-ed:
//! - `<field> eq '<value>'`              → `<column> = ?`     bound `value`
//! - `contains(<field>, '<value>')`      → `<column> LIKE ?`  bound `%value%`
//! - `startswith(<field>, '<value>')`    → `<column> LIKE ?`  bound `value%`
//!
//! Output order is all equalities, then all `contains`, then all `startswith`,
//! each group keeping the order the terms appeared in. LIKE metacharacters in
//! the bound value are passed through unescaped.

use crate::allow_list::AllowList;
use crate::ast::{CompareOperator, Expr, Value};
use crate::error::{Error, Result};
use crate::params::SqlParam;

/// Upper bound on raw `$filter` length, in bytes.
pub const MAX_FILTER_LEN: usize = 8 * 1024;

/// A conjunction of SQL predicates with their bound arguments.
///
/// Every predicate uses positional `?` placeholders; `args` holds exactly one
/// value per placeholder, in the order the placeholders appear when the
/// predicates are joined.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterClause {
    predicates: Vec<String>,
    args: Vec<SqlParam>,
}

impl FilterClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one predicate and the values for its placeholders.
    pub fn push(&mut self, predicate: impl Into<String>, args: impl IntoIterator<Item = SqlParam>) {
        let predicate = predicate.into();
        let before = self.args.len();
        self.args.extend(args);
        debug_assert_eq!(
            predicate.matches('?').count(),
            self.args.len() - before,
            "placeholder/argument count mismatch in `{predicate}`"
        );
        self.predicates.push(predicate);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, predicate: impl Into<String>, args: impl IntoIterator<Item = SqlParam>) -> Self {
        self.push(predicate, args);
        self
    }

    /// Append all predicates of `other` after ours.
    pub fn and(mut self, other: FilterClause) -> Self {
        self.predicates.extend(other.predicates);
        self.args.extend(other.args);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    pub fn args(&self) -> &[SqlParam] {
        &self.args
    }

    /// Predicates joined with `AND`, or `None` when there are none.
    pub fn to_sql(&self) -> Option<String> {
        if self.predicates.is_empty() {
            None
        } else {
            Some(self.predicates.join(" AND "))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TermKind {
    Eq,
    Contains,
    StartsWith,
}

struct Term {
    kind: TermKind,
    column: String,
    value: String,
}

impl Term {
    fn predicate(&self) -> String {
        match self.kind {
            TermKind::Eq => format!("{} = ?", self.column),
            TermKind::Contains | TermKind::StartsWith => format!("{} LIKE ?", self.column),
        }
    }

    fn arg(&self) -> SqlParam {
        match self.kind {
            TermKind::Eq => SqlParam::Text(self.value.clone()),
            TermKind::Contains => SqlParam::Text(format!("%{}%", self.value)),
            TermKind::StartsWith => SqlParam::Text(format!("{}%", self.value)),
        }
    }
}

/// Translate a raw `$filter` string against the filter allow-list.
///
/// Blank input yields an empty clause. Any identifier outside `allow` fails
/// with [`Error::InvalidFilterField`] before the shape of the term is looked
/// at; anything that is not one of the three accepted terms fails with
/// [`Error::InvalidFilter`].
pub fn parse_filter(raw: &str, allow: &AllowList) -> Result<FilterClause> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(FilterClause::new());
    }
    if raw.len() > MAX_FILTER_LEN {
        return Err(Error::InvalidFilter("filter too long".into()));
    }

    let expr = crate::parse_filter_ast(raw)?;

    let mut conjuncts = Vec::new();
    flatten_and(expr, &mut conjuncts);

    for c in &conjuncts {
        check_fields(c, allow)?;
    }

    let mut terms = conjuncts
        .into_iter()
        .map(|c| compile_term(c, allow))
        .collect::<Result<Vec<_>>>()?;

    // stable: keeps appearance order within each group
    terms.sort_by_key(|t| t.kind);

    let mut clause = FilterClause::new();
    for t in &terms {
        clause.push(t.predicate(), [t.arg()]);
    }
    Ok(clause)
}

fn flatten_and(expr: Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::And(a, b) => {
            flatten_and(*a, out);
            flatten_and(*b, out);
        }
        other => out.push(other),
    }
}

fn check_fields(expr: &Expr, allow: &AllowList) -> Result<()> {
    match expr {
        Expr::Identifier(name) => {
            if allow.contains(name) {
                Ok(())
            } else {
                Err(Error::InvalidFilterField(name.clone()))
            }
        }
        Expr::And(a, b) | Expr::Or(a, b) | Expr::Compare(a, _, b) => {
            check_fields(a, allow)?;
            check_fields(b, allow)
        }
        Expr::Not(x) => check_fields(x, allow),
        Expr::In(a, list) => {
            check_fields(a, allow)?;
            list.iter().try_for_each(|x| check_fields(x, allow))
        }
        Expr::Function(_, args) => args.iter().try_for_each(|x| check_fields(x, allow)),
        Expr::Value(_) => Ok(()),
    }
}

fn compile_term(expr: Expr, allow: &AllowList) -> Result<Term> {
    match expr {
        Expr::Compare(lhs, CompareOperator::Eq, rhs) => {
            let column = field_column(&lhs, allow)?;
            let value = string_literal(&rhs)?;
            Ok(Term {
                kind: TermKind::Eq,
                column,
                value,
            })
        }
        Expr::Compare(_, op, _) => Err(Error::InvalidFilter(format!(
            "unsupported operator: {op:?}"
        ))),
        Expr::Function(name, args) => {
            let kind = match name.to_ascii_lowercase().as_str() {
                "contains" => TermKind::Contains,
                "startswith" => TermKind::StartsWith,
                _ => {
                    return Err(Error::InvalidFilter(format!(
                        "unsupported function: {name}"
                    )))
                }
            };
            let [field, literal] = args.as_slice() else {
                return Err(Error::InvalidFilter(format!(
                    "{name}() expects 2 arguments, got {}",
                    args.len()
                )));
            };
            Ok(Term {
                kind,
                column: field_column(field, allow)?,
                value: string_literal(literal)?,
            })
        }
        Expr::Or(..) => Err(Error::InvalidFilter("'or' is not supported".into())),
        Expr::Not(_) => Err(Error::InvalidFilter("'not' is not supported".into())),
        Expr::In(..) => Err(Error::InvalidFilter("'in' is not supported".into())),
        Expr::Identifier(name) => Err(Error::InvalidFilter(format!(
            "bare field is not a predicate: {name}"
        ))),
        Expr::Value(v) => Err(Error::InvalidFilter(format!(
            "bare {} literal is not a predicate",
            v.kind()
        ))),
        // flattened by the caller
        Expr::And(..) => Err(Error::InvalidFilter("nested 'and' term".into())),
    }
}

fn field_column(expr: &Expr, allow: &AllowList) -> Result<String> {
    match expr {
        Expr::Identifier(name) => allow
            .column(name)
            .map(str::to_owned)
            .ok_or_else(|| Error::InvalidFilterField(name.clone())),
        _ => Err(Error::InvalidFilter(
            "left-hand side must be a field name".into(),
        )),
    }
}

fn string_literal(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Value(Value::String(s)) => Ok(s.clone()),
        Expr::Value(v) => Err(Error::InvalidFilter(format!(
            "expected a string literal, got {}",
            v.kind()
        ))),
        _ => Err(Error::InvalidFilter("expected a string literal".into())),
    }
}
