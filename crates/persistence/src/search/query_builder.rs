//! SQL predicate builder for registry searches.
//!
//! Translates typed search parameters into an AND-joined list of SQL
//! fragments over the `PERSON` (or `MEDICATION_REQUEST`) table. Every caller
//! value is bound through a `?N` placeholder; fragments own the values they
//! bind, so the two can never fall out of step.

use tracing::debug;

use crate::error::IdentifierError;
use crate::mapping::identifier::IdentifierToken;

use super::params::{MedicationRequestSearchParams, PersonSearchParams};

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values, in placeholder order.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl SqlFragment {
    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// An ordered list of filter fragments joined with AND.
///
/// An empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPredicate {
    clauses: Vec<SqlFragment>,
}

impl SearchPredicate {
    /// The filter fragments, in the order they were added.
    pub fn clauses(&self) -> &[SqlFragment] {
        &self.clauses
    }

    /// Number of filter fragments.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true when the predicate matches every row.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Total number of bound values.
    pub fn param_count(&self) -> usize {
        self.clauses.iter().map(|c| c.params.len()).sum()
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> impl Iterator<Item = &SqlParam> {
        self.clauses.iter().flat_map(|c| c.params.iter())
    }

    /// `" WHERE ..."`, or an empty string for an empty predicate.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let joined = self
            .clauses
            .iter()
            .map(|c| c.sql.as_str())
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {}", joined)
    }
}

/// Allocates placeholder numbers and collects clauses.
struct ClauseWriter {
    next: usize,
    clauses: Vec<SqlFragment>,
}

impl ClauseWriter {
    fn new() -> Self {
        Self {
            next: 0,
            clauses: Vec::new(),
        }
    }

    fn placeholder(&mut self) -> String {
        self.next += 1;
        format!("?{}", self.next)
    }

    fn equals(&mut self, column: &str, param: SqlParam) {
        let sql = format!("{} = {}", column, self.placeholder());
        self.clauses.push(SqlFragment::with_params(sql, vec![param]));
    }

    fn push(&mut self, fragment: SqlFragment) {
        self.clauses.push(fragment);
    }

    fn finish(self) -> SearchPredicate {
        SearchPredicate {
            clauses: self.clauses,
        }
    }
}

/// Builds person search predicates.
///
/// Placeholders are numbered from `?1`; the paging values are bound after
/// the predicate's own values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonQueryBuilder;

impl PersonQueryBuilder {
    /// Creates a builder.
    pub fn new() -> Self {
        Self
    }

    /// Builds the predicate for `params`.
    ///
    /// When an identifier is given it alone selects the result set and every
    /// other parameter is ignored. Otherwise each present parameter adds one
    /// clause; `name` adds a single OR group across the three name columns.
    pub fn build(&self, params: &PersonSearchParams) -> Result<SearchPredicate, IdentifierError> {
        let mut writer = ClauseWriter::new();

        if let Some(token) = &params.identifier {
            if params.id.is_some()
                || params.family.is_some()
                || params.gender.is_some()
                || params.birth_date.is_some()
                || params.email.is_some()
                || params.name.is_some()
            {
                debug!(identifier = %token, "Identifier search ignores other parameters");
            }
            let fragment = identifier_clause(&mut writer, token)?;
            writer.push(fragment);
            return Ok(writer.finish());
        }

        if let Some(id) = params.id {
            writer.equals("PRSN_ID", SqlParam::integer(id));
        }
        if let Some(family) = &params.family {
            writer.equals("PRSN_LAST_NAME", SqlParam::string(family));
        }
        if let Some(gender) = &params.gender {
            writer.equals("PRSN_GENDER", SqlParam::string(gender));
        }
        if let Some(birth_date) = params.birth_date {
            writer.equals(
                "PRSN_BIRTH_DATE",
                SqlParam::string(birth_date.format("%Y-%m-%d").to_string()),
            );
        }
        if let Some(email) = &params.email {
            writer.equals("PRSN_EMAIL", SqlParam::string(email));
        }
        if let Some(name) = &params.name {
            let fragment = name_clause(&mut writer, name);
            writer.push(fragment);
        }

        Ok(writer.finish())
    }
}

fn name_clause(writer: &mut ClauseWriter, name: &str) -> SqlFragment {
    let pattern = format!("%{}%", escape_like(name));
    let columns = ["PRSN_FIRST_NAME", "PRSN_LAST_NAME", "PRSN_SECOND_NAME"];

    let mut params = Vec::with_capacity(columns.len());
    let mut alternatives = Vec::with_capacity(columns.len());
    for column in columns {
        alternatives.push(format!(
            "{} LIKE {} ESCAPE '\\'",
            column,
            writer.placeholder()
        ));
        params.push(SqlParam::string(pattern.clone()));
    }

    SqlFragment::with_params(format!("({})", alternatives.join(" OR ")), params)
}

fn identifier_clause(
    writer: &mut ClauseWriter,
    token: &IdentifierToken,
) -> Result<SqlFragment, IdentifierError> {
    let fragment = match token.decode()? {
        Some(decoded) => match decoded.kind.document_code() {
            None => SqlFragment::with_params(
                format!("CAST(PRSN_ID AS TEXT) = {}", writer.placeholder()),
                vec![SqlParam::string(decoded.value)],
            ),
            Some(code) => {
                let code_ph = writer.placeholder();
                let value_ph = writer.placeholder();
                SqlFragment::with_params(
                    format!(
                        "EXISTS (SELECT 1 FROM PERSON_DOC d WHERE d.PRDT_PRSN_ID = PERSON.PRSN_ID \
                         AND d.PRDT_DELETE_DATE IS NULL AND d.PRDT_DCTP_ID = {} AND d.PRDT_DOC_VALUE = {})",
                        code_ph, value_ph
                    ),
                    vec![SqlParam::integer(code), SqlParam::string(decoded.value)],
                )
            }
        },
        None => {
            let id_ph = writer.placeholder();
            let value_ph = writer.placeholder();
            SqlFragment::with_params(
                format!(
                    "(CAST(PRSN_ID AS TEXT) = {} OR EXISTS (SELECT 1 FROM PERSON_DOC d \
                     WHERE d.PRDT_PRSN_ID = PERSON.PRSN_ID AND d.PRDT_DELETE_DATE IS NULL \
                     AND d.PRDT_DOC_VALUE = {}))",
                    id_ph, value_ph
                ),
                vec![
                    SqlParam::string(token.value.clone()),
                    SqlParam::string(token.value.clone()),
                ],
            )
        }
    };
    Ok(fragment)
}

/// Builds the predicate for a medication request search.
pub fn medication_request_predicate(params: &MedicationRequestSearchParams) -> SearchPredicate {
    let mut writer = ClauseWriter::new();

    if let Some(id) = params.id {
        writer.equals("MDRQ_ID", SqlParam::integer(id));
    }
    if let Some(patient) = params.patient {
        writer.equals("MDRQ_PRSN_ID", SqlParam::integer(patient));
    }
    if let Some(requester) = params.requester {
        writer.equals("MDRQ_REQUESTER_ID", SqlParam::integer(requester));
    }
    if let Some(status) = &params.status {
        writer.equals("MDRQ_STATUS", SqlParam::string(status));
    }

    writer.finish()
}

/// Escapes LIKE wildcards so the value matches literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
