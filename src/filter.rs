//! Filter composition for grid points
//!
//! Every grid point receives the same two baseline exclusions (major
//! dysrhythmia, myocardial ischemia), followed by the run-level filters and
//! an optional stratification clause. Clauses are a conjunction, so order
//! never changes which records match, but it is preserved so the derived
//! query signature is reproducible.
//!
//! ## Clause format
//!
//! Clauses serialize as `[field, operator, value]` triples, matching the
//! override syntax accepted on the command line:
//!
//! ```rust
//! use vo2_sweep::filter::FilterClause;
//!
//! let clause: FilterClause = serde_yaml::from_str("[age, '>=', 40]").unwrap();
//! assert_eq!(clause.to_string(), "age >= 40");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scalar operand of a filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean flag
    Bool(bool),
    /// Integer value (codes, flags, counts)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Operator {
    /// Operator symbol as written in clauses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            other => Err(Error::InvalidFilter(format!(
                "unsupported operator '{other}' (expected one of =, !=, <, <=, >, >=)"
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(field, operator, value)` data filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClause", into = "RawClause")]
pub struct FilterClause {
    field: String,
    operator: Operator,
    value: Scalar,
}

/// Wire form of a clause: a three element sequence.
#[derive(Serialize, Deserialize)]
struct RawClause(String, String, Scalar);

impl TryFrom<RawClause> for FilterClause {
    type Error = Error;

    fn try_from(raw: RawClause) -> Result<Self> {
        Self::new(raw.0, &raw.1, raw.2)
    }
}

impl From<FilterClause> for RawClause {
    fn from(clause: FilterClause) -> Self {
        Self(
            clause.field,
            clause.operator.as_str().to_string(),
            clause.value,
        )
    }
}

impl FilterClause {
    /// Create a clause, validating the field name and operator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the field is blank or the
    /// operator is not one of `=`, `!=`, `<`, `<=`, `>`, `>=`.
    pub fn new(field: impl Into<String>, operator: &str, value: impl Into<Scalar>) -> Result<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(Error::InvalidFilter(
                "field name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            field,
            operator: operator.parse()?,
            value: value.into(),
        })
    }

    /// Equality clause on an integer-coded field.
    #[must_use]
    pub fn eq(field: &str, value: i64) -> Self {
        Self {
            field: field.to_string(),
            operator: Operator::Eq,
            value: Scalar::Int(value),
        }
    }

    /// Field the clause applies to.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Comparison operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Right-hand operand.
    #[must_use]
    pub const fn value(&self) -> &Scalar {
        &self.value
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// The fixed exclusions applied to every grid point: no major dysrhythmia,
/// no myocardial ischemia. Not configurable.
#[must_use]
pub fn baseline_clauses() -> [FilterClause; 2] {
    [
        FilterClause::eq("majdysrh", 0),
        FilterClause::eq("myocisch", 0),
    ]
}

/// Stratification clause selecting one gender code.
#[must_use]
pub fn gender_clause(gender: u8) -> FilterClause {
    FilterClause::eq("gender", i64::from(gender))
}

/// Compose the final clause list for a grid point:
/// `baseline ++ run_filters ++ [stratification]`.
#[must_use]
pub fn compose(run_filters: &[FilterClause], stratification: Option<&FilterClause>) -> Vec<FilterClause> {
    let baseline = baseline_clauses();
    let mut clauses = Vec::with_capacity(baseline.len() + run_filters.len() + 1);
    clauses.extend(baseline);
    clauses.extend_from_slice(run_filters);
    clauses.extend(stratification.cloned());
    clauses
}

/// Render a clause list as a conjunctive query signature, e.g.
/// `majdysrh = 0 AND myocisch = 0`.
#[must_use]
pub fn signature(clauses: &[FilterClause]) -> String {
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" AND ")
}
