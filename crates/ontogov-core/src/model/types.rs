//! Normalized type descriptors
//!
//! Semantic models and physical catalogs spell the same type many ways
//! (`nvarchar(50)`, `String`, `Text`; `bigint`, `Int64`, `Whole Number`).
//! `TypeDescriptor::parse` folds those spellings into a family, a rank
//! within the family and optional size parameters so that diff, drift and
//! debt analysis compare types rather than strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ExError, GovernanceError};

/// Coarse type family
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    Integer,
    Decimal,
    Float,
    Text,
    Boolean,
    Temporal,
    Identifier,
    Binary,
    Other(String),
}

/// Effect of moving a value from one type to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeChange {
    Same,
    Widened,
    Narrowed,
    Incompatible,
}

impl TypeChange {
    /// Narrowing or a family change may lose data
    pub fn is_breaking(&self) -> bool {
        matches!(self, TypeChange::Narrowed | TypeChange::Incompatible)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub family: TypeFamily,

    /// Storage rank within the family (tinyint < smallint < int < bigint)
    pub rank: u8,

    /// Character or byte length; `u32::MAX` for `max`
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

const DEFAULT_DECIMAL_PRECISION: u32 = 18;

impl TypeDescriptor {
    /// Parse type text into a normalized descriptor
    ///
    /// Unknown base names are accepted as `TypeFamily::Other`; only
    /// structurally malformed text is rejected.
    ///
    /// # Errors
    ///
    /// `GovernanceError::InvalidTypeDescriptor` for empty text, unbalanced
    /// parentheses, empty or non-numeric parameters.
    pub fn parse(text: &str) -> Result<Self, GovernanceError> {
        let invalid = |reason: &str| GovernanceError::InvalidTypeDescriptor {
            path: String::new(),
            descriptor: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty descriptor"));
        }

        let (base, params) = match trimmed.find('(') {
            Some(open) => {
                let inner = trimmed[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("unbalanced parentheses"))?;
                if inner.contains(|c: char| c == '(' || c == ')') {
                    return Err(invalid("unbalanced parentheses"));
                }
                let mut params = Vec::new();
                for raw in inner.split(',') {
                    let raw = raw.trim();
                    if raw.is_empty() {
                        return Err(invalid("empty parameter"));
                    }
                    if raw.eq_ignore_ascii_case("max") {
                        params.push(u32::MAX);
                        continue;
                    }
                    let value = raw
                        .parse::<u32>()
                        .map_err(|_| invalid("non-numeric parameter"))?;
                    params.push(value);
                }
                if params.len() > 2 {
                    return Err(invalid("too many parameters"));
                }
                (&trimmed[..open], params)
            }
            None if trimmed.contains(')') => return Err(invalid("unbalanced parentheses")),
            None => (trimmed, Vec::new()),
        };

        let base = base
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if base.is_empty() {
            return Err(invalid("missing base type"));
        }

        let (family, rank) = classify(&base);
        let mut descriptor = TypeDescriptor {
            family,
            rank,
            length: None,
            precision: None,
            scale: None,
        };

        match descriptor.family {
            TypeFamily::Text | TypeFamily::Binary => {
                if params.len() > 1 {
                    return Err(invalid("length types take one parameter"));
                }
                descriptor.length = params.first().copied();
            }
            TypeFamily::Decimal => match base.as_str() {
                "money" | "currency" | "fixed decimal" | "fixed decimal number" => {
                    descriptor.precision = Some(19);
                    descriptor.scale = Some(4);
                }
                "smallmoney" => {
                    descriptor.precision = Some(10);
                    descriptor.scale = Some(4);
                }
                _ => {
                    descriptor.precision = params.first().copied();
                    descriptor.scale = params.get(1).copied().or(descriptor.precision.map(|_| 0));
                }
            },
            TypeFamily::Float | TypeFamily::Temporal => {
                descriptor.precision = params.first().copied();
            }
            TypeFamily::Other(_) => {
                descriptor.length = params.first().copied();
                descriptor.precision = params.get(1).copied();
            }
            // Integer display widths and boolean/identifier params carry no meaning
            TypeFamily::Integer | TypeFamily::Boolean | TypeFamily::Identifier => {}
        }

        Ok(descriptor)
    }

    /// Parse with the identity path of the element carrying the type
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_TYPE_DESCRIPTOR` with `path` attached.
    pub fn parse_at(text: &str, path: &str) -> Result<Self, ExError> {
        Self::parse(text).map_err(|err| match err {
            GovernanceError::InvalidTypeDescriptor {
                descriptor, reason, ..
            } => GovernanceError::InvalidTypeDescriptor {
                path: path.to_string(),
                descriptor,
                reason,
            }
            .into(),
            other => other.into(),
        })
    }

    pub fn same_family(&self, other: &TypeDescriptor) -> bool {
        self.family == other.family
    }

    /// Classify the change from `self` to `to`
    pub fn change_to(&self, to: &TypeDescriptor) -> TypeChange {
        if self == to {
            return TypeChange::Same;
        }
        match (&self.family, &to.family) {
            (TypeFamily::Integer, TypeFamily::Integer) | (TypeFamily::Float, TypeFamily::Float) => {
                by_order(self.rank.cmp(&to.rank))
            }
            (TypeFamily::Integer, TypeFamily::Decimal) | (TypeFamily::Integer, TypeFamily::Float) => {
                TypeChange::Widened
            }
            (TypeFamily::Decimal, TypeFamily::Decimal) => self.decimal_change(to),
            (TypeFamily::Text, TypeFamily::Text) | (TypeFamily::Binary, TypeFamily::Binary) => {
                let from_len = self.length.unwrap_or(u32::MAX);
                let to_len = to.length.unwrap_or(u32::MAX);
                by_order(from_len.cmp(&to_len))
            }
            (TypeFamily::Temporal, TypeFamily::Temporal) => {
                // time-of-day does not widen into a date
                if self.rank == 0 || to.rank == 0 {
                    if self.rank == to.rank {
                        TypeChange::Same
                    } else {
                        TypeChange::Incompatible
                    }
                } else {
                    by_order(self.rank.cmp(&to.rank))
                }
            }
            (TypeFamily::Boolean, TypeFamily::Boolean)
            | (TypeFamily::Identifier, TypeFamily::Identifier) => TypeChange::Same,
            (TypeFamily::Other(a), TypeFamily::Other(b)) if a == b => {
                by_order(self.length.unwrap_or(0).cmp(&to.length.unwrap_or(0)))
            }
            _ => TypeChange::Incompatible,
        }
    }

    fn decimal_change(&self, to: &TypeDescriptor) -> TypeChange {
        let (p1, s1) = self.effective_precision_scale();
        let (p2, s2) = to.effective_precision_scale();
        let (int1, int2) = (p1.saturating_sub(s1), p2.saturating_sub(s2));
        if p1 == p2 && s1 == s2 {
            TypeChange::Same
        } else if s2 >= s1 && int2 >= int1 {
            TypeChange::Widened
        } else {
            TypeChange::Narrowed
        }
    }

    fn effective_precision_scale(&self) -> (u32, u32) {
        (
            self.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
            self.scale.unwrap_or(0),
        )
    }

    fn base_name(&self) -> &str {
        match &self.family {
            TypeFamily::Integer => match self.rank {
                1 => "tinyint",
                2 => "smallint",
                3 => "int",
                _ => "bigint",
            },
            TypeFamily::Decimal => "decimal",
            TypeFamily::Float => match self.rank {
                1 => "real",
                _ => "double",
            },
            TypeFamily::Text => "text",
            TypeFamily::Boolean => "boolean",
            TypeFamily::Temporal => match self.rank {
                0 => "time",
                1 => "date",
                2 => "smalldatetime",
                3 => "datetime",
                _ => "datetimeoffset",
            },
            TypeFamily::Identifier => "uuid",
            TypeFamily::Binary => "binary",
            TypeFamily::Other(name) => name,
        }
    }
}

fn by_order(from_vs_to: Ordering) -> TypeChange {
    match from_vs_to {
        Ordering::Less => TypeChange::Widened,
        Ordering::Equal => TypeChange::Same,
        Ordering::Greater => TypeChange::Narrowed,
    }
}

fn classify(base: &str) -> (TypeFamily, u8) {
    match base {
        "tinyint" | "byte" => (TypeFamily::Integer, 1),
        "smallint" | "int16" | "int2" | "short" => (TypeFamily::Integer, 2),
        "int" | "integer" | "int32" | "int4" | "mediumint" => (TypeFamily::Integer, 3),
        "bigint" | "int64" | "int8" | "long" | "whole number" => (TypeFamily::Integer, 4),

        "decimal" | "numeric" | "dec" | "number" | "money" | "smallmoney" | "currency"
        | "fixed decimal" | "fixed decimal number" => (TypeFamily::Decimal, 0),

        "real" | "float4" | "single" => (TypeFamily::Float, 1),
        "float" | "float8" | "double" | "double precision" | "decimal number" => {
            (TypeFamily::Float, 2)
        }

        "char" | "nchar" | "character" | "varchar" | "nvarchar" | "varchar2" | "nvarchar2"
        | "character varying" | "string" | "text" | "ntext" | "clob" | "str" => {
            (TypeFamily::Text, 0)
        }

        "bit" | "bool" | "boolean" | "true/false" => (TypeFamily::Boolean, 0),

        "time" => (TypeFamily::Temporal, 0),
        "date" => (TypeFamily::Temporal, 1),
        "smalldatetime" => (TypeFamily::Temporal, 2),
        "datetime" | "datetime2" | "timestamp" | "date/time" => (TypeFamily::Temporal, 3),
        "datetimeoffset" | "timestamptz" | "timestamp with time zone" | "date/time/timezone" => {
            (TypeFamily::Temporal, 4)
        }

        "uniqueidentifier" | "uuid" | "guid" => (TypeFamily::Identifier, 0),

        "binary" | "varbinary" | "blob" | "bytea" | "image" => (TypeFamily::Binary, 0),

        other => (TypeFamily::Other(other.to_string()), 0),
    }
}

impl fmt::Display for TypeDescriptor {
    /// Canonical spelling: equal descriptors render identically
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_name())?;
        let render = |v: u32| {
            if v == u32::MAX {
                "max".to_string()
            } else {
                v.to_string()
            }
        };
        match (self.length, self.precision, self.scale) {
            (Some(len), None, _) => write!(f, "({})", render(len)),
            (None, Some(p), Some(s)) => write!(f, "({},{})", render(p), render(s)),
            (None, Some(p), None) => write!(f, "({})", render(p)),
            (Some(len), Some(p), _) => write!(f, "({},{})", render(len), render(p)),
            _ => Ok(()),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
