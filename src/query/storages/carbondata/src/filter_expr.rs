// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::predicate::ColumnType;
use crate::predicate::Scalar;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    pub data_type: ColumnType,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        ColumnRef {
            name: name.into(),
            data_type,
        }
    }
}

/// Filter tree understood by the carbon block reader.
///
/// It is shipped to workers inside every split, so the serialized shape is
/// part of the split contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    True,
    False,
    Equals { column: ColumnRef, value: Scalar },
    In { column: ColumnRef, values: Vec<Scalar> },
    GreaterThan { column: ColumnRef, value: Scalar },
    GreaterThanEqual { column: ColumnRef, value: Scalar },
    LessThan { column: ColumnRef, value: Scalar },
    LessThanEqual { column: ColumnRef, value: Scalar },
    IsNull { column: ColumnRef },
    IsNotNull { column: ColumnRef },
    And { children: Vec<FilterExpr> },
    Or { children: Vec<FilterExpr> },
}

impl FilterExpr {
    /// Conjunction with constant folding: `True` children are dropped, any
    /// `False` child makes the whole expression `False`.
    pub fn and(children: impl IntoIterator<Item = FilterExpr>) -> FilterExpr {
        let mut kept = Vec::new();
        for child in children {
            match child {
                FilterExpr::True => {}
                FilterExpr::False => return FilterExpr::False,
                FilterExpr::And { children } => kept.extend(children),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => FilterExpr::True,
            1 => kept.remove(0),
            _ => FilterExpr::And { children: kept },
        }
    }

    /// Disjunction with constant folding, the dual of [`FilterExpr::and`].
    pub fn or(children: impl IntoIterator<Item = FilterExpr>) -> FilterExpr {
        let mut kept = Vec::new();
        for child in children {
            match child {
                FilterExpr::False => {}
                FilterExpr::True => return FilterExpr::True,
                FilterExpr::Or { children } => kept.extend(children),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => FilterExpr::False,
            1 => kept.remove(0),
            _ => FilterExpr::Or { children: kept },
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, FilterExpr::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, FilterExpr::False)
    }

    /// Names of all columns the expression refers to.
    pub fn columns(&self) -> BTreeSet<&str> {
        let mut columns = BTreeSet::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, columns: &mut BTreeSet<&'a str>) {
        match self {
            FilterExpr::True | FilterExpr::False => {}
            FilterExpr::Equals { column, .. }
            | FilterExpr::In { column, .. }
            | FilterExpr::GreaterThan { column, .. }
            | FilterExpr::GreaterThanEqual { column, .. }
            | FilterExpr::LessThan { column, .. }
            | FilterExpr::LessThanEqual { column, .. }
            | FilterExpr::IsNull { column }
            | FilterExpr::IsNotNull { column } => {
                columns.insert(column.name.as_str());
            }
            FilterExpr::And { children } | FilterExpr::Or { children } => {
                children.iter().for_each(|c| c.collect_columns(columns));
            }
        }
    }
}

impl Display for FilterExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::True => write!(f, "true"),
            FilterExpr::False => write!(f, "false"),
            FilterExpr::Equals { column, value } => write!(f, "{} = {}", column.name, value),
            FilterExpr::In { column, values } => {
                write!(f, "{} IN (", column.name)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
            FilterExpr::GreaterThan { column, value } => write!(f, "{} > {}", column.name, value),
            FilterExpr::GreaterThanEqual { column, value } => {
                write!(f, "{} >= {}", column.name, value)
            }
            FilterExpr::LessThan { column, value } => write!(f, "{} < {}", column.name, value),
            FilterExpr::LessThanEqual { column, value } => {
                write!(f, "{} <= {}", column.name, value)
            }
            FilterExpr::IsNull { column } => write!(f, "{} IS NULL", column.name),
            FilterExpr::IsNotNull { column } => write!(f, "{} IS NOT NULL", column.name),
            FilterExpr::And { children } => write_joined(f, children, " AND "),
            FilterExpr::Or { children } => write_joined(f, children, " OR "),
        }
    }
}

fn write_joined(f: &mut Formatter<'_>, children: &[FilterExpr], separator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}
