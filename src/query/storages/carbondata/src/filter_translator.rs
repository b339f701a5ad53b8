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

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use log::warn;

use crate::filter_expr::ColumnRef;
use crate::filter_expr::FilterExpr;
use crate::predicate::Bound;
use crate::predicate::ColumnKind;
use crate::predicate::ColumnType;
use crate::predicate::Domain;
use crate::predicate::HiveColumnHandle;
use crate::predicate::Range;
use crate::predicate::Scalar;
use crate::predicate::TupleDomain;
use crate::predicate::ValueSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterTranslation {
    pub filter: FilterExpr,
    /// Columns whose constraint could not be expressed and was replaced by `true`.
    pub degraded_columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Unsupported {
    ColumnType(ColumnType),
    SynthesizedColumn,
    TypeMismatch(Scalar),
    ExcludedValues,
}

impl Display for Unsupported {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::ColumnType(ty) => write!(f, "type {ty} has no native filter"),
            Unsupported::SynthesizedColumn => write!(f, "column is synthesized by the engine"),
            Unsupported::TypeMismatch(value) => write!(f, "value {value} does not match the column type"),
            Unsupported::ExcludedValues => write!(f, "exclusion sets are not supported"),
        }
    }
}

/// Translates engine predicates into carbon filter expressions.
///
/// Translation never fails. A column constraint that cannot be expressed
/// becomes `true`, which keeps every block, so the result is always a
/// superset of the exact answer.
pub struct FilterTranslator;

impl FilterTranslator {
    pub fn translate(predicate: &TupleDomain) -> FilterTranslation {
        let Some(domains) = predicate.domains() else {
            return FilterTranslation {
                filter: FilterExpr::False,
                degraded_columns: vec![],
            };
        };

        let mut conjuncts = Vec::with_capacity(domains.len());
        let mut degraded_columns = vec![];
        for (column, domain) in domains {
            match translate_domain(column, domain) {
                Ok(expr) => conjuncts.push(expr),
                Err(reason) => {
                    warn!(
                        "predicate on column {} is not pushed down to carbon: {}",
                        column.name, reason
                    );
                    degraded_columns.push(column.name.clone());
                }
            }
        }

        FilterTranslation {
            filter: FilterExpr::and(conjuncts),
            degraded_columns,
        }
    }
}

pub fn translate(predicate: &TupleDomain) -> FilterExpr {
    FilterTranslator::translate(predicate).filter
}

fn translate_domain(
    column: &HiveColumnHandle,
    domain: &Domain,
) -> std::result::Result<FilterExpr, Unsupported> {
    if column.kind == ColumnKind::Synthesized {
        return Err(Unsupported::SynthesizedColumn);
    }
    if !column.column_type.has_native_filter() {
        return Err(Unsupported::ColumnType(column.column_type.clone()));
    }

    let col = ColumnRef::new(column.name.clone(), column.column_type.clone());
    let values = match &domain.values {
        ValueSet::None => FilterExpr::False,
        ValueSet::All if domain.null_allowed => return Ok(FilterExpr::True),
        ValueSet::All => return Ok(FilterExpr::IsNotNull { column: col }),
        ValueSet::Excluded(_) => return Err(Unsupported::ExcludedValues),
        ValueSet::Ranges(ranges) => translate_ranges(&col, ranges)?,
    };

    if domain.null_allowed {
        Ok(FilterExpr::or([values, FilterExpr::IsNull { column: col }]))
    } else {
        Ok(values)
    }
}

fn translate_ranges(
    col: &ColumnRef,
    ranges: &[Range],
) -> std::result::Result<FilterExpr, Unsupported> {
    let mut singles: Vec<Scalar> = vec![];
    let mut disjuncts = vec![];

    for range in ranges {
        if let Some(value) = range.values().find(|v| !col.data_type.accepts(v)) {
            return Err(Unsupported::TypeMismatch(value.clone()));
        }

        if let Some(value) = range.single_value() {
            if !singles.contains(value) {
                singles.push(value.clone());
            }
            continue;
        }

        let low = match &range.low {
            Bound::Unbounded => FilterExpr::True,
            Bound::Included(value) => FilterExpr::GreaterThanEqual {
                column: col.clone(),
                value: value.clone(),
            },
            Bound::Excluded(value) => FilterExpr::GreaterThan {
                column: col.clone(),
                value: value.clone(),
            },
        };
        let high = match &range.high {
            Bound::Unbounded => FilterExpr::True,
            Bound::Included(value) => FilterExpr::LessThanEqual {
                column: col.clone(),
                value: value.clone(),
            },
            Bound::Excluded(value) => FilterExpr::LessThan {
                column: col.clone(),
                value: value.clone(),
            },
        };
        disjuncts.push(FilterExpr::and([low, high]));
    }

    match singles.len() {
        0 => {}
        1 => disjuncts.insert(0, FilterExpr::Equals {
            column: col.clone(),
            value: singles.remove(0),
        }),
        _ => disjuncts.insert(0, FilterExpr::In {
            column: col.clone(),
            values: singles,
        }),
    }

    Ok(FilterExpr::or(disjuncts))
}
