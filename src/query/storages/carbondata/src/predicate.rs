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

//! Engine side predicate model: per column value domains combined into a
//! [`TupleDomain`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde::Serialize;

pub type F64 = OrderedFloat<f64>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    /// All integral widths, widened to 64 bits.
    Integer,
    Double,
    Decimal { precision: u8, scale: u8 },
    String,
    Date,
    Timestamp,
    Binary,
    Array(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Struct(Vec<(String, ColumnType)>),
}

impl ColumnType {
    /// Whether the storage format can evaluate filters on this type.
    pub fn has_native_filter(&self) -> bool {
        !matches!(
            self,
            ColumnType::Binary | ColumnType::Array(_) | ColumnType::Map(_, _) | ColumnType::Struct(_)
        )
    }

    pub fn accepts(&self, scalar: &Scalar) -> bool {
        matches!(
            (self, scalar),
            (ColumnType::Boolean, Scalar::Boolean(_))
                | (ColumnType::Integer, Scalar::Int(_))
                | (ColumnType::Double, Scalar::Double(_))
                | (ColumnType::Decimal { .. }, Scalar::Decimal(_))
                | (ColumnType::String, Scalar::String(_))
                | (ColumnType::Date, Scalar::Date(_))
                | (ColumnType::Timestamp, Scalar::Timestamp(_))
        )
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Integer => write!(f, "bigint"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            ColumnType::String => write!(f, "varchar"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Binary => write!(f, "varbinary"),
            ColumnType::Array(inner) => write!(f, "array({inner})"),
            ColumnType::Map(key, value) => write!(f, "map({key},{value})"),
            ColumnType::Struct(fields) => {
                write!(f, "row(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A single non-null value.
///
/// `Date` is days since epoch, `Timestamp` microseconds since epoch and
/// `Decimal` the unscaled value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scalar {
    Boolean(bool),
    Int(i64),
    Double(F64),
    Decimal(i128),
    String(String),
    Date(i32),
    Timestamp(i64),
}

impl Scalar {
    /// Compares two values of the same kind, `None` for values of different kinds.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Boolean(a), Scalar::Boolean(b)) => Some(a.cmp(b)),
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Double(a), Scalar::Double(b)) => Some(a.cmp(b)),
            (Scalar::Decimal(a), Scalar::Decimal(b)) => Some(a.cmp(b)),
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Stable byte encoding used to probe existence filters.
    pub fn existence_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(17);
        match self {
            Scalar::Boolean(v) => {
                key.push(0);
                key.push(*v as u8);
            }
            Scalar::Int(v) => {
                key.push(1);
                key.extend_from_slice(&v.to_le_bytes());
            }
            Scalar::Double(v) => {
                key.push(2);
                // Equal doubles share one key: -0.0 folds into 0.0, every NaN into one NaN.
                let v = if v.0.is_nan() {
                    f64::NAN
                } else if v.0 == 0.0 {
                    0.0
                } else {
                    v.0
                };
                key.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            Scalar::Decimal(v) => {
                key.push(3);
                key.extend_from_slice(&v.to_le_bytes());
            }
            Scalar::String(v) => {
                key.push(4);
                key.extend_from_slice(v.as_bytes());
            }
            Scalar::Date(v) => {
                key.push(5);
                key.extend_from_slice(&v.to_le_bytes());
            }
            Scalar::Timestamp(v) => {
                key.push(6);
                key.extend_from_slice(&v.to_le_bytes());
            }
        }
        key
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Double(v) => write!(f, "{v}"),
            Scalar::Decimal(v) => write!(f, "{v}"),
            Scalar::String(v) => write!(f, "'{v}'"),
            Scalar::Date(v) => write!(f, "DATE {v}"),
            Scalar::Timestamp(v) => write!(f, "TIMESTAMP {v}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnKind {
    Regular,
    PartitionKey,
    /// Hidden columns such as `$path`, computed by the engine.
    Synthesized,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HiveColumnHandle {
    pub name: String,
    pub column_type: ColumnType,
    pub kind: ColumnKind,
}

impl HiveColumnHandle {
    pub fn regular(name: impl Into<String>, column_type: ColumnType) -> Self {
        HiveColumnHandle {
            name: name.into(),
            column_type,
            kind: ColumnKind::Regular,
        }
    }

    pub fn partition_key(name: impl Into<String>, column_type: ColumnType) -> Self {
        HiveColumnHandle {
            name: name.into(),
            column_type,
            kind: ColumnKind::PartitionKey,
        }
    }

    pub fn synthesized(name: impl Into<String>, column_type: ColumnType) -> Self {
        HiveColumnHandle {
            name: name.into(),
            column_type,
            kind: ColumnKind::Synthesized,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Unbounded,
    Included(Scalar),
    Excluded(Scalar),
}

impl Bound {
    fn value(&self) -> Option<&Scalar> {
        match self {
            Bound::Unbounded => None,
            Bound::Included(v) | Bound::Excluded(v) => Some(v),
        }
    }
}

/// A contiguous interval of non-null values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub low: Bound,
    pub high: Bound,
}

impl Range {
    pub fn all() -> Self {
        Range {
            low: Bound::Unbounded,
            high: Bound::Unbounded,
        }
    }

    pub fn equal(value: Scalar) -> Self {
        Range {
            low: Bound::Included(value.clone()),
            high: Bound::Included(value),
        }
    }

    pub fn greater_than(value: Scalar) -> Self {
        Range {
            low: Bound::Excluded(value),
            high: Bound::Unbounded,
        }
    }

    pub fn greater_than_or_equal(value: Scalar) -> Self {
        Range {
            low: Bound::Included(value),
            high: Bound::Unbounded,
        }
    }

    pub fn less_than(value: Scalar) -> Self {
        Range {
            low: Bound::Unbounded,
            high: Bound::Excluded(value),
        }
    }

    pub fn less_than_or_equal(value: Scalar) -> Self {
        Range {
            low: Bound::Unbounded,
            high: Bound::Included(value),
        }
    }

    /// Closed interval `[low, high]`.
    pub fn between(low: Scalar, high: Scalar) -> Self {
        Range {
            low: Bound::Included(low),
            high: Bound::Included(high),
        }
    }

    pub fn is_all(&self) -> bool {
        self.low == Bound::Unbounded && self.high == Bound::Unbounded
    }

    pub fn single_value(&self) -> Option<&Scalar> {
        match (&self.low, &self.high) {
            (Bound::Included(low), Bound::Included(high)) if low == high => Some(low),
            _ => None,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.low.value().into_iter().chain(self.high.value())
    }

    /// `None` when the bounds cannot be compared, `Some(None)` when the
    /// intersection is empty.
    pub fn intersect(&self, other: &Range) -> Option<Option<Range>> {
        let low = match (&self.low, &other.low) {
            (Bound::Unbounded, b) | (b, Bound::Unbounded) => b.clone(),
            (a, b) => match a.value()?.compare(b.value()?)? {
                Ordering::Greater => a.clone(),
                Ordering::Less => b.clone(),
                Ordering::Equal => tighter(a, b),
            },
        };
        let high = match (&self.high, &other.high) {
            (Bound::Unbounded, b) | (b, Bound::Unbounded) => b.clone(),
            (a, b) => match a.value()?.compare(b.value()?)? {
                Ordering::Less => a.clone(),
                Ordering::Greater => b.clone(),
                Ordering::Equal => tighter(a, b),
            },
        };

        if let (Some(l), Some(h)) = (low.value(), high.value()) {
            let empty = match l.compare(h)? {
                Ordering::Greater => true,
                Ordering::Equal => {
                    !matches!((&low, &high), (Bound::Included(_), Bound::Included(_)))
                }
                Ordering::Less => false,
            };
            if empty {
                return Some(None);
            }
        }
        Some(Some(Range { low, high }))
    }
}

fn intersect_ranges(a: &[Range], b: &[Range]) -> Option<Vec<Range>> {
    let mut ranges = vec![];
    for x in a {
        for y in b {
            if let Some(range) = x.intersect(y)? {
                ranges.push(range);
            }
        }
    }
    Some(ranges)
}

// Of two bounds on the same value, the excluding one.
fn tighter(a: &Bound, b: &Bound) -> Bound {
    match a {
        Bound::Excluded(_) => a.clone(),
        _ => b.clone(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSet {
    /// Every non-null value.
    All,
    /// No non-null value.
    None,
    /// Union of ranges.
    Ranges(Vec<Range>),
    /// Every non-null value except the listed ones.
    Excluded(Vec<Scalar>),
}

/// The values a column may take, plus whether it may be null.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub values: ValueSet,
    pub null_allowed: bool,
}

impl Domain {
    pub fn create(values: ValueSet, null_allowed: bool) -> Self {
        let values = match values {
            ValueSet::Ranges(ranges) if ranges.is_empty() => ValueSet::None,
            ValueSet::Ranges(ranges) if ranges.iter().any(Range::is_all) => ValueSet::All,
            other => other,
        };
        Domain {
            values,
            null_allowed,
        }
    }

    pub fn all() -> Self {
        Domain::create(ValueSet::All, true)
    }

    pub fn none() -> Self {
        Domain::create(ValueSet::None, false)
    }

    pub fn only_null() -> Self {
        Domain::create(ValueSet::None, true)
    }

    pub fn not_null() -> Self {
        Domain::create(ValueSet::All, false)
    }

    pub fn single_value(value: Scalar) -> Self {
        Domain::create(ValueSet::Ranges(vec![Range::equal(value)]), false)
    }

    pub fn multiple_values(values: impl IntoIterator<Item = Scalar>) -> Self {
        let ranges = values.into_iter().map(Range::equal).collect();
        Domain::create(ValueSet::Ranges(ranges), false)
    }

    pub fn from_ranges(ranges: Vec<Range>, null_allowed: bool) -> Self {
        Domain::create(ValueSet::Ranges(ranges), null_allowed)
    }

    /// Values allowed by both domains. Ranges that cannot be compared
    /// keep the left side, which still contains the exact intersection.
    pub fn intersect(&self, other: &Domain) -> Domain {
        let values = match (&self.values, &other.values) {
            (ValueSet::None, _) | (_, ValueSet::None) => ValueSet::None,
            (ValueSet::All, v) | (v, ValueSet::All) => v.clone(),
            (ValueSet::Ranges(a), ValueSet::Ranges(b)) => {
                ValueSet::Ranges(intersect_ranges(a, b).unwrap_or_else(|| a.clone()))
            }
            (ValueSet::Ranges(ranges), ValueSet::Excluded(excluded))
            | (ValueSet::Excluded(excluded), ValueSet::Ranges(ranges)) => ValueSet::Ranges(
                ranges
                    .iter()
                    .filter(|r| r.single_value().map_or(true, |v| !excluded.contains(v)))
                    .cloned()
                    .collect(),
            ),
            (ValueSet::Excluded(a), ValueSet::Excluded(b)) => {
                let mut excluded = a.clone();
                for v in b {
                    if !excluded.contains(v) {
                        excluded.push(v.clone());
                    }
                }
                ValueSet::Excluded(excluded)
            }
        };
        Domain::create(values, self.null_allowed && other.null_allowed)
    }

    pub fn is_all(&self) -> bool {
        self.values == ValueSet::All && self.null_allowed
    }

    pub fn is_none(&self) -> bool {
        self.values == ValueSet::None && !self.null_allowed
    }

    pub fn is_only_null(&self) -> bool {
        self.values == ValueSet::None && self.null_allowed
    }
}

/// Conjunction of column domains.
///
/// `domains == None` matches nothing, an empty map matches everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleDomain {
    domains: Option<BTreeMap<HiveColumnHandle, Domain>>,
}

impl TupleDomain {
    pub fn all() -> Self {
        TupleDomain {
            domains: Some(BTreeMap::new()),
        }
    }

    pub fn none() -> Self {
        TupleDomain { domains: None }
    }

    /// Collapses to [`TupleDomain::none`] when any column domain is empty,
    /// unconstrained columns are dropped. Domains of a repeated column are
    /// intersected.
    pub fn with_column_domains(domains: impl IntoIterator<Item = (HiveColumnHandle, Domain)>) -> Self {
        let mut kept: BTreeMap<HiveColumnHandle, Domain> = BTreeMap::new();
        for (column, domain) in domains {
            let domain = match kept.remove(&column) {
                Some(previous) => previous.intersect(&domain),
                None => domain,
            };
            if domain.is_none() {
                return TupleDomain::none();
            }
            if !domain.is_all() {
                kept.insert(column, domain);
            }
        }
        TupleDomain {
            domains: Some(kept),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(&self.domains, Some(domains) if domains.is_empty())
    }

    pub fn is_none(&self) -> bool {
        self.domains.is_none()
    }

    pub fn domains(&self) -> Option<&BTreeMap<HiveColumnHandle, Domain>> {
        self.domains.as_ref()
    }
}
