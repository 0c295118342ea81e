//! Query types for the entity store abstraction layer.
//!
//! The core only needs equality, null and range predicates plus ordering on a
//! single field, so queries are plain data rather than a query language.
//! Backends translate them however they like (an in-memory scan, a SQL
//! `WHERE` clause, ...).

use time::OffsetDateTime;
use uuid::Uuid;

use crate::traits::Entity;

/// A field value as seen by filters and ordering.
///
/// `Null` stands for an absent optional field. Two `Null`s compare equal, so
/// an equality filter on `Null` matches only records where the field is
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    /// Absent value.
    Null,
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
    /// UUID value.
    Uuid(Uuid),
    /// Timestamp value.
    Timestamp(OffsetDateTime),
}

impl FieldValue {
    /// Returns `true` if this is `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if both values are non-null and of the same kind.
    fn comparable_with(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Int(_), Self::Int(_))
                | (Self::Text(_), Self::Text(_))
                | (Self::Uuid(_), Self::Uuid(_))
                | (Self::Timestamp(_), Self::Timestamp(_))
        )
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<OffsetDateTime> for FieldValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A single predicate over one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value (`Null` matches `Null`).
    Eq(&'static str, FieldValue),
    /// Field is absent.
    IsNull(&'static str),
    /// Field is present.
    NotNull(&'static str),
    /// Field is strictly greater than the value.
    Gt(&'static str, FieldValue),
    /// Field is greater than or equal to the value.
    Gte(&'static str, FieldValue),
    /// Field is strictly less than the value.
    Lt(&'static str, FieldValue),
    /// Field is less than or equal to the value.
    Lte(&'static str, FieldValue),
}

impl Filter {
    /// Creates an equality filter.
    #[must_use]
    pub fn eq(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::Eq(field, value.into())
    }

    /// Returns `true` if the entity satisfies this predicate.
    ///
    /// Range predicates never match when either side is `Null` or the kinds
    /// differ.
    #[must_use]
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        match self {
            Self::Eq(field, value) => entity.field(field) == *value,
            Self::IsNull(field) => entity.field(field).is_null(),
            Self::NotNull(field) => !entity.field(field).is_null(),
            Self::Gt(field, value) => range(entity, field, value, |a, b| a > b),
            Self::Gte(field, value) => range(entity, field, value, |a, b| a >= b),
            Self::Lt(field, value) => range(entity, field, value, |a, b| a < b),
            Self::Lte(field, value) => range(entity, field, value, |a, b| a <= b),
        }
    }
}

fn range<E: Entity>(
    entity: &E,
    field: &str,
    bound: &FieldValue,
    cmp: impl Fn(&FieldValue, &FieldValue) -> bool,
) -> bool {
    let actual = entity.field(field);
    actual.comparable_with(bound) && cmp(&actual, bound)
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

/// Ordering on a single field.
///
/// Backends break ties by insertion order in the same direction, so
/// `OrderBy::desc("inserted_at")` puts the most recently inserted record
/// first among records with equal timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to order by.
    pub field: &'static str,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

/// A conjunction of filters with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// All filters must match.
    pub filters: Vec<Filter>,
    /// Result ordering. Without it, results come back in insertion order.
    pub order: Option<OrderBy>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates an empty query matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the entity satisfies every filter.
    #[must_use]
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.filters.iter().all(|f| f.matches(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[derive(Debug, Clone)]
    struct Note {
        id: Uuid,
        owner: Option<Uuid>,
        body: String,
        at: OffsetDateTime,
    }

    impl Entity for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> Uuid {
            self.id
        }

        fn field(&self, name: &str) -> FieldValue {
            match name {
                "owner" => self.owner.into(),
                "body" => self.body.as_str().into(),
                "at" => self.at.into(),
                _ => FieldValue::Null,
            }
        }
    }

    fn note(owner: Option<Uuid>) -> Note {
        Note {
            id: Uuid::new_v4(),
            owner,
            body: "hello".to_string(),
            at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_eq_null_matches_only_null() {
        let anonymous = note(None);
        let owned = note(Some(Uuid::new_v4()));

        let filter = Filter::eq("owner", None::<Uuid>);
        assert!(filter.matches(&anonymous));
        assert!(!filter.matches(&owned));
    }

    #[test]
    fn test_null_predicates() {
        let anonymous = note(None);
        assert!(Filter::IsNull("owner").matches(&anonymous));
        assert!(!Filter::NotNull("owner").matches(&anonymous));
        assert!(Filter::IsNull("missing").matches(&anonymous));
    }

    #[test]
    fn test_range_predicates() {
        let n = note(None);
        let earlier = n.at - Duration::seconds(5);
        assert!(Filter::Gt("at", earlier.into()).matches(&n));
        assert!(Filter::Gte("at", n.at.into()).matches(&n));
        assert!(!Filter::Lt("at", n.at.into()).matches(&n));
        assert!(Filter::Lte("at", n.at.into()).matches(&n));
    }

    #[test]
    fn test_range_ignores_mismatched_kinds() {
        let n = note(None);
        assert!(!Filter::Gt("at", FieldValue::Int(0)).matches(&n));
        assert!(!Filter::Lt("owner", FieldValue::Null).matches(&n));
    }

    #[test]
    fn test_query_is_conjunction() {
        let owner = Uuid::new_v4();
        let n = note(Some(owner));

        let query = Query::new()
            .filter(Filter::eq("owner", owner))
            .filter(Filter::eq("body", "hello"));
        assert!(query.matches(&n));

        let query = query.filter(Filter::eq("body", "bye"));
        assert!(!query.matches(&n));
        assert!(Query::new().matches(&n));
    }
}
