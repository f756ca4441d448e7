use std::collections::HashMap;

use crate::rtree::RecordId;

/// A post-filter applied to candidate records after the spatial search.
///
/// Implemented for closures, so ad-hoc filters can be passed directly:
///
/// ```
/// use geo_rtree::query::RecordFilter;
///
/// let even = |id: u64| id % 2 == 0;
/// assert!(even.accept(4));
/// assert!(!even.accept(5));
/// ```
pub trait RecordFilter {
    fn accept(&self, id: RecordId) -> bool;
}

impl<F: Fn(RecordId) -> bool> RecordFilter for F {
    fn accept(&self, id: RecordId) -> bool {
        self(id)
    }
}

/// A filter that keeps every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl RecordFilter for AcceptAll {
    #[inline]
    fn accept(&self, _id: RecordId) -> bool {
        true
    }
}

/// The non-spatial attributes of a property listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordAttributes {
    pub price: f64,
    pub bedrooms: u32,
    /// For example `"House"`, `"Apartment"` or `"Condo"`.
    pub property_type: String,
}

/// Lookup of record attributes by id. The tree itself only stores geometry and ids; callers
/// keep the rest of the record and expose it through this trait.
pub trait AttributeSource {
    fn attributes(&self, id: RecordId) -> Option<&RecordAttributes>;
}

impl AttributeSource for HashMap<RecordId, RecordAttributes> {
    fn attributes(&self, id: RecordId) -> Option<&RecordAttributes> {
        self.get(&id)
    }
}

/// Attribute criteria for property searches. Every bound is optional and inclusive; an
/// empty filter matches every record that has attributes.
///
/// ```
/// use std::collections::HashMap;
/// use geo_rtree::query::{AttributeFilter, RecordAttributes, RecordFilter};
///
/// let mut listings: HashMap<u64, RecordAttributes> = HashMap::new();
/// listings.insert(1, RecordAttributes { price: 250_000., bedrooms: 2, property_type: "Condo".into() });
/// listings.insert(2, RecordAttributes { price: 900_000., bedrooms: 4, property_type: "House".into() });
///
/// let criteria = AttributeFilter::new().max_price(500_000.).min_bedrooms(2);
/// let filter = criteria.with_source(&listings);
/// assert!(filter.accept(1));
/// assert!(!filter.accept(2));
/// assert!(!filter.accept(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeFilter {
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_bedrooms: Option<u32>,
    max_bedrooms: Option<u32>,
    property_type: Option<String>,
}

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_price(mut self, price: f64) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn min_bedrooms(mut self, bedrooms: u32) -> Self {
        self.min_bedrooms = Some(bedrooms);
        self
    }

    pub fn max_bedrooms(mut self, bedrooms: u32) -> Self {
        self.max_bedrooms = Some(bedrooms);
        self
    }

    /// Only keep records of this property type. Compared case-insensitively.
    pub fn property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    /// Whether `attributes` satisfies every configured bound.
    pub fn matches(&self, attributes: &RecordAttributes) -> bool {
        if self.min_price.is_some_and(|min| attributes.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| attributes.price > max) {
            return false;
        }
        if self.min_bedrooms.is_some_and(|min| attributes.bedrooms < min) {
            return false;
        }
        if self.max_bedrooms.is_some_and(|max| attributes.bedrooms > max) {
            return false;
        }
        match &self.property_type {
            Some(kind) => attributes.property_type.eq_ignore_ascii_case(kind),
            None => true,
        }
    }

    /// Bind these criteria to an attribute source, producing a [`RecordFilter`]. Records the
    /// source knows nothing about are rejected.
    pub fn with_source<'a, S: AttributeSource + ?Sized>(
        &'a self,
        source: &'a S,
    ) -> SourceFilter<'a, S> {
        SourceFilter {
            criteria: self,
            source,
        }
    }
}

/// An [`AttributeFilter`] bound to the [`AttributeSource`] it reads from.
#[derive(Debug)]
pub struct SourceFilter<'a, S: ?Sized> {
    criteria: &'a AttributeFilter,
    source: &'a S,
}

impl<S: AttributeSource + ?Sized> RecordFilter for SourceFilter<'_, S> {
    fn accept(&self, id: RecordId) -> bool {
        self.source
            .attributes(id)
            .is_some_and(|attributes| self.criteria.matches(attributes))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn listing(price: f64, bedrooms: u32, property_type: &str) -> RecordAttributes {
        RecordAttributes {
            price,
            bedrooms,
            property_type: property_type.to_string(),
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let filter = AttributeFilter::new()
            .min_price(100.)
            .max_price(200.)
            .min_bedrooms(1)
            .max_bedrooms(3);
        assert!(filter.matches(&listing(100., 1, "House")));
        assert!(filter.matches(&listing(200., 3, "House")));
        assert!(!filter.matches(&listing(99.99, 2, "House")));
        assert!(!filter.matches(&listing(150., 4, "House")));
    }

    #[test]
    fn property_type_ignores_case() {
        let filter = AttributeFilter::new().property_type("condo");
        assert!(filter.matches(&listing(1., 1, "Condo")));
        assert!(!filter.matches(&listing(1., 1, "House")));
    }

    #[test]
    fn empty_filter_needs_attributes() {
        let source: HashMap<RecordId, RecordAttributes> =
            [(1, listing(1., 1, "House"))].into_iter().collect();
        let criteria = AttributeFilter::new();
        let filter = criteria.with_source(&source);
        assert!(filter.accept(1));
        assert!(!filter.accept(2));
        assert!(AcceptAll.accept(2));
    }
}
