/// Specifies the direction for sorting catalog entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Sort from smallest to largest value (null first)
    Ascending,
    /// Sort from largest to smallest value (null last)
    Descending,
}

/// One sort criterion: a property path and its direction.
///
/// Lists of `SortBy` are applied in declared precedence order, the first
/// entry being the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortBy {
    property: String,
    order: SortOrder,
}

impl SortBy {
    pub fn new(property: &str, order: SortOrder) -> Self {
        SortBy {
            property: property.to_string(),
            order,
        }
    }

    pub fn asc(property: &str) -> Self {
        SortBy::new(property, SortOrder::Ascending)
    }

    pub fn desc(property: &str) -> Self {
        SortBy::new(property, SortOrder::Descending)
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    #[inline]
    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Descending
    }
}
