use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Listing parameters for `getUsers` / `getRoles`. Unset fields are left to
/// the service's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
}

impl PageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(field.into());
        self.order = Some(order);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter
            .get_or_insert_with(Map::new)
            .insert(field.into(), value.into());
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        u64::from(self.page.max(1)) * u64::from(self.limit) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_query_serializes_to_empty_object() {
        assert_eq!(serde_json::to_value(PageQuery::new()).unwrap(), json!({}));
    }

    #[test]
    fn builder_fills_query() {
        let query = PageQuery::new()
            .page(2)
            .limit(25)
            .sort_by("name", SortOrder::Desc)
            .filter("active", true);

        assert_eq!(
            serde_json::to_value(query).unwrap(),
            json!({"page": 2, "limit": 25, "sort": "name", "order": "desc", "filter": {"active": true}})
        );
    }

    #[test]
    fn has_more_compares_against_total() {
        let page: Paginated<u8> = serde_json::from_value(json!({
            "items": [1, 2], "total": 5, "page": 1, "limit": 2
        }))
        .unwrap();
        assert!(page.has_more());

        let last = Paginated { page: 3, ..page };
        assert!(!last.has_more());
    }
}
