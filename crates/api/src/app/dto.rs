use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, ProductId, parse_id_list};
use stockflow_orders::OrderWithDetails;

// -------------------------
// Request DTOs
// -------------------------

/// `?product_ids=1,2,3`
#[derive(Debug, Default, Deserialize)]
pub struct ActiveStockQuery {
    #[serde(default)]
    pub product_ids: String,
}

impl ActiveStockQuery {
    pub fn product_ids(&self) -> Result<Vec<ProductId>, DomainError> {
        parse_id_list(&self.product_ids)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedOrderResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub order: OrderWithDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_query_accepts_comma_lists() {
        let query = ActiveStockQuery {
            product_ids: "3,1".into(),
        };
        assert_eq!(query.product_ids().unwrap(), vec![ProductId::new(3), ProductId::new(1)]);
        assert!(ActiveStockQuery::default().product_ids().unwrap().is_empty());

        let bad = ActiveStockQuery {
            product_ids: "1,abc".into(),
        };
        assert!(matches!(bad.product_ids(), Err(DomainError::InvalidRequest(_))));
    }
}
