//! Order query service: hospital prescription orders routed to pharmacies.
//! Read-only; every role can read, non-admins only their own pharmacy.

use pharma_core::{
    authorize, Caller, CoreError, CoreResult, Operation, OrderDetails, OrderSummary, Page,
};
use pharma_db::Database;

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    pub async fn list(&self, caller: &Caller, page: Page) -> CoreResult<Vec<OrderSummary>> {
        let scope = authorize(caller, Operation::ViewOrders)?;
        Ok(self.db.orders().list(scope.pharmacy_filter(), page).await?)
    }

    pub async fn details(&self, caller: &Caller, id: &str) -> CoreResult<OrderDetails> {
        let scope = authorize(caller, Operation::ViewOrders)?;

        let details = self
            .db
            .orders()
            .details(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
        scope.ensure(&details.pharmacy_id)?;

        Ok(details)
    }
}
