//! # Sale Service
//!
//! Confirmation goes through the storage-agnostic [`SaleEngine`] wired to
//! the transactional `SaleRepository`; reads (history, one sale, receipt)
//! go straight to the repository with the caller's scope applied.
//!
//! ```text
//! POST /sales/confirm
//!      │
//!      ▼
//! SaleEngine::confirm ── cart_lines ── live_variant × N ── plan ── commit_sale
//!                                                                     │
//!                                           BEGIN … guarded UPDATE … COMMIT
//! ```

use std::sync::Arc;

use pharma_core::sale::{ConfirmedSale, SaleEngine};
use pharma_core::{
    authorize, Caller, CoreError, CoreResult, Operation, Page, Receipt, Sale, SaleDetails, Scope,
};
use pharma_db::Database;

#[derive(Clone)]
pub struct SaleService {
    db: Database,
    engine: SaleEngine,
}

impl SaleService {
    pub fn new(db: Database) -> Self {
        let engine = SaleEngine::new(Arc::new(db.sales()));
        SaleService { db, engine }
    }

    /// Turns the caller's whole cart into one sale.
    pub async fn confirm(&self, caller: &Caller) -> CoreResult<ConfirmedSale> {
        self.engine.confirm(caller).await
    }

    pub async fn list(&self, caller: &Caller, page: Page) -> CoreResult<Vec<Sale>> {
        let scope = authorize(caller, Operation::ViewSales)?;
        Ok(self.db.sales().list(scope.pharmacy_filter(), page).await?)
    }

    async fn load(&self, scope: &Scope, id: &str) -> CoreResult<Sale> {
        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        scope.ensure(&sale.pharmacy_id)?;
        Ok(sale)
    }

    pub async fn get(&self, caller: &Caller, id: &str) -> CoreResult<SaleDetails> {
        let scope = authorize(caller, Operation::ViewSales)?;
        let sale = self.load(&scope, id).await?;
        let items = self.db.sales().items(id).await?;
        Ok(SaleDetails { sale, items })
    }

    pub async fn receipt(&self, caller: &Caller, sale_id: &str) -> CoreResult<Receipt> {
        let scope = authorize(caller, Operation::ViewReceipt)?;
        self.load(&scope, sale_id).await?;

        self.db
            .sales()
            .receipt_for_sale(sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Receipt", sale_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cart_service::{AddToCart, CartService};
    use crate::testing;
    use pharma_core::Role;

    #[tokio::test]
    async fn test_owner_scenario_end_to_end() {
        let db = testing::db().await;
        let p1 = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p1.id)).await;
        let m = testing::medicine(&db, &p1.id, "Paracetamol").await;
        let v = testing::variant(&db, &m.id, "111", 1000, 5).await;

        let carts = CartService::new(db.clone());
        let sales = SaleService::new(db.clone());

        carts
            .add(
                &owner,
                AddToCart {
                    medicine_variant_id: v.id.clone(),
                    quantity: 3,
                },
            )
            .await
            .unwrap();

        let confirmed = sales.confirm(&owner).await.unwrap();
        let content = &confirmed.receipt.content;
        assert_eq!(content.total_price_cents, 3000);
        assert_eq!(content.items.len(), 1);
        assert_eq!(content.items[0].quantity, 3);
        assert_eq!(content.items[0].price_per_unit_cents, 1000);
        assert_eq!(content.items[0].subtotal_cents, 3000);

        let stock = db.variants().get_by_id(&v.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);
        assert!(carts.view(&owner).await.unwrap().items.is_empty());

        let details = sales.get(&owner, &confirmed.sale_id).await.unwrap();
        let sum: i64 = details.items.iter().map(|i| i.subtotal().cents()).sum();
        assert_eq!(sum, details.sale.total_price_cents);

        let receipt = sales.receipt(&owner, &confirmed.sale_id).await.unwrap();
        assert_eq!(receipt.id, confirmed.receipt.id);
        assert_eq!(receipt.content.items, confirmed.receipt.content.items);
    }

    #[tokio::test]
    async fn test_empty_cart_creates_nothing() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, pharmacist) = testing::user(&db, Role::Pharmacist, Some(&p.id)).await;
        let sales = SaleService::new(db);

        assert!(matches!(
            sales.confirm(&pharmacist).await,
            Err(CoreError::EmptyCart)
        ));
        assert!(sales
            .list(&pharmacist, Page::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_reads_are_scoped() {
        let db = testing::db().await;
        let p1 = testing::pharmacy(&db, "P1").await;
        let p2 = testing::pharmacy(&db, "P2").await;
        let (_, seller) = testing::user(&db, Role::Pharmacist, Some(&p1.id)).await;
        let (_, outsider) = testing::user(&db, Role::Owner, Some(&p2.id)).await;
        let m = testing::medicine(&db, &p1.id, "Paracetamol").await;
        let v = testing::variant(&db, &m.id, "111", 250, 10).await;

        CartService::new(db.clone())
            .add(
                &seller,
                AddToCart {
                    medicine_variant_id: v.id.clone(),
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        let sales = SaleService::new(db);
        let confirmed = sales.confirm(&seller).await.unwrap();

        assert!(matches!(
            sales.get(&outsider, &confirmed.sale_id).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            sales.receipt(&outsider, &confirmed.sale_id).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(sales.list(&outsider, Page::default()).await.unwrap().is_empty());

        let admin_view = sales.list(&testing::admin(), Page::default()).await.unwrap();
        assert_eq!(admin_view.len(), 1);

        assert!(matches!(
            sales.get(&seller, "missing").await,
            Err(CoreError::SaleNotFound(_))
        ));
    }
}
