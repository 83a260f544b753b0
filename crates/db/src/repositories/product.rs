//! Product and product category repository.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tala_core::carat::validate_carat;
use tala_core::ledger::LedgerError;
use tala_core::trade::{BaseCategory, ProductProfile};
use tala_shared::types::{CategoryId, ProductId};
use tracing::{info, instrument};

use super::unit_of_work::lock_products;
use crate::entities::{
    inventory_ledger, physical_settlement_items, product_categories, products, transaction_items,
};
use crate::error::RepositoryError;

/// Input for creating a product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCategoryInput {
    /// Display name.
    pub name: String,
    /// Base category deciding how items are measured.
    pub base_category: BaseCategory,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductInput {
    /// Display name.
    pub name: String,
    /// Owning category.
    pub category_id: CategoryId,
    /// Carat suggested for new items.
    pub default_carat: Option<i32>,
}

/// Product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a product category.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<product_categories::Model, RepositoryError> {
        let category = product_categories::ActiveModel {
            name: Set(input.name),
            base_category: Set(input.base_category.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(category_id = category.id, base_category = %input.base_category, "category created");
        Ok(category)
    }

    /// Every category ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<product_categories::Model>, RepositoryError> {
        Ok(product_categories::Entity::find()
            .order_by_asc(product_categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` for an unknown category, `InvalidCarat` for
    /// an out-of-range default carat, or a database error.
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<products::Model, RepositoryError> {
        if let Some(carat) = input.default_carat {
            validate_carat(carat)?;
        }
        product_categories::Entity::find_by_id(input.category_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::CategoryNotFound(input.category_id))?;

        let product = products::ActiveModel {
            name: Set(input.name),
            product_category_id: Set(input.category_id.into_inner()),
            default_carat: Set(input.default_carat),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(product_id = product.id, "product created");
        Ok(product)
    }

    /// Finds a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(
        &self,
        product_id: ProductId,
    ) -> Result<Option<products::Model>, RepositoryError> {
        Ok(products::Entity::find_by_id(product_id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Products ordered by name, optionally only active ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_products(
        &self,
        active_only: bool,
    ) -> Result<Vec<products::Model>, RepositoryError> {
        let mut query = products::Entity::find();
        if active_only {
            query = query.filter(products::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(products::Column::Name)
            .order_by_asc(products::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Name and category of each requested product that exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn profiles(
        &self,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> Result<HashMap<ProductId, ProductProfile>, RepositoryError> {
        Ok(load_profiles(&self.db, ids).await?)
    }

    /// Deletes a product that nothing references.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for an unknown id and `Conflict` when
    /// transaction items, settlement items or inventory movements still
    /// reference the product.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        if lock_products(&txn, [product_id]).await?.is_empty() {
            return Err(LedgerError::ProductNotFound(product_id).into());
        }
        let id = product_id.into_inner();

        let items = transaction_items::Entity::find()
            .filter(transaction_items::Column::ProductId.eq(id))
            .count(&txn)
            .await?;
        if items > 0 {
            return Err(in_use(product_id, format!("{items} transaction item(s) reference it")));
        }

        let settlement_items = physical_settlement_items::Entity::find()
            .filter(physical_settlement_items::Column::ProductId.eq(id))
            .count(&txn)
            .await?;
        if settlement_items > 0 {
            return Err(in_use(
                product_id,
                format!("{settlement_items} settlement item(s) reference it"),
            ));
        }

        let movements = inventory_ledger::Entity::find()
            .filter(inventory_ledger::Column::ProductId.eq(id))
            .count(&txn)
            .await?;
        if movements > 0 {
            return Err(in_use(product_id, format!("{movements} inventory movement(s) reference it")));
        }

        products::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(%product_id, "product deleted");
        Ok(())
    }
}

fn in_use(product_id: ProductId, reason: String) -> RepositoryError {
    LedgerError::Conflict {
        entity: format!("product {product_id}"),
        reason,
    }
    .into()
}

/// Profiles of the requested products; unknown ids are left out.
pub(crate) async fn load_profiles<C: ConnectionTrait>(
    conn: &C,
    ids: impl IntoIterator<Item = ProductId>,
) -> Result<HashMap<ProductId, ProductProfile>, DbErr> {
    let ids: BTreeSet<i32> = ids.into_iter().map(ProductId::into_inner).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = products::Entity::find()
        .filter(products::Column::Id.is_in(ids))
        .find_also_related(product_categories::Entity)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(product, category)| {
            let category = category?;
            let product_id = ProductId::new(product.id);
            Some((
                product_id,
                ProductProfile {
                    product_id,
                    name: product.name,
                    category_id: CategoryId::new(category.id),
                    base_category: category.base_category.into(),
                },
            ))
        })
        .collect())
}
