//! Stock repository.
//!
//! Every stock movement inserts an append-only ledger row and adjusts
//! the product's materialized counter in the same transaction. The
//! counter decrement is a conditional UPDATE with a floor, so concurrent
//! withdrawals fail loudly instead of overselling.

use defter_core::ledger::{LedgerService, ReferenceType, StockMovementType};
use defter_core::scope::{self, Actor, TenantScope};
use defter_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{is_unique_violation, now};
use crate::db_err;
use crate::entities::{products, stock_movements};
use crate::scope::firm_condition;

/// Input for posting a stock movement.
#[derive(Debug, Clone)]
pub struct StockMovementInput {
    /// The product moved.
    pub product_id: Uuid,
    /// In or Out; quantity is always positive.
    pub movement_type: StockMovementType,
    /// The quantity moved.
    pub quantity: Decimal,
    /// What the movement refers back to.
    pub reference_type: ReferenceType,
    /// Optional back-link to the referring document.
    pub reference_id: Option<Uuid>,
    /// Free-text description.
    pub description: Option<String>,
}

/// Stock repository.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Posts a stock movement and adjusts the materialized counter.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when a withdrawal exceeds the counter,
    /// `Conflict` when the reference already posted this product, and
    /// `NotFound` for products outside the actor's scope.
    pub async fn post_movement(
        &self,
        actor: &Actor,
        input: StockMovementInput,
    ) -> AppResult<stock_movements::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let movement = post_movement_in_txn(&txn, &scope, actor, &input).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            product = %input.product_id,
            movement = %input.movement_type,
            quantity = %input.quantity,
            "stock movement posted"
        );
        Ok(movement)
    }

    /// Reconciles a product's counter against a counted quantity by
    /// posting the In/Out difference with reference Stocktake.
    ///
    /// Returns `None` when the count already matches (nothing posted).
    ///
    /// # Errors
    ///
    /// Returns `Validation` for negative counts and `NotFound` for
    /// products outside the actor's scope.
    pub async fn stocktake(
        &self,
        actor: &Actor,
        product_id: Uuid,
        counted: Decimal,
    ) -> AppResult<Option<stock_movements::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let product = load_product(&txn, &scope, product_id).await?;

        let Some((movement_type, quantity)) =
            LedgerService::stocktake_delta(product.stock_quantity, counted)
                .map_err(AppError::from)?
        else {
            return Ok(None);
        };

        let movement = post_movement_in_txn(
            &txn,
            &scope,
            actor,
            &StockMovementInput {
                product_id,
                movement_type,
                quantity,
                reference_type: ReferenceType::Stocktake,
                reference_id: None,
                description: Some(format!("Stocktake: counted {counted}")),
            },
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(product = %product_id, counted = %counted, "stocktake reconciled");
        Ok(Some(movement))
    }

    /// Lists a product's movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for products outside the actor's scope.
    pub async fn movements(
        &self,
        actor: &Actor,
        product_id: Uuid,
    ) -> AppResult<Vec<stock_movements::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        load_product(&self.db, &scope, product_id).await?;

        stock_movements::Entity::find()
            .filter(stock_movements::Column::ProductId.eq(product_id))
            .order_by_desc(stock_movements::Column::CreatedAt)
            .order_by_desc(stock_movements::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

/// Loads a product in scope.
pub(crate) async fn load_product<C: ConnectionTrait>(
    conn: &C,
    scope: &TenantScope,
    product_id: Uuid,
) -> AppResult<products::Model> {
    products::Entity::find_by_id(product_id)
        .filter(firm_condition(scope, products::Column::FirmId))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))
}

/// Posts one movement inside the caller's transaction: validates via the
/// core plan, adjusts the counter with a floor guard, inserts the row.
/// Shared with the delivery-note confirmation path.
pub(crate) async fn post_movement_in_txn(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    actor: &Actor,
    input: &StockMovementInput,
) -> AppResult<stock_movements::Model> {
    let product = load_product(txn, scope, input.product_id).await?;

    // Early validation against the loaded counter; the conditional
    // update below re-checks atomically.
    LedgerService::plan_stock_movement(input.movement_type, input.quantity, product.stock_quantity)
        .map_err(AppError::from)?;

    let counter_change = match input.movement_type {
        StockMovementType::In => {
            Expr::col(products::Column::StockQuantity).add(input.quantity)
        }
        StockMovementType::Out => {
            Expr::col(products::Column::StockQuantity).sub(input.quantity)
        }
        StockMovementType::Transfer => {
            // Unreachable: the plan above rejects transfers.
            return Err(AppError::Validation(
                "Transfer movements are not posted by this engine".into(),
            ));
        }
    };

    let mut update = products::Entity::update_many()
        .col_expr(products::Column::StockQuantity, counter_change)
        .col_expr(products::Column::UpdatedAt, Expr::value(now()))
        .filter(products::Column::Id.eq(product.id));
    if input.movement_type == StockMovementType::Out {
        update = update.filter(products::Column::StockQuantity.gte(input.quantity));
    }
    let result = update.exec(txn).await.map_err(db_err)?;

    if result.rows_affected == 0 {
        // A concurrent withdrawal got there first.
        return Err(AppError::InsufficientStock {
            available: product.stock_quantity,
            requested: input.quantity,
        });
    }

    let inserted = stock_movements::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(product.firm_id),
        product_id: Set(product.id),
        movement_type: Set(input.movement_type.as_str().to_owned()),
        quantity: Set(input.quantity),
        reference_type: Set(input.reference_type.as_str().to_owned()),
        reference_id: Set(input.reference_id),
        description: Set(input.description.clone()),
        created_by: Set(actor.user_id.into_inner()),
        created_at: Set(now()),
    }
    .insert(txn)
    .await;

    match inserted {
        Ok(movement) => Ok(movement),
        Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(format!(
            "Stock for product {} was already posted for this reference",
            product.id
        ))),
        Err(err) => Err(db_err(err)),
    }
}
