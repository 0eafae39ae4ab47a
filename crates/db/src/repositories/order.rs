//! Order repository.
//!
//! Orders share the invoice machinery: allocator-in-transaction with
//! retry, recompute-on-write totals, and the version-token guard. Staff
//! may only move a Pending order to Confirmed or Cancelled; the delivery
//! statuses are advanced by delivery-note confirmation.

use defter_core::concurrency;
use defter_core::document::{order as order_machine, OrderStatus};
use defter_core::numbering;
use defter_core::scope::{self, Actor};
use defter_shared::types::{PageRequest, PageResponse};
use defter_shared::{AppError, AppResult};
use sea_orm::prelude::Date;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{compute_lines, is_unique_violation, load_customer_in_scope, now, NewLineItem};
use crate::db_err;
use crate::entities::{order_items, orders};
use crate::scope::firm_condition;

/// Default number prefix for orders.
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    /// The ordering customer.
    pub customer_id: Uuid,
    /// Order date; the numbering year derives from it.
    pub order_date: Date,
    /// The order lines (at least one).
    pub items: Vec<NewLineItem>,
}

/// Input for updating a Pending order.
#[derive(Debug, Clone)]
pub struct UpdateOrderInput {
    /// The order to update.
    pub order_id: Uuid,
    /// Version token from the load; `None` opts into last-writer-wins.
    pub row_version: Option<Uuid>,
    /// New order date, if changed.
    pub order_date: Option<Date>,
    /// The full new item set.
    pub items: Vec<NewLineItem>,
}

/// Filter options for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Filter by status.
    pub status: Option<OrderStatus>,
    /// Filter by customer.
    pub customer_id: Option<Uuid>,
}

/// An order with its ordered items.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    /// Order header.
    pub order: orders::Model,
    /// Items ordered by position.
    pub items: Vec<order_items::Model>,
}

/// Order repository.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: DatabaseConnection,
    allocation_retries: u32,
}

impl OrderRepository {
    /// Creates a new order repository with the default retry budget.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            allocation_retries: 3,
        }
    }

    /// Creates a repository with the configured allocation retry budget.
    #[must_use]
    pub const fn with_numbering(
        db: DatabaseConnection,
        config: &defter_shared::config::NumberingConfig,
    ) -> Self {
        Self {
            db,
            allocation_retries: config.allocation_retries,
        }
    }

    /// Creates a Pending order.
    ///
    /// # Errors
    ///
    /// Returns an error when the customer is not visible, the lines fail
    /// validation, or the number allocation exceeds the retry budget.
    pub async fn create(&self, actor: &Actor, input: CreateOrderInput) -> AppResult<OrderWithItems> {
        use chrono::Datelike;

        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        if input.items.is_empty() {
            return Err(AppError::Validation(
                "An order needs at least one line".into(),
            ));
        }
        let (lines, totals) = compute_lines(&input.items)?;
        let year = input.order_date.year();

        for attempt in 0..=self.allocation_retries {
            let txn = self.db.begin().await.map_err(db_err)?;

            let customer = load_customer_in_scope(&txn, &scope, input.customer_id).await?;
            let last = last_order_number(&txn, actor.user_id.into_inner(), year)
                .await
                .map_err(db_err)?;
            let number = numbering::next_number(Some(ORDER_NUMBER_PREFIX), year, last.as_deref());

            let timestamp = now();
            let inserted = orders::ActiveModel {
                id: Set(Uuid::new_v4()),
                firm_id: Set(customer.firm_id),
                owner_user_id: Set(actor.user_id.into_inner()),
                customer_id: Set(customer.id),
                order_number: Set(number),
                number_year: Set(year),
                status: Set(OrderStatus::Pending.as_str().to_owned()),
                order_date: Set(input.order_date),
                sub_total: Set(totals.sub_total),
                total_vat: Set(totals.total_vat),
                grand_total: Set(totals.grand_total),
                row_version: Set(concurrency::next_version()),
                created_at: Set(timestamp),
                updated_at: Set(timestamp),
            }
            .insert(&txn)
            .await;

            match inserted {
                Ok(order) => {
                    let items = insert_items(&txn, order.id, &input.items, &lines)
                        .await
                        .map_err(db_err)?;
                    txn.commit().await.map_err(db_err)?;
                    tracing::info!(order = %order.order_number, "order created");
                    return Ok(OrderWithItems { order, items });
                }
                Err(err) if is_unique_violation(&err) => {
                    txn.rollback().await.map_err(db_err)?;
                    tracing::warn!(attempt, "order number collision, retrying allocation");
                }
                Err(err) => return Err(db_err(err)),
            }
        }

        Err(AppError::Conflict(
            "Order number allocation kept colliding; retry the command".into(),
        ))
    }

    /// Gets an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for orders outside the actor's scope.
    pub async fn get(&self, actor: &Actor, order_id: Uuid) -> AppResult<OrderWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let order = load_order(&self.db, &scope, order_id).await?;
        let items = load_items(&self.db, order_id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Lists orders in the actor's scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: OrderFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<orders::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let mut query =
            orders::Entity::find().filter(firm_condition(&scope, orders::Column::FirmId));
        if let Some(status) = filter.status {
            query = query.filter(orders::Column::Status.eq(status.as_str()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(orders::Column::CustomerId.eq(customer_id));
        }

        let paginator = query
            .order_by_desc(orders::Column::OrderDate)
            .order_by_desc(orders::Column::OrderNumber)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Replaces a Pending order's items, recomputing totals.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` for non-Pending orders and
    /// `ConcurrencyConflict` for stale version tokens.
    pub async fn update(&self, actor: &Actor, input: UpdateOrderInput) -> AppResult<OrderWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        if input.items.is_empty() {
            return Err(AppError::Validation(
                "An order needs at least one line".into(),
            ));
        }
        let (lines, totals) = compute_lines(&input.items)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let order = load_order(&txn, &scope, input.order_id).await?;
        let status = parse_status(&order.status)?;
        order_machine::ensure_editable(status).map_err(AppError::from)?;
        concurrency::check_version(order.row_version, input.row_version).map_err(AppError::from)?;

        let new_version = concurrency::next_version();
        let timestamp = now();
        let updated = orders::Entity::update_many()
            .col_expr(orders::Column::SubTotal, Expr::value(totals.sub_total))
            .col_expr(orders::Column::TotalVat, Expr::value(totals.total_vat))
            .col_expr(orders::Column::GrandTotal, Expr::value(totals.grand_total))
            .col_expr(
                orders::Column::OrderDate,
                Expr::value(input.order_date.unwrap_or(order.order_date)),
            )
            .col_expr(orders::Column::RowVersion, Expr::value(new_version))
            .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp))
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::RowVersion.eq(order.row_version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            return Err(AppError::ConcurrencyConflict(
                "Order changed under the edit; reload and retry".into(),
            ));
        }

        order_items::Entity::delete_many()
            .filter(order_items::Column::OrderId.eq(order.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let items = insert_items(&txn, order.id, &input.items, &lines)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(order = %order.order_number, "order updated");

        let order = orders::Model {
            sub_total: totals.sub_total,
            total_vat: totals.total_vat,
            grand_total: totals.grand_total,
            order_date: input.order_date.unwrap_or(order.order_date),
            row_version: new_version,
            updated_at: timestamp,
            ..order
        };
        Ok(OrderWithItems { order, items })
    }

    /// Applies a staff status change (confirm or cancel, from Pending).
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` for illegal or system-reserved transitions
    /// and `ConcurrencyConflict` for stale version tokens.
    pub async fn set_status(
        &self,
        actor: &Actor,
        order_id: Uuid,
        target: OrderStatus,
        row_version: Option<Uuid>,
    ) -> AppResult<orders::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let order = load_order(&self.db, &scope, order_id).await?;
        let status = parse_status(&order.status)?;

        concurrency::check_version(order.row_version, row_version).map_err(AppError::from)?;
        let new_status = order_machine::set_status(status, target).map_err(AppError::from)?;

        let updated = apply_status(&self.db, &order, new_status).await?;
        tracing::info!(
            order = %order.order_number,
            from = %status,
            to = %new_status,
            "order status changed"
        );
        Ok(updated)
    }
}

/// Writes a new status with a fresh version token, guarded on the old
/// token. Shared with the delivery-note confirmation path, which advances
/// delivery progress.
pub(crate) async fn apply_status<C: ConnectionTrait>(
    conn: &C,
    order: &orders::Model,
    new_status: OrderStatus,
) -> AppResult<orders::Model> {
    let new_version = concurrency::next_version();
    let timestamp = now();
    let updated = orders::Entity::update_many()
        .col_expr(orders::Column::Status, Expr::value(new_status.as_str()))
        .col_expr(orders::Column::RowVersion, Expr::value(new_version))
        .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp))
        .filter(orders::Column::Id.eq(order.id))
        .filter(orders::Column::RowVersion.eq(order.row_version))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if updated.rows_affected == 0 {
        return Err(AppError::ConcurrencyConflict(
            "Order changed under the status change; reload and retry".into(),
        ));
    }

    Ok(orders::Model {
        status: new_status.as_str().to_owned(),
        row_version: new_version,
        updated_at: timestamp,
        ..order.clone()
    })
}

async fn insert_items(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    items: &[NewLineItem],
    lines: &[defter_core::calc::LineTotals],
) -> Result<Vec<order_items::Model>, DbErr> {
    let mut models = Vec::with_capacity(items.len());
    for (index, (item, line)) in items.iter().zip(lines).enumerate() {
        let model = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            vat_rate: Set(item.vat_rate),
            discount_percent: Set(item.discount_percent),
            line_total_excl_vat: Set(line.excl_vat),
            line_vat_amount: Set(line.vat_amount),
            line_total_incl_vat: Set(line.incl_vat),
            position: Set(i32::try_from(index).unwrap_or(i32::MAX)),
        }
        .insert(txn)
        .await?;
        models.push(model);
    }
    Ok(models)
}

async fn last_order_number<C: ConnectionTrait>(
    conn: &C,
    owner: Uuid,
    year: i32,
) -> Result<Option<String>, DbErr> {
    let length: SimpleExpr = Func::cust(Alias::new("length"))
        .arg(Expr::col(orders::Column::OrderNumber))
        .into();

    orders::Entity::find()
        .select_only()
        .column(orders::Column::OrderNumber)
        .filter(orders::Column::OwnerUserId.eq(owner))
        .filter(orders::Column::NumberYear.eq(year))
        .order_by_desc(length)
        .order_by_desc(orders::Column::OrderNumber)
        .into_tuple::<String>()
        .one(conn)
        .await
}

pub(crate) async fn load_order<C: ConnectionTrait>(
    conn: &C,
    scope: &defter_core::scope::TenantScope,
    order_id: Uuid,
) -> AppResult<orders::Model> {
    orders::Entity::find_by_id(order_id)
        .filter(firm_condition(scope, orders::Column::FirmId))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id}")))
}

pub(crate) async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<order_items::Model>> {
    order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .order_by_asc(order_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

pub(crate) fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse()
        .map_err(|err: String| AppError::Internal(format!("Corrupt order status: {err}")))
}
