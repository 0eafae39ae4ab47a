//! Delivery note repository.
//!
//! Confirming a note posts one Out stock movement per line and adjusts
//! the counters, all in the note's transaction. Confirm is idempotent:
//! the existing movement batch keyed (reference = delivery note, note id)
//! is checked before posting, and the unique index on it backstops the
//! check. Confirming against an order advances the order's delivery
//! progress. Conversion to an invoice freezes the note for good.

use defter_core::concurrency;
use defter_core::document::delivery_note::ConfirmOutcome;
use defter_core::document::{
    delivery_note as note_machine, order as order_machine, DeliveryNoteStatus, InvoiceStatus,
    OrderStatus,
};
use defter_core::ledger::{ReferenceType, StockMovementType};
use defter_core::numbering;
use defter_core::scope::{self, Actor, TenantScope};
use defter_shared::types::{PageRequest, PageResponse};
use defter_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::prelude::Date;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::invoice::{insert_invoice, InsertInvoice};
use super::stock::{post_movement_in_txn, StockMovementInput};
use super::{compute_lines, is_unique_violation, load_customer_in_scope, now, NewLineItem};
use crate::db_err;
use crate::entities::{delivery_note_items, delivery_notes, order_items, stock_movements};
use crate::scope::firm_condition;

/// Default number prefix for delivery notes.
pub const NOTE_NUMBER_PREFIX: &str = "DN";

/// One caller-supplied line of a delivery note.
#[derive(Debug, Clone)]
pub struct NewNoteItem {
    /// The product delivered.
    pub product_id: Uuid,
    /// Line description.
    pub description: String,
    /// Quantity delivered (positive).
    pub quantity: Decimal,
}

/// Input for creating a delivery note.
#[derive(Debug, Clone)]
pub struct CreateNoteInput {
    /// The receiving customer.
    pub customer_id: Uuid,
    /// The order this note (partially) fulfils, if any.
    pub order_id: Option<Uuid>,
    /// Note date; the numbering year derives from it.
    pub note_date: Date,
    /// The note lines (at least one).
    pub items: Vec<NewNoteItem>,
}

/// Input for updating a Draft delivery note.
#[derive(Debug, Clone)]
pub struct UpdateNoteInput {
    /// The note to update.
    pub note_id: Uuid,
    /// Version token from the load; `None` opts into last-writer-wins.
    pub row_version: Option<Uuid>,
    /// New note date, if changed.
    pub note_date: Option<Date>,
    /// The full new item set.
    pub items: Vec<NewNoteItem>,
}

/// A delivery note with its ordered items.
#[derive(Debug, Clone)]
pub struct NoteWithItems {
    /// Note header.
    pub note: delivery_notes::Model,
    /// Items ordered by position.
    pub items: Vec<delivery_note_items::Model>,
}

/// Delivery note repository.
#[derive(Debug, Clone)]
pub struct DeliveryNoteRepository {
    db: DatabaseConnection,
    allocation_retries: u32,
}

impl DeliveryNoteRepository {
    /// Creates a new delivery note repository with the default retry
    /// budget.
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

    /// Creates a Draft delivery note.
    ///
    /// # Errors
    ///
    /// Returns an error when the customer or order is not visible, the
    /// order can no longer accept deliveries, or the number allocation
    /// exceeds the retry budget.
    pub async fn create(&self, actor: &Actor, input: CreateNoteInput) -> AppResult<NoteWithItems> {
        use chrono::Datelike;

        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        validate_items(&input.items)?;
        let year = input.note_date.year();

        for attempt in 0..=self.allocation_retries {
            let txn = self.db.begin().await.map_err(db_err)?;

            let customer = load_customer_in_scope(&txn, &scope, input.customer_id).await?;
            if let Some(order_id) = input.order_id {
                let order = super::order::load_order(&txn, &scope, order_id).await?;
                let status = super::order::parse_status(&order.status)?;
                ensure_order_accepts_deliveries(status)?;
                if order.customer_id != customer.id {
                    return Err(AppError::Validation(
                        "The order belongs to a different customer".into(),
                    ));
                }
            }

            let last = last_note_number(&txn, actor.user_id.into_inner(), year)
                .await
                .map_err(db_err)?;
            let number = numbering::next_number(Some(NOTE_NUMBER_PREFIX), year, last.as_deref());

            let timestamp = now();
            let inserted = delivery_notes::ActiveModel {
                id: Set(Uuid::new_v4()),
                firm_id: Set(customer.firm_id),
                owner_user_id: Set(actor.user_id.into_inner()),
                customer_id: Set(customer.id),
                order_id: Set(input.order_id),
                note_number: Set(number),
                number_year: Set(year),
                status: Set(DeliveryNoteStatus::Draft.as_str().to_owned()),
                note_date: Set(input.note_date),
                invoice_id: Set(None),
                row_version: Set(concurrency::next_version()),
                created_at: Set(timestamp),
                updated_at: Set(timestamp),
            }
            .insert(&txn)
            .await;

            match inserted {
                Ok(note) => {
                    let items = insert_items(&txn, note.id, &input.items)
                        .await
                        .map_err(db_err)?;
                    txn.commit().await.map_err(db_err)?;
                    tracing::info!(note = %note.note_number, "delivery note created");
                    return Ok(NoteWithItems { note, items });
                }
                Err(err) if is_unique_violation(&err) => {
                    txn.rollback().await.map_err(db_err)?;
                    tracing::warn!(attempt, "note number collision, retrying allocation");
                }
                Err(err) => return Err(db_err(err)),
            }
        }

        Err(AppError::Conflict(
            "Delivery note number allocation kept colliding; retry the command".into(),
        ))
    }

    /// Gets a delivery note with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for notes outside the actor's scope.
    pub async fn get(&self, actor: &Actor, note_id: Uuid) -> AppResult<NoteWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let note = load_note(&self.db, &scope, note_id).await?;
        let items = load_items(&self.db, note_id).await?;
        Ok(NoteWithItems { note, items })
    }

    /// Lists delivery notes in the actor's scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<DeliveryNoteStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<delivery_notes::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let mut query = delivery_notes::Entity::find()
            .filter(firm_condition(&scope, delivery_notes::Column::FirmId));
        if let Some(status) = status {
            query = query.filter(delivery_notes::Column::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_desc(delivery_notes::Column::NoteDate)
            .order_by_desc(delivery_notes::Column::NoteNumber)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Replaces a Draft note's items.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` for non-Draft or invoiced notes and
    /// `ConcurrencyConflict` for stale version tokens.
    pub async fn update(&self, actor: &Actor, input: UpdateNoteInput) -> AppResult<NoteWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        validate_items(&input.items)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let note = load_note(&txn, &scope, input.note_id).await?;
        let status = parse_status(&note.status)?;
        note_machine::ensure_editable(status, note.invoice_id.is_some())
            .map_err(AppError::from)?;
        concurrency::check_version(note.row_version, input.row_version).map_err(AppError::from)?;

        let new_version = concurrency::next_version();
        let timestamp = now();
        let updated = delivery_notes::Entity::update_many()
            .col_expr(
                delivery_notes::Column::NoteDate,
                Expr::value(input.note_date.unwrap_or(note.note_date)),
            )
            .col_expr(delivery_notes::Column::RowVersion, Expr::value(new_version))
            .col_expr(delivery_notes::Column::UpdatedAt, Expr::value(timestamp))
            .filter(delivery_notes::Column::Id.eq(note.id))
            .filter(delivery_notes::Column::RowVersion.eq(note.row_version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            return Err(AppError::ConcurrencyConflict(
                "Delivery note changed under the edit; reload and retry".into(),
            ));
        }

        delivery_note_items::Entity::delete_many()
            .filter(delivery_note_items::Column::DeliveryNoteId.eq(note.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let items = insert_items(&txn, note.id, &input.items)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(note = %note.note_number, "delivery note updated");

        let note = delivery_notes::Model {
            note_date: input.note_date.unwrap_or(note.note_date),
            row_version: new_version,
            updated_at: timestamp,
            ..note
        };
        Ok(NoteWithItems { note, items })
    }

    /// Confirms a note: marks it Confirmed and posts one Out stock
    /// movement per line, exactly once.
    ///
    /// Repeat confirms are accepted and do nothing. If the note is linked
    /// to an order, the order's delivery progress advances based on total
    /// delivered versus ordered quantities.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` for cancelled/invoiced notes and
    /// `InsufficientStock` when any line lacks cover (the whole confirm
    /// rolls back).
    pub async fn confirm(&self, actor: &Actor, note_id: Uuid) -> AppResult<delivery_notes::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let note = load_note(&txn, &scope, note_id).await?;
        let status = parse_status(&note.status)?;
        let outcome =
            note_machine::confirm(status, note.invoice_id.is_some()).map_err(AppError::from)?;

        let note = match outcome {
            ConfirmOutcome::Confirmed => {
                let new_version = concurrency::next_version();
                let timestamp = now();
                let updated = delivery_notes::Entity::update_many()
                    .col_expr(
                        delivery_notes::Column::Status,
                        Expr::value(DeliveryNoteStatus::Confirmed.as_str()),
                    )
                    .col_expr(delivery_notes::Column::RowVersion, Expr::value(new_version))
                    .col_expr(delivery_notes::Column::UpdatedAt, Expr::value(timestamp))
                    .filter(delivery_notes::Column::Id.eq(note.id))
                    .filter(delivery_notes::Column::RowVersion.eq(note.row_version))
                    .exec(&txn)
                    .await
                    .map_err(db_err)?;
                if updated.rows_affected == 0 {
                    return Err(AppError::ConcurrencyConflict(
                        "Delivery note changed under the confirm; reload and retry".into(),
                    ));
                }
                delivery_notes::Model {
                    status: DeliveryNoteStatus::Confirmed.as_str().to_owned(),
                    row_version: new_version,
                    updated_at: timestamp,
                    ..note
                }
            }
            ConfirmOutcome::AlreadyConfirmed => note,
        };

        // Exactly-once stock posting, guarded by the existing batch and
        // backstopped by the unique (reference, product) index.
        let already_posted = stock_movements::Entity::find()
            .filter(
                stock_movements::Column::ReferenceType.eq(ReferenceType::DeliveryNote.as_str()),
            )
            .filter(stock_movements::Column::ReferenceId.eq(note.id))
            .limit(1)
            .one(&txn)
            .await
            .map_err(db_err)?
            .is_some();

        if !already_posted {
            let items = load_items(&txn, note.id).await?;
            for item in &items {
                post_movement_in_txn(
                    &txn,
                    &scope,
                    actor,
                    &StockMovementInput {
                        product_id: item.product_id,
                        movement_type: StockMovementType::Out,
                        quantity: item.quantity,
                        reference_type: ReferenceType::DeliveryNote,
                        reference_id: Some(note.id),
                        description: Some(format!("Delivery note {}", note.note_number)),
                    },
                )
                .await?;
            }

            if let Some(order_id) = note.order_id {
                advance_order_fulfillment(&txn, &scope, order_id).await?;
            }
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            note = %note.note_number,
            posted_stock = !already_posted,
            "delivery note confirmed"
        );
        Ok(note)
    }

    /// Cancels a Draft note.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` unless the note is an unlinked Draft and
    /// `ConcurrencyConflict` for stale version tokens.
    pub async fn cancel(
        &self,
        actor: &Actor,
        note_id: Uuid,
        row_version: Option<Uuid>,
    ) -> AppResult<delivery_notes::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let note = load_note(&self.db, &scope, note_id).await?;
        let status = parse_status(&note.status)?;

        concurrency::check_version(note.row_version, row_version).map_err(AppError::from)?;
        let new_status =
            note_machine::cancel(status, note.invoice_id.is_some()).map_err(AppError::from)?;

        let new_version = concurrency::next_version();
        let timestamp = now();
        let updated = delivery_notes::Entity::update_many()
            .col_expr(
                delivery_notes::Column::Status,
                Expr::value(new_status.as_str()),
            )
            .col_expr(delivery_notes::Column::RowVersion, Expr::value(new_version))
            .col_expr(delivery_notes::Column::UpdatedAt, Expr::value(timestamp))
            .filter(delivery_notes::Column::Id.eq(note.id))
            .filter(delivery_notes::Column::RowVersion.eq(note.row_version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            return Err(AppError::ConcurrencyConflict(
                "Delivery note changed under the cancel; reload and retry".into(),
            ));
        }

        tracing::info!(note = %note.note_number, "delivery note cancelled");
        Ok(delivery_notes::Model {
            status: new_status.as_str().to_owned(),
            row_version: new_version,
            updated_at: timestamp,
            ..note
        })
    }

    /// Converts a Confirmed note into a Draft invoice.
    ///
    /// Prices and VAT rates come from the product catalog; totals are
    /// computed by the calculation engine; the invoice number is
    /// allocated in the same transaction that links and freezes the
    /// note. Once linked, the note is terminal.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` unless the note is Confirmed and unlinked,
    /// and `Conflict` if invoice numbering exceeds the retry budget.
    pub async fn convert_to_invoice(
        &self,
        actor: &Actor,
        note_id: Uuid,
        invoice_prefix: Option<String>,
    ) -> AppResult<super::invoice::InvoiceWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        for attempt in 0..=self.allocation_retries {
            let txn = self.db.begin().await.map_err(db_err)?;

            let note = load_note(&txn, &scope, note_id).await?;
            let status = parse_status(&note.status)?;
            note_machine::mark_invoiced(status, note.invoice_id.is_some())
                .map_err(AppError::from)?;

            let items = load_items(&txn, note.id).await?;
            let lines = invoice_lines_from_note(&txn, &scope, &items).await?;
            compute_lines(&lines)?;

            let result = insert_invoice(
                &txn,
                InsertInvoice {
                    firm_id: note.firm_id,
                    owner_user_id: actor.user_id.into_inner(),
                    customer_id: note.customer_id,
                    prefix: invoice_prefix.as_deref(),
                    issue_date: note.note_date,
                    status: InvoiceStatus::Draft,
                    items: &lines,
                },
            )
            .await;

            let created = match result {
                Ok(created) => created,
                Err(err) if is_unique_violation(&err) => {
                    txn.rollback().await.map_err(db_err)?;
                    tracing::warn!(attempt, "invoice number collision, retrying conversion");
                    continue;
                }
                Err(err) => return Err(db_err(err)),
            };

            // Link and freeze the note; the filter on a still-null
            // invoice_id makes double conversion lose loudly.
            let updated = delivery_notes::Entity::update_many()
                .col_expr(
                    delivery_notes::Column::Status,
                    Expr::value(DeliveryNoteStatus::Invoiced.as_str()),
                )
                .col_expr(
                    delivery_notes::Column::InvoiceId,
                    Expr::value(created.invoice.id),
                )
                .col_expr(
                    delivery_notes::Column::RowVersion,
                    Expr::value(concurrency::next_version()),
                )
                .col_expr(delivery_notes::Column::UpdatedAt, Expr::value(now()))
                .filter(delivery_notes::Column::Id.eq(note.id))
                .filter(delivery_notes::Column::RowVersion.eq(note.row_version))
                .filter(delivery_notes::Column::InvoiceId.is_null())
                .exec(&txn)
                .await
                .map_err(db_err)?;

            if updated.rows_affected == 0 {
                return Err(AppError::ConcurrencyConflict(
                    "Delivery note changed under the conversion; reload and retry".into(),
                ));
            }

            txn.commit().await.map_err(db_err)?;
            tracing::info!(
                note = %note.note_number,
                invoice = %created.invoice.invoice_number,
                "delivery note converted to invoice"
            );
            return Ok(created);
        }

        Err(AppError::Conflict(
            "Invoice number allocation kept colliding; retry the command".into(),
        ))
    }
}

fn validate_items(items: &[NewNoteItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "A delivery note needs at least one line".into(),
        ));
    }
    if items.iter().any(|item| item.quantity <= Decimal::ZERO) {
        return Err(AppError::Validation(
            "Delivery quantities must be positive".into(),
        ));
    }
    Ok(())
}

fn ensure_order_accepts_deliveries(status: OrderStatus) -> AppResult<()> {
    match status {
        OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::PartiallyDelivered => Ok(()),
        OrderStatus::FullyDelivered | OrderStatus::Cancelled => Err(AppError::StateConflict(
            format!("Order in status {status} cannot accept deliveries"),
        )),
    }
}

/// Builds invoice lines from the note items, pricing from the catalog.
async fn invoice_lines_from_note(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    items: &[delivery_note_items::Model],
) -> AppResult<Vec<NewLineItem>> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = super::stock::load_product(txn, scope, item.product_id).await?;
        lines.push(NewLineItem {
            product_id: Some(product.id),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: product.unit_price,
            vat_rate: product.vat_rate,
            discount_percent: Decimal::ZERO,
        });
    }
    Ok(lines)
}

/// Advances the linked order's delivery progress from the total
/// delivered quantities across its confirmed and invoiced notes.
async fn advance_order_fulfillment(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    order_id: Uuid,
) -> AppResult<()> {
    let order = super::order::load_order(txn, scope, order_id).await?;
    let status = super::order::parse_status(&order.status)?;
    if status == OrderStatus::FullyDelivered {
        // A late extra delivery does not regress or re-announce progress.
        return Ok(());
    }

    let ordered: Vec<(Uuid, Decimal)> = order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .all(txn)
        .await
        .map_err(db_err)?
        .into_iter()
        .filter_map(|item| item.product_id.map(|product| (product, item.quantity)))
        .collect();

    let delivered = delivered_quantities(txn, order_id).await?;
    let fully = order_machine::is_fully_delivered(&ordered, &delivered);
    let new_status = order_machine::apply_delivery(status, fully).map_err(AppError::from)?;

    if new_status != status {
        super::order::apply_status(txn, &order, new_status).await?;
        tracing::info!(order = %order.order_number, status = %new_status, "order delivery progress");
    }
    Ok(())
}

/// Sums delivered quantities per product over the order's confirmed and
/// invoiced notes.
async fn delivered_quantities(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> AppResult<Vec<(Uuid, Decimal)>> {
    let rows: Vec<(Uuid, Decimal)> = delivery_note_items::Entity::find()
        .select_only()
        .column(delivery_note_items::Column::ProductId)
        .column(delivery_note_items::Column::Quantity)
        .inner_join(delivery_notes::Entity)
        .filter(delivery_notes::Column::OrderId.eq(order_id))
        .filter(delivery_notes::Column::Status.is_in([
            DeliveryNoteStatus::Confirmed.as_str(),
            DeliveryNoteStatus::Invoiced.as_str(),
        ]))
        .into_tuple()
        .all(txn)
        .await
        .map_err(db_err)?;

    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for (product, quantity) in rows {
        *totals.entry(product).or_insert(Decimal::ZERO) += quantity;
    }
    Ok(totals.into_iter().collect())
}

async fn insert_items(
    txn: &DatabaseTransaction,
    note_id: Uuid,
    items: &[NewNoteItem],
) -> Result<Vec<delivery_note_items::Model>, DbErr> {
    let mut models = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let model = delivery_note_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            delivery_note_id: Set(note_id),
            product_id: Set(item.product_id),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity),
            position: Set(i32::try_from(index).unwrap_or(i32::MAX)),
        }
        .insert(txn)
        .await?;
        models.push(model);
    }
    Ok(models)
}

async fn last_note_number<C: ConnectionTrait>(
    conn: &C,
    owner: Uuid,
    year: i32,
) -> Result<Option<String>, DbErr> {
    let length: SimpleExpr = Func::cust(Alias::new("length"))
        .arg(Expr::col(delivery_notes::Column::NoteNumber))
        .into();

    delivery_notes::Entity::find()
        .select_only()
        .column(delivery_notes::Column::NoteNumber)
        .filter(delivery_notes::Column::OwnerUserId.eq(owner))
        .filter(delivery_notes::Column::NumberYear.eq(year))
        .order_by_desc(length)
        .order_by_desc(delivery_notes::Column::NoteNumber)
        .into_tuple::<String>()
        .one(conn)
        .await
}

async fn load_note<C: ConnectionTrait>(
    conn: &C,
    scope: &TenantScope,
    note_id: Uuid,
) -> AppResult<delivery_notes::Model> {
    delivery_notes::Entity::find_by_id(note_id)
        .filter(firm_condition(scope, delivery_notes::Column::FirmId))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Delivery note {note_id}")))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    note_id: Uuid,
) -> AppResult<Vec<delivery_note_items::Model>> {
    delivery_note_items::Entity::find()
        .filter(delivery_note_items::Column::DeliveryNoteId.eq(note_id))
        .order_by_asc(delivery_note_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

fn parse_status(raw: &str) -> AppResult<DeliveryNoteStatus> {
    raw.parse()
        .map_err(|err: String| AppError::Internal(format!("Corrupt delivery note status: {err}")))
}
