//! Invoice repository.
//!
//! Invoice creation runs the calculation engine and the number allocator
//! inside the same transaction as the insert; a uniqueness conflict on
//! (owner, number) rolls the whole attempt back and retries. Updates
//! replace the full item set, recompute totals, and advance the
//! optimistic-concurrency token with a conditional UPDATE.

use defter_core::concurrency;
use defter_core::document::{invoice as invoice_machine, InvoiceStatus};
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
use crate::entities::{account_transactions, invoice_items, invoices};
use crate::scope::firm_condition;
use defter_core::ledger::{EntryType, ReferenceType};
use rust_decimal::Decimal;

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// The customer invoiced.
    pub customer_id: Uuid,
    /// Issue date; the numbering year derives from it.
    pub issue_date: Date,
    /// Optional uppercase number prefix.
    pub prefix: Option<String>,
    /// The invoice lines (at least one).
    pub items: Vec<NewLineItem>,
}

/// Input for updating an invoice. The item set is replaced wholesale and
/// totals are recomputed from it.
#[derive(Debug, Clone)]
pub struct UpdateInvoiceInput {
    /// The invoice to update.
    pub invoice_id: Uuid,
    /// Version token from the load; `None` opts into last-writer-wins.
    pub row_version: Option<Uuid>,
    /// New issue date, if changed.
    pub issue_date: Option<Date>,
    /// The full new item set.
    pub items: Vec<NewLineItem>,
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Filter by status.
    pub status: Option<InvoiceStatus>,
    /// Filter by customer.
    pub customer_id: Option<Uuid>,
    /// Filter by numbering year.
    pub year: Option<i32>,
}

/// An invoice with its ordered items.
#[derive(Debug, Clone)]
pub struct InvoiceWithItems {
    /// Invoice header.
    pub invoice: invoices::Model,
    /// Items ordered by position.
    pub items: Vec<invoice_items::Model>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    allocation_retries: u32,
}

impl InvoiceRepository {
    /// Creates a new invoice repository with the default retry budget.
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

    /// Creates a draft invoice.
    ///
    /// # Errors
    ///
    /// Returns an error when the customer is not visible to the actor,
    /// the lines fail validation, or the number allocation race exceeds
    /// the retry budget.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateInvoiceInput,
    ) -> AppResult<InvoiceWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        if input.items.is_empty() {
            return Err(AppError::Validation(
                "An invoice needs at least one line".into(),
            ));
        }
        // Validate the lines before opening a transaction.
        compute_lines(&input.items)?;

        for attempt in 0..=self.allocation_retries {
            let txn = self.db.begin().await.map_err(db_err)?;

            let customer = load_customer_in_scope(&txn, &scope, input.customer_id).await?;
            let result = insert_invoice(
                &txn,
                InsertInvoice {
                    firm_id: customer.firm_id,
                    owner_user_id: actor.user_id.into_inner(),
                    customer_id: customer.id,
                    prefix: input.prefix.as_deref(),
                    issue_date: input.issue_date,
                    status: InvoiceStatus::Draft,
                    items: &input.items,
                },
            )
            .await;

            match result {
                Ok(created) => {
                    txn.commit().await.map_err(db_err)?;
                    tracing::info!(
                        invoice = %created.invoice.invoice_number,
                        customer = %created.invoice.customer_id,
                        "invoice created"
                    );
                    return Ok(created);
                }
                Err(err) if is_unique_violation(&err) => {
                    txn.rollback().await.map_err(db_err)?;
                    tracing::warn!(attempt, "invoice number collision, retrying allocation");
                }
                Err(err) => return Err(db_err(err)),
            }
        }

        Err(AppError::Conflict(
            "Invoice number allocation kept colliding; retry the command".into(),
        ))
    }

    /// Gets an invoice with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for invoices outside the actor's scope.
    pub async fn get(&self, actor: &Actor, invoice_id: Uuid) -> AppResult<InvoiceWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let invoice = load_invoice(&self.db, &scope, invoice_id).await?;
        let items = load_items(&self.db, invoice_id).await?;
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Lists invoices in the actor's scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: InvoiceFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<invoices::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let mut query = invoices::Entity::find()
            .filter(firm_condition(&scope, invoices::Column::FirmId));
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.as_str()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoices::Column::CustomerId.eq(customer_id));
        }
        if let Some(year) = filter.year {
            query = query.filter(invoices::Column::NumberYear.eq(year));
        }

        let paginator = query
            .order_by_desc(invoices::Column::IssueDate)
            .order_by_desc(invoices::Column::InvoiceNumber)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Replaces an invoice's items (and optionally its issue date),
    /// recomputing totals from the full new set.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` for Paid/Cancelled invoices and
    /// `ConcurrencyConflict` for stale version tokens.
    pub async fn update(
        &self,
        actor: &Actor,
        input: UpdateInvoiceInput,
    ) -> AppResult<InvoiceWithItems> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        if input.items.is_empty() {
            return Err(AppError::Validation(
                "An invoice needs at least one line".into(),
            ));
        }
        let (lines, totals) = compute_lines(&input.items)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let invoice = load_invoice(&txn, &scope, input.invoice_id).await?;
        let status = parse_status(&invoice.status)?;
        invoice_machine::ensure_editable(status).map_err(AppError::from)?;
        concurrency::check_version(invoice.row_version, input.row_version)
            .map_err(AppError::from)?;

        let new_version = concurrency::next_version();
        let timestamp = now();
        let updated = invoices::Entity::update_many()
            .col_expr(invoices::Column::SubTotal, Expr::value(totals.sub_total))
            .col_expr(invoices::Column::TotalVat, Expr::value(totals.total_vat))
            .col_expr(
                invoices::Column::GrandTotal,
                Expr::value(totals.grand_total),
            )
            .col_expr(
                invoices::Column::IssueDate,
                Expr::value(input.issue_date.unwrap_or(invoice.issue_date)),
            )
            .col_expr(invoices::Column::RowVersion, Expr::value(new_version))
            .col_expr(invoices::Column::UpdatedAt, Expr::value(timestamp))
            .filter(invoices::Column::Id.eq(invoice.id))
            .filter(invoices::Column::RowVersion.eq(invoice.row_version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            return Err(AppError::ConcurrencyConflict(
                "Invoice changed under the edit; reload and retry".into(),
            ));
        }

        invoice_items::Entity::delete_many()
            .filter(invoice_items::Column::InvoiceId.eq(invoice.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let items = insert_items(&txn, invoice.id, &input.items, &lines)
            .await
            .map_err(db_err)?;

        // An issued invoice already posted its Credit; revising the total
        // posts the difference as a new offsetting row, never an edit.
        if status == InvoiceStatus::Issued {
            let difference = totals.grand_total - invoice.grand_total;
            if !difference.is_zero() {
                let entry = if difference.is_sign_negative() {
                    EntryType::Debit
                } else {
                    EntryType::Credit
                };
                post_invoice_row(
                    &txn,
                    &invoice,
                    entry,
                    difference.abs(),
                    actor,
                    format!("Invoice {} revised", invoice.invoice_number),
                )
                .await?;
            }
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(invoice = %invoice.invoice_number, "invoice updated");

        let invoice = invoices::Model {
            sub_total: totals.sub_total,
            total_vat: totals.total_vat,
            grand_total: totals.grand_total,
            issue_date: input.issue_date.unwrap_or(invoice.issue_date),
            row_version: new_version,
            updated_at: timestamp,
            ..invoice
        };
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Applies a direct status change (issue, cancel, idempotent paid).
    ///
    /// Issuing posts the invoice's Credit to the customer account ledger;
    /// cancelling an issued invoice posts the offsetting Debit. Both
    /// happen in the same transaction as the status write.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` for illegal transitions and
    /// `ConcurrencyConflict` for stale version tokens.
    pub async fn set_status(
        &self,
        actor: &Actor,
        invoice_id: Uuid,
        target: InvoiceStatus,
        row_version: Option<Uuid>,
    ) -> AppResult<invoices::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let invoice = load_invoice(&txn, &scope, invoice_id).await?;
        let status = parse_status(&invoice.status)?;

        concurrency::check_version(invoice.row_version, row_version).map_err(AppError::from)?;
        let change = invoice_machine::set_status(status, target).map_err(AppError::from)?;
        if !change.changed {
            return Ok(invoice);
        }

        let new_version = concurrency::next_version();
        let timestamp = now();
        let updated = invoices::Entity::update_many()
            .col_expr(
                invoices::Column::Status,
                Expr::value(change.status.as_str()),
            )
            .col_expr(invoices::Column::RowVersion, Expr::value(new_version))
            .col_expr(invoices::Column::UpdatedAt, Expr::value(timestamp))
            .filter(invoices::Column::Id.eq(invoice.id))
            .filter(invoices::Column::RowVersion.eq(invoice.row_version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            return Err(AppError::ConcurrencyConflict(
                "Invoice changed under the status change; reload and retry".into(),
            ));
        }

        match (status, change.status) {
            (InvoiceStatus::Draft, InvoiceStatus::Issued) => {
                post_invoice_row(
                    &txn,
                    &invoice,
                    EntryType::Credit,
                    invoice.grand_total,
                    actor,
                    format!("Invoice {}", invoice.invoice_number),
                )
                .await?;
            }
            (InvoiceStatus::Issued, InvoiceStatus::Cancelled) => {
                post_invoice_row(
                    &txn,
                    &invoice,
                    EntryType::Debit,
                    invoice.grand_total,
                    actor,
                    format!("Invoice {} cancelled", invoice.invoice_number),
                )
                .await?;
            }
            _ => {}
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            invoice = %invoice.invoice_number,
            from = %status,
            to = %change.status,
            "invoice status changed"
        );
        Ok(invoices::Model {
            status: change.status.as_str().to_owned(),
            row_version: new_version,
            updated_at: timestamp,
            ..invoice
        })
    }
}

/// Posts one account ledger row referencing the invoice. Zero amounts
/// post nothing (a zero-total invoice has no claim to record).
async fn post_invoice_row(
    txn: &DatabaseTransaction,
    invoice: &invoices::Model,
    entry_type: EntryType,
    amount: Decimal,
    actor: &Actor,
    description: String,
) -> AppResult<()> {
    if amount.is_zero() {
        return Ok(());
    }

    account_transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(invoice.firm_id),
        customer_id: Set(invoice.customer_id),
        entry_type: Set(entry_type.as_str().to_owned()),
        amount: Set(amount),
        reference_type: Set(ReferenceType::Invoice.as_str().to_owned()),
        reference_id: Set(Some(invoice.id)),
        description: Set(Some(description)),
        created_by: Set(actor.user_id.into_inner()),
        created_at: Set(now()),
    }
    .insert(txn)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Arguments for inserting an invoice inside an existing transaction.
pub(crate) struct InsertInvoice<'a> {
    pub firm_id: Uuid,
    pub owner_user_id: Uuid,
    pub customer_id: Uuid,
    pub prefix: Option<&'a str>,
    pub issue_date: Date,
    pub status: InvoiceStatus,
    pub items: &'a [NewLineItem],
}

/// Allocates the next invoice number for (owner, year) and inserts the
/// header and items. Shared with the delivery-note conversion; the caller
/// owns the transaction and the retry-on-unique-violation loop.
pub(crate) async fn insert_invoice(
    txn: &DatabaseTransaction,
    args: InsertInvoice<'_>,
) -> Result<InvoiceWithItems, DbErr> {
    use chrono::Datelike;

    let (lines, totals) =
        compute_lines(args.items).map_err(|err| DbErr::Custom(err.to_string()))?;

    let year = args.issue_date.year();
    let last = last_invoice_number(txn, args.owner_user_id, year).await?;
    let number = numbering::next_number(args.prefix, year, last.as_deref());

    let timestamp = now();
    let invoice = invoices::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(args.firm_id),
        owner_user_id: Set(args.owner_user_id),
        customer_id: Set(args.customer_id),
        invoice_number: Set(number),
        number_year: Set(year),
        status: Set(args.status.as_str().to_owned()),
        issue_date: Set(args.issue_date),
        sub_total: Set(totals.sub_total),
        total_vat: Set(totals.total_vat),
        grand_total: Set(totals.grand_total),
        row_version: Set(concurrency::next_version()),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
    }
    .insert(txn)
    .await?;

    let items = insert_items(txn, invoice.id, args.items, &lines).await?;
    Ok(InvoiceWithItems { invoice, items })
}

async fn insert_items(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
    items: &[NewLineItem],
    lines: &[defter_core::calc::LineTotals],
) -> Result<Vec<invoice_items::Model>, DbErr> {
    let mut models = Vec::with_capacity(items.len());
    for (index, (item, line)) in items.iter().zip(lines).enumerate() {
        let model = invoice_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
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

/// Finds the numerically last number issued for (owner, year): longest
/// first, then lexicographically greatest, so post-9999 sequences keep
/// counting forward.
async fn last_invoice_number<C: ConnectionTrait>(
    conn: &C,
    owner: Uuid,
    year: i32,
) -> Result<Option<String>, DbErr> {
    let length: SimpleExpr = Func::cust(Alias::new("length"))
        .arg(Expr::col(invoices::Column::InvoiceNumber))
        .into();

    invoices::Entity::find()
        .select_only()
        .column(invoices::Column::InvoiceNumber)
        .filter(invoices::Column::OwnerUserId.eq(owner))
        .filter(invoices::Column::NumberYear.eq(year))
        .order_by_desc(length)
        .order_by_desc(invoices::Column::InvoiceNumber)
        .into_tuple::<String>()
        .one(conn)
        .await
}

pub(crate) async fn load_invoice<C: ConnectionTrait>(
    conn: &C,
    scope: &defter_core::scope::TenantScope,
    invoice_id: Uuid,
) -> AppResult<invoices::Model> {
    invoices::Entity::find_by_id(invoice_id)
        .filter(firm_condition(scope, invoices::Column::FirmId))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {invoice_id}")))
}

pub(crate) async fn load_items<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> AppResult<Vec<invoice_items::Model>> {
    invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(invoice_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

pub(crate) fn parse_status(raw: &str) -> AppResult<InvoiceStatus> {
    raw.parse()
        .map_err(|err: String| AppError::Internal(format!("Corrupt invoice status: {err}")))
}
