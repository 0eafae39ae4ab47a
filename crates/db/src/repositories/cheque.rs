//! Cheque and promissory note repository.
//!
//! Portfolio documents have no enforced transition set; the status
//! setter routes through the core machine anyway so a rule has one place
//! to land if terminal statuses are ever introduced.

use defter_core::document::{cheque as cheque_machine, ChequeKind, ChequeStatus};
use defter_core::scope::{self, Actor};
use defter_shared::types::{PageRequest, PageResponse};
use defter_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::prelude::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::{load_customer_in_scope, now};
use crate::db_err;
use crate::entities::cheques;
use crate::scope::firm_condition;

/// Input for registering a cheque or promissory note.
#[derive(Debug, Clone)]
pub struct CreateChequeInput {
    /// The customer the document came from, if any.
    pub customer_id: Option<Uuid>,
    /// Cheque or promissory note.
    pub document_kind: ChequeKind,
    /// Serial number printed on the document.
    pub serial_number: String,
    /// Issuing bank, if known.
    pub bank_name: Option<String>,
    /// Face amount (positive).
    pub amount: Decimal,
    /// Due date.
    pub due_date: Date,
}

/// Filter options for listing portfolio documents.
#[derive(Debug, Clone, Default)]
pub struct ChequeFilter {
    /// Filter by status.
    pub status: Option<ChequeStatus>,
    /// Only documents due on or before this date.
    pub due_before: Option<Date>,
}

/// Cheque repository.
#[derive(Debug, Clone)]
pub struct ChequeRepository {
    db: DatabaseConnection,
}

impl ChequeRepository {
    /// Creates a new cheque repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a document into the portfolio.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-positive amounts or blank serials and
    /// `NotFound` when the named customer is not visible.
    pub async fn create(&self, actor: &Actor, input: CreateChequeInput) -> AppResult<cheques::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".into()));
        }
        if input.serial_number.trim().is_empty() {
            return Err(AppError::Validation("Serial number is required".into()));
        }

        let firm = match input.customer_id {
            Some(customer_id) => {
                load_customer_in_scope(&self.db, &scope, customer_id)
                    .await?
                    .firm_id
            }
            None => scope
                .firm()
                .ok_or_else(|| {
                    AppError::Validation("A firm is required to file the document under".into())
                })?
                .into_inner(),
        };

        let timestamp = now();
        let cheque = cheques::ActiveModel {
            id: Set(Uuid::new_v4()),
            firm_id: Set(firm),
            customer_id: Set(input.customer_id),
            document_kind: Set(input.document_kind.as_str().to_owned()),
            serial_number: Set(input.serial_number),
            bank_name: Set(input.bank_name),
            amount: Set(input.amount),
            due_date: Set(input.due_date),
            status: Set(ChequeStatus::InPortfolio.as_str().to_owned()),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        tracing::info!(cheque = %cheque.id, kind = %input.document_kind, "portfolio document registered");
        Ok(cheque)
    }

    /// Gets a portfolio document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for documents outside the actor's scope.
    pub async fn get(&self, actor: &Actor, cheque_id: Uuid) -> AppResult<cheques::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        load_cheque(&self.db, &scope, cheque_id).await
    }

    /// Lists portfolio documents, soonest due first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: ChequeFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<cheques::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let mut query =
            cheques::Entity::find().filter(firm_condition(&scope, cheques::Column::FirmId));
        if let Some(status) = filter.status {
            query = query.filter(cheques::Column::Status.eq(status.as_str()));
        }
        if let Some(due_before) = filter.due_before {
            query = query.filter(cheques::Column::DueDate.lte(due_before));
        }

        let paginator = query
            .order_by_asc(cheques::Column::DueDate)
            .order_by_asc(cheques::Column::SerialNumber)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Applies a status change. Any transition is currently accepted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for documents outside the actor's scope.
    pub async fn set_status(
        &self,
        actor: &Actor,
        cheque_id: Uuid,
        target: ChequeStatus,
    ) -> AppResult<cheques::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let cheque = load_cheque(&self.db, &scope, cheque_id).await?;

        let current: ChequeStatus = cheque
            .status
            .parse()
            .map_err(|err: String| AppError::Internal(format!("Corrupt cheque status: {err}")))?;
        let new_status = cheque_machine::set_status(current, target);

        let mut active: cheques::ActiveModel = cheque.into();
        active.status = Set(new_status.as_str().to_owned());
        active.updated_at = Set(now());
        let updated = active.update(&self.db).await.map_err(db_err)?;

        tracing::info!(
            cheque = %updated.id,
            from = %current,
            to = %new_status,
            "portfolio document status changed"
        );
        Ok(updated)
    }
}

async fn load_cheque<C: sea_orm::ConnectionTrait>(
    conn: &C,
    scope: &defter_core::scope::TenantScope,
    cheque_id: Uuid,
) -> AppResult<cheques::Model> {
    cheques::Entity::find_by_id(cheque_id)
        .filter(firm_condition(scope, cheques::Column::FirmId))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio document {cheque_id}")))
}
