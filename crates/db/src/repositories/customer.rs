//! Customer repository.
//!
//! Customers are soft-deleted tombstones, hidden by the centralized
//! visibility predicate on every read. Balances are never stored: they
//! are folded from the account ledger on demand.

use defter_core::ledger::balance::{account_balance, running_balances};
use defter_core::ledger::EntryType;
use defter_core::scope::{self, Actor};
use defter_shared::types::{FirmId, PageRequest, PageResponse};
use defter_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::{load_customer_in_scope, now};
use crate::db_err;
use crate::entities::{account_transactions, customers};
use crate::scope::customer_visibility;

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerInput {
    /// Customer name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Firm to file the customer under; required for the super operator,
    /// must match (or be omitted by) firm-bound actors.
    pub firm_id: Option<FirmId>,
}

/// Input for updating a customer. `None` fields stay unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerInput {
    /// New name.
    pub name: Option<String>,
    /// New contact email.
    pub email: Option<String>,
    /// New contact phone.
    pub phone: Option<String>,
}

/// One line of a customer statement: the ledger row plus the running
/// balance after it.
#[derive(Debug, Clone)]
pub struct StatementLine {
    /// The account ledger row.
    pub entry: account_transactions::Model,
    /// Running balance after this row.
    pub balance: Decimal,
}

/// Customer repository.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a customer filed under the acting user.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for firm mismatches and `Validation` when the
    /// super operator names no firm.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateCustomerInput,
    ) -> AppResult<customers::Model> {
        let scope = scope::resolve(actor, input.firm_id).map_err(AppError::from)?;
        let firm = scope.firm().ok_or_else(|| {
            AppError::Validation("A firm is required to file the customer under".into())
        })?;
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("Customer name is required".into()));
        }

        let timestamp = now();
        let customer = customers::ActiveModel {
            id: Set(Uuid::new_v4()),
            firm_id: Set(firm.into_inner()),
            owner_user_id: Set(actor.user_id.into_inner()),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        tracing::info!(customer = %customer.id, "customer created");
        Ok(customer)
    }

    /// Gets a customer visible to the actor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for deleted or out-of-scope customers.
    pub async fn get(&self, actor: &Actor, customer_id: Uuid) -> AppResult<customers::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        load_customer_in_scope(&self.db, &scope, customer_id).await
    }

    /// Lists visible customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        page: &PageRequest,
    ) -> AppResult<PageResponse<customers::Model>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let paginator = customers::Entity::find()
            .filter(customer_visibility(&scope))
            .order_by_desc(customers::Column::CreatedAt)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Updates a customer's contact fields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for deleted or out-of-scope customers.
    pub async fn update(
        &self,
        actor: &Actor,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<customers::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let customer = load_customer_in_scope(&self.db, &scope, customer_id).await?;

        let mut active: customers::ActiveModel = customer.into();
        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Customer name is required".into()));
            }
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        active.updated_at = Set(now());

        active.update(&self.db).await.map_err(db_err)
    }

    /// Soft-deletes a customer. The row is tombstoned, never removed;
    /// its ledger history stays intact.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for already-deleted or out-of-scope customers.
    pub async fn soft_delete(&self, actor: &Actor, customer_id: Uuid) -> AppResult<()> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        let customer = load_customer_in_scope(&self.db, &scope, customer_id).await?;

        let timestamp = now();
        let mut active: customers::ActiveModel = customer.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(timestamp));
        active.updated_at = Set(timestamp);
        active.update(&self.db).await.map_err(db_err)?;

        tracing::info!(customer = %customer_id, "customer soft-deleted");
        Ok(())
    }

    /// Folds the customer's account ledger into the current balance
    /// (credits minus debits: the firm's open claim).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for deleted or out-of-scope customers.
    pub async fn balance(&self, actor: &Actor, customer_id: Uuid) -> AppResult<Decimal> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        load_customer_in_scope(&self.db, &scope, customer_id).await?;

        let entries = load_entries(&self.db, customer_id).await?;
        let folds = entries
            .iter()
            .map(row_to_fold)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(account_balance(folds))
    }

    /// Produces the customer's dated statement: every ledger row with the
    /// running balance after it, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for deleted or out-of-scope customers.
    pub async fn statement(
        &self,
        actor: &Actor,
        customer_id: Uuid,
    ) -> AppResult<Vec<StatementLine>> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        load_customer_in_scope(&self.db, &scope, customer_id).await?;

        let entries = load_entries(&self.db, customer_id).await?;
        let folds = entries
            .iter()
            .map(row_to_fold)
            .collect::<AppResult<Vec<_>>>()?;
        let balances = running_balances(folds);

        Ok(entries
            .into_iter()
            .zip(balances)
            .map(|(entry, balance)| StatementLine { entry, balance })
            .collect())
    }
}

async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
) -> AppResult<Vec<account_transactions::Model>> {
    account_transactions::Entity::find()
        .filter(account_transactions::Column::CustomerId.eq(customer_id))
        .order_by_asc(account_transactions::Column::CreatedAt)
        .order_by_asc(account_transactions::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)
}

fn row_to_fold(row: &account_transactions::Model) -> AppResult<(EntryType, Decimal)> {
    let entry = row
        .entry_type
        .parse()
        .map_err(|err: String| AppError::Internal(format!("Corrupt ledger row: {err}")))?;
    Ok((entry, row.amount))
}
