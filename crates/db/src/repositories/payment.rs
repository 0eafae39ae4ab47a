//! Payment posting repository.
//!
//! A payment fans out into one cash/bank row, one customer account row,
//! and optionally an invoice settlement, all inside one transaction.
//! Partial postings are never observable: any failing step rolls the
//! whole event back.

use defter_core::document::{invoice as invoice_machine, InvoiceStatus};
use defter_core::ledger::balance::register_balance;
use defter_core::ledger::{
    CashDirection, EntryType, InvoiceFacts, LedgerService, PaymentMethod, PaymentPlan,
    PaymentRequest, ReferenceType,
};
use defter_core::scope::{self, Actor, TenantScope};
use defter_core::concurrency;
use defter_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{load_customer_in_scope, now};
use crate::db_err;
use crate::entities::{
    account_transactions, bank_accounts, bank_transactions, cash_registers, cash_transactions,
    invoices,
};
use crate::scope::firm_condition;

/// The rows a successful payment posting produced.
#[derive(Debug, Clone)]
pub struct PostedPayment {
    /// The customer account ledger row.
    pub account_entry: account_transactions::Model,
    /// The settled invoice, when the payment targeted one.
    pub settled_invoice: Option<invoices::Model>,
}

/// Payment posting repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Posts a payment event atomically.
    ///
    /// Steps, all in one transaction: scope-check the customer and the
    /// target register/account, insert the cash/bank row, insert the
    /// account row, and - for collections targeting an invoice - settle
    /// the invoice. A failure anywhere leaves zero rows.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad commands (including bad invoice
    /// targets), `NotFound` for out-of-scope rows, and `StateConflict`
    /// when the invoice stops being settleable mid-flight.
    pub async fn post_payment(
        &self,
        actor: &Actor,
        request: PaymentRequest,
    ) -> AppResult<PostedPayment> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let customer = load_customer_in_scope(&txn, &scope, request.customer_id).await?;
        ensure_register_in_scope(&txn, &scope, request.method, request.register_id).await?;

        let invoice = match request.invoice_id {
            None => None,
            Some(invoice_id) => {
                invoices::Entity::find_by_id(invoice_id)
                    .filter(firm_condition(&scope, invoices::Column::FirmId))
                    .one(&txn)
                    .await
                    .map_err(db_err)?
            }
        };
        let facts = invoice
            .as_ref()
            .map(|model| {
                Ok::<_, AppError>(InvoiceFacts {
                    id: model.id,
                    customer_id: model.customer_id,
                    status: super::invoice::parse_status(&model.status)?,
                })
            })
            .transpose()?;

        let plan =
            LedgerService::plan_payment(&request, facts.as_ref()).map_err(AppError::from)?;

        insert_money_row(&txn, &customer.firm_id, &request, &plan, actor).await?;

        let timestamp = now();
        let account_entry = account_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            firm_id: Set(customer.firm_id),
            customer_id: Set(customer.id),
            entry_type: Set(plan.account_entry.as_str().to_owned()),
            amount: Set(request.amount),
            reference_type: Set(plan.reference_type.as_str().to_owned()),
            reference_id: Set(plan.settle_invoice),
            description: Set(request.description.clone()),
            created_by: Set(actor.user_id.into_inner()),
            created_at: Set(timestamp),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let settled_invoice = match (plan.settle_invoice, invoice) {
            (Some(_), Some(model)) => Some(settle_invoice(&txn, model).await?),
            _ => None,
        };

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            customer = %customer.id,
            amount = %request.amount,
            kind = %plan.reference_type,
            settled = settled_invoice.is_some(),
            "payment posted"
        );

        Ok(PostedPayment {
            account_entry,
            settled_invoice,
        })
    }

    /// Posts a manual adjustment to a customer's account ledger.
    ///
    /// Corrections are new offsetting rows - historical rows are never
    /// edited.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-positive amounts and `NotFound` for
    /// customers outside the actor's scope.
    pub async fn post_manual_adjustment(
        &self,
        actor: &Actor,
        customer_id: Uuid,
        entry_type: EntryType,
        amount: Decimal,
        description: Option<String>,
    ) -> AppResult<account_transactions::Model> {
        self.post_account_row(
            actor,
            customer_id,
            entry_type,
            amount,
            ReferenceType::Manual,
            description,
        )
        .await
    }

    /// Posts a customer's opening balance.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-positive amounts and `NotFound` for
    /// customers outside the actor's scope.
    pub async fn post_opening_balance(
        &self,
        actor: &Actor,
        customer_id: Uuid,
        entry_type: EntryType,
        amount: Decimal,
    ) -> AppResult<account_transactions::Model> {
        self.post_account_row(
            actor,
            customer_id,
            entry_type,
            amount,
            ReferenceType::Opening,
            Some("Opening balance".to_owned()),
        )
        .await
    }

    /// Folds a register's or bank account's ledger into its balance
    /// (money in minus money out). Derived, never stored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for registers outside the actor's scope.
    pub async fn register_balance(
        &self,
        actor: &Actor,
        method: PaymentMethod,
        register_id: Uuid,
    ) -> AppResult<Decimal> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;

        let rows: Vec<(String, Decimal)> = match method {
            PaymentMethod::Cash => {
                ensure_register_in_scope(&self.db, &scope, method, register_id).await?;
                cash_transactions::Entity::find()
                    .select_only()
                    .column(cash_transactions::Column::Direction)
                    .column(cash_transactions::Column::Amount)
                    .filter(cash_transactions::Column::CashRegisterId.eq(register_id))
                    .into_tuple()
                    .all(&self.db)
                    .await
                    .map_err(db_err)?
            }
            PaymentMethod::Bank => {
                ensure_register_in_scope(&self.db, &scope, method, register_id).await?;
                bank_transactions::Entity::find()
                    .select_only()
                    .column(bank_transactions::Column::Direction)
                    .column(bank_transactions::Column::Amount)
                    .filter(bank_transactions::Column::BankAccountId.eq(register_id))
                    .into_tuple()
                    .all(&self.db)
                    .await
                    .map_err(db_err)?
            }
        };

        let folds = rows
            .into_iter()
            .map(|(direction, amount)| {
                direction
                    .parse::<CashDirection>()
                    .map(|direction| (direction, amount))
                    .map_err(|err| AppError::Internal(format!("Corrupt ledger row: {err}")))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(register_balance(folds))
    }

    async fn post_account_row(
        &self,
        actor: &Actor,
        customer_id: Uuid,
        entry_type: EntryType,
        amount: Decimal,
        reference_type: ReferenceType,
        description: Option<String>,
    ) -> AppResult<account_transactions::Model> {
        let scope = scope::resolve(actor, None).map_err(AppError::from)?;
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".into()));
        }

        let customer = load_customer_in_scope(&self.db, &scope, customer_id).await?;

        let row = account_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            firm_id: Set(customer.firm_id),
            customer_id: Set(customer.id),
            entry_type: Set(entry_type.as_str().to_owned()),
            amount: Set(amount),
            reference_type: Set(reference_type.as_str().to_owned()),
            reference_id: Set(None),
            description: Set(description),
            created_by: Set(actor.user_id.into_inner()),
            created_at: Set(now()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        tracing::info!(
            customer = %customer.id,
            amount = %amount,
            kind = %reference_type,
            "account row posted"
        );
        Ok(row)
    }
}

/// Scope-checks the register/account the money moves through.
async fn ensure_register_in_scope<C: ConnectionTrait>(
    conn: &C,
    scope: &TenantScope,
    method: PaymentMethod,
    register_id: Uuid,
) -> AppResult<()> {
    let found = match method {
        PaymentMethod::Cash => cash_registers::Entity::find_by_id(register_id)
            .filter(firm_condition(scope, cash_registers::Column::FirmId))
            .one(conn)
            .await
            .map_err(db_err)?
            .is_some(),
        PaymentMethod::Bank => bank_accounts::Entity::find_by_id(register_id)
            .filter(firm_condition(scope, bank_accounts::Column::FirmId))
            .one(conn)
            .await
            .map_err(db_err)?
            .is_some(),
    };
    if found {
        Ok(())
    } else {
        let kind = match method {
            PaymentMethod::Cash => "Cash register",
            PaymentMethod::Bank => "Bank account",
        };
        Err(AppError::NotFound(format!("{kind} {register_id}")))
    }
}

/// Inserts the cash or bank ledger row of the plan.
async fn insert_money_row(
    txn: &DatabaseTransaction,
    firm_id: &Uuid,
    request: &PaymentRequest,
    plan: &PaymentPlan,
    actor: &Actor,
) -> AppResult<()> {
    let timestamp = now();
    match request.method {
        PaymentMethod::Cash => {
            cash_transactions::ActiveModel {
                id: Set(Uuid::new_v4()),
                firm_id: Set(*firm_id),
                cash_register_id: Set(request.register_id),
                direction: Set(plan.cash_direction.as_str().to_owned()),
                amount: Set(request.amount),
                reference_type: Set(plan.reference_type.as_str().to_owned()),
                reference_id: Set(plan.settle_invoice),
                description: Set(request.description.clone()),
                created_by: Set(actor.user_id.into_inner()),
                created_at: Set(timestamp),
            }
            .insert(txn)
            .await
            .map_err(db_err)?;
        }
        PaymentMethod::Bank => {
            bank_transactions::ActiveModel {
                id: Set(Uuid::new_v4()),
                firm_id: Set(*firm_id),
                bank_account_id: Set(request.register_id),
                direction: Set(plan.cash_direction.as_str().to_owned()),
                amount: Set(request.amount),
                reference_type: Set(plan.reference_type.as_str().to_owned()),
                reference_id: Set(plan.settle_invoice),
                description: Set(request.description.clone()),
                created_by: Set(actor.user_id.into_inner()),
                created_at: Set(timestamp),
            }
            .insert(txn)
            .await
            .map_err(db_err)?;
        }
    }
    Ok(())
}

/// Transitions the targeted invoice to Paid, guarded on it still being
/// Issued so a racing settlement fails loudly instead of double-settling.
async fn settle_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice: invoices::Model,
) -> AppResult<invoices::Model> {
    let status = super::invoice::parse_status(&invoice.status)?;
    let new_status = invoice_machine::apply_payment(status).map_err(AppError::from)?;

    let new_version = concurrency::next_version();
    let timestamp = now();
    let updated = invoices::Entity::update_many()
        .col_expr(invoices::Column::Status, Expr::value(new_status.as_str()))
        .col_expr(invoices::Column::RowVersion, Expr::value(new_version))
        .col_expr(invoices::Column::UpdatedAt, Expr::value(timestamp))
        .filter(invoices::Column::Id.eq(invoice.id))
        .filter(invoices::Column::Status.eq(InvoiceStatus::Issued.as_str()))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if updated.rows_affected == 0 {
        return Err(AppError::StateConflict(
            "Invoice is no longer issued; the payment was not posted".into(),
        ));
    }

    Ok(invoices::Model {
        status: new_status.as_str().to_owned(),
        row_version: new_version,
        updated_at: timestamp,
        ..invoice
    })
}
