//! Initial database migration.
//!
//! Creates all back-office tables plus the indexes the engine's
//! correctness leans on:
//!
//! - unique (owner, number) per document table, so number allocation
//!   races fail loudly instead of duplicating numbers
//! - unique (reference_type, reference_id, product_id) on stock
//!   movements, so a delivery note can post each product at most once

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Firms::Table)
                    .col(ColumnDef::new(Firms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Firms::Name).string().not_null())
                    .col(
                        ColumnDef::new(Firms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Firms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::FirmId).uuid())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Users::Table, Users::FirmId)
                            .to(Firms::Table, Firms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Customers::FirmId).uuid().not_null())
                    .col(ColumnDef::new(Customers::OwnerUserId).uuid().not_null())
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string())
                    .col(ColumnDef::new(Customers::Phone).string())
                    .col(
                        ColumnDef::new(Customers::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Customers::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Customers::Table, Customers::FirmId)
                            .to(Firms::Table, Firms::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Customers::Table, Customers::OwnerUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customers_firm")
                    .table(Customers::Table)
                    .col(Customers::FirmId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::FirmId).uuid().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::Sku).string())
                    .col(
                        ColumnDef::new(Products::UnitPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::VatRate)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::StockQuantity)
                            .decimal_len(14, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Products::Table, Products::FirmId)
                            .to(Firms::Table, Firms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CashRegisters::Table)
                    .col(
                        ColumnDef::new(CashRegisters::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashRegisters::FirmId).uuid().not_null())
                    .col(ColumnDef::new(CashRegisters::Name).string().not_null())
                    .col(
                        ColumnDef::new(CashRegisters::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashRegisters::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CashRegisters::Table, CashRegisters::FirmId)
                            .to(Firms::Table, Firms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .col(
                        ColumnDef::new(BankAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankAccounts::FirmId).uuid().not_null())
                    .col(ColumnDef::new(BankAccounts::Name).string().not_null())
                    .col(ColumnDef::new(BankAccounts::Iban).string())
                    .col(
                        ColumnDef::new(BankAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BankAccounts::Table, BankAccounts::FirmId)
                            .to(Firms::Table, Firms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .col(ColumnDef::new(Invoices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::FirmId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::OwnerUserId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::InvoiceNumber).string().not_null())
                    .col(ColumnDef::new(Invoices::NumberYear).integer().not_null())
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                    .col(
                        ColumnDef::new(Invoices::SubTotal)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::TotalVat)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::GrandTotal)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoices::RowVersion).uuid().not_null())
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invoices::Table, Invoices::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invoices::Table, Invoices::OwnerUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The allocator's loud-failure backstop.
        manager
            .create_index(
                Index::create()
                    .name("uq_invoices_owner_number")
                    .table(Invoices::Table)
                    .col(Invoices::OwnerUserId)
                    .col(Invoices::InvoiceNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_owner_year")
                    .table(Invoices::Table)
                    .col(Invoices::OwnerUserId)
                    .col(Invoices::NumberYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceItems::Table)
                    .col(
                        ColumnDef::new(InvoiceItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InvoiceItems::InvoiceId).uuid().not_null())
                    .col(ColumnDef::new(InvoiceItems::ProductId).uuid())
                    .col(ColumnDef::new(InvoiceItems::Description).string().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::Quantity)
                            .decimal_len(14, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::UnitPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::VatRate)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::DiscountPercent)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::LineTotalExclVat)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::LineVatAmount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::LineTotalInclVat)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceItems::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoice_items_invoice")
                    .table(InvoiceItems::Table)
                    .col(InvoiceItems::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::FirmId).uuid().not_null())
                    .col(ColumnDef::new(Orders::OwnerUserId).uuid().not_null())
                    .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                    .col(ColumnDef::new(Orders::NumberYear).integer().not_null())
                    .col(ColumnDef::new(Orders::Status).string().not_null())
                    .col(ColumnDef::new(Orders::OrderDate).date().not_null())
                    .col(
                        ColumnDef::new(Orders::SubTotal)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalVat)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::GrandTotal)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::RowVersion).uuid().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_orders_owner_number")
                    .table(Orders::Table)
                    .col(Orders::OwnerUserId)
                    .col(Orders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).uuid())
                    .col(ColumnDef::new(OrderItems::Description).string().not_null())
                    .col(
                        ColumnDef::new(OrderItems::Quantity)
                            .decimal_len(14, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::UnitPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::VatRate)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::DiscountPercent)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::LineTotalExclVat)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::LineVatAmount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::LineTotalInclVat)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeliveryNotes::Table)
                    .col(
                        ColumnDef::new(DeliveryNotes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DeliveryNotes::FirmId).uuid().not_null())
                    .col(ColumnDef::new(DeliveryNotes::OwnerUserId).uuid().not_null())
                    .col(ColumnDef::new(DeliveryNotes::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(DeliveryNotes::OrderId).uuid())
                    .col(ColumnDef::new(DeliveryNotes::NoteNumber).string().not_null())
                    .col(ColumnDef::new(DeliveryNotes::NumberYear).integer().not_null())
                    .col(ColumnDef::new(DeliveryNotes::Status).string().not_null())
                    .col(ColumnDef::new(DeliveryNotes::NoteDate).date().not_null())
                    .col(ColumnDef::new(DeliveryNotes::InvoiceId).uuid())
                    .col(ColumnDef::new(DeliveryNotes::RowVersion).uuid().not_null())
                    .col(
                        ColumnDef::new(DeliveryNotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryNotes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DeliveryNotes::Table, DeliveryNotes::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DeliveryNotes::Table, DeliveryNotes::OrderId)
                            .to(Orders::Table, Orders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_delivery_notes_owner_number")
                    .table(DeliveryNotes::Table)
                    .col(DeliveryNotes::OwnerUserId)
                    .col(DeliveryNotes::NoteNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeliveryNoteItems::Table)
                    .col(
                        ColumnDef::new(DeliveryNoteItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeliveryNoteItems::DeliveryNoteId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeliveryNoteItems::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(DeliveryNoteItems::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryNoteItems::Quantity)
                            .decimal_len(14, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryNoteItems::Position)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DeliveryNoteItems::Table,
                                DeliveryNoteItems::DeliveryNoteId,
                            )
                            .to(DeliveryNotes::Table, DeliveryNotes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DeliveryNoteItems::Table, DeliveryNoteItems::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountTransactions::Table)
                    .col(
                        ColumnDef::new(AccountTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountTransactions::FirmId).uuid().not_null())
                    .col(
                        ColumnDef::new(AccountTransactions::CustomerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountTransactions::EntryType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountTransactions::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountTransactions::ReferenceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountTransactions::ReferenceId).uuid())
                    .col(ColumnDef::new(AccountTransactions::Description).string())
                    .col(
                        ColumnDef::new(AccountTransactions::CreatedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AccountTransactions::Table, AccountTransactions::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_transactions_customer")
                    .table(AccountTransactions::Table)
                    .col(AccountTransactions::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CashTransactions::Table)
                    .col(
                        ColumnDef::new(CashTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashTransactions::FirmId).uuid().not_null())
                    .col(
                        ColumnDef::new(CashTransactions::CashRegisterId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashTransactions::Direction).string().not_null())
                    .col(
                        ColumnDef::new(CashTransactions::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashTransactions::ReferenceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashTransactions::ReferenceId).uuid())
                    .col(ColumnDef::new(CashTransactions::Description).string())
                    .col(ColumnDef::new(CashTransactions::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(CashTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CashTransactions::Table, CashTransactions::CashRegisterId)
                            .to(CashRegisters::Table, CashRegisters::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .col(
                        ColumnDef::new(BankTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankTransactions::FirmId).uuid().not_null())
                    .col(
                        ColumnDef::new(BankTransactions::BankAccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::Direction).string().not_null())
                    .col(
                        ColumnDef::new(BankTransactions::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::ReferenceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::ReferenceId).uuid())
                    .col(ColumnDef::new(BankTransactions::Description).string())
                    .col(ColumnDef::new(BankTransactions::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(BankTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BankTransactions::Table, BankTransactions::BankAccountId)
                            .to(BankAccounts::Table, BankAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .col(
                        ColumnDef::new(StockMovements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockMovements::FirmId).uuid().not_null())
                    .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockMovements::MovementType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Quantity)
                            .decimal_len(14, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::ReferenceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::ReferenceId).uuid())
                    .col(ColumnDef::new(StockMovements::Description).string())
                    .col(ColumnDef::new(StockMovements::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(StockMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StockMovements::Table, StockMovements::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_product")
                    .table(StockMovements::Table)
                    .col(StockMovements::ProductId)
                    .to_owned(),
            )
            .await?;

        // Exactly-once stock posting per (reference, product). Rows with a
        // NULL reference_id are exempt (NULLs compare distinct).
        manager
            .create_index(
                Index::create()
                    .name("uq_stock_movements_reference_product")
                    .table(StockMovements::Table)
                    .col(StockMovements::ReferenceType)
                    .col(StockMovements::ReferenceId)
                    .col(StockMovements::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cheques::Table)
                    .col(ColumnDef::new(Cheques::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Cheques::FirmId).uuid().not_null())
                    .col(ColumnDef::new(Cheques::CustomerId).uuid())
                    .col(ColumnDef::new(Cheques::DocumentKind).string().not_null())
                    .col(ColumnDef::new(Cheques::SerialNumber).string().not_null())
                    .col(ColumnDef::new(Cheques::BankName).string())
                    .col(ColumnDef::new(Cheques::Amount).decimal_len(14, 2).not_null())
                    .col(ColumnDef::new(Cheques::DueDate).date().not_null())
                    .col(ColumnDef::new(Cheques::Status).string().not_null())
                    .col(
                        ColumnDef::new(Cheques::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cheques::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Cheques::Table, Cheques::FirmId)
                            .to(Firms::Table, Firms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "cheques",
            "stock_movements",
            "bank_transactions",
            "cash_transactions",
            "account_transactions",
            "delivery_note_items",
            "delivery_notes",
            "order_items",
            "orders",
            "invoice_items",
            "invoices",
            "bank_accounts",
            "cash_registers",
            "products",
            "customers",
            "users",
            "firms",
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Firms {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    FirmId,
    Email,
    DisplayName,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    FirmId,
    OwnerUserId,
    Name,
    Email,
    Phone,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    FirmId,
    Name,
    Sku,
    UnitPrice,
    VatRate,
    StockQuantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CashRegisters {
    Table,
    Id,
    FirmId,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BankAccounts {
    Table,
    Id,
    FirmId,
    Name,
    Iban,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    FirmId,
    OwnerUserId,
    CustomerId,
    InvoiceNumber,
    NumberYear,
    Status,
    IssueDate,
    SubTotal,
    TotalVat,
    GrandTotal,
    RowVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum InvoiceItems {
    Table,
    Id,
    InvoiceId,
    ProductId,
    Description,
    Quantity,
    UnitPrice,
    VatRate,
    DiscountPercent,
    LineTotalExclVat,
    LineVatAmount,
    LineTotalInclVat,
    Position,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    FirmId,
    OwnerUserId,
    CustomerId,
    OrderNumber,
    NumberYear,
    Status,
    OrderDate,
    SubTotal,
    TotalVat,
    GrandTotal,
    RowVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    Description,
    Quantity,
    UnitPrice,
    VatRate,
    DiscountPercent,
    LineTotalExclVat,
    LineVatAmount,
    LineTotalInclVat,
    Position,
}

#[derive(DeriveIden)]
enum DeliveryNotes {
    Table,
    Id,
    FirmId,
    OwnerUserId,
    CustomerId,
    OrderId,
    NoteNumber,
    NumberYear,
    Status,
    NoteDate,
    InvoiceId,
    RowVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DeliveryNoteItems {
    Table,
    Id,
    DeliveryNoteId,
    ProductId,
    Description,
    Quantity,
    Position,
}

#[derive(DeriveIden)]
enum AccountTransactions {
    Table,
    Id,
    FirmId,
    CustomerId,
    EntryType,
    Amount,
    ReferenceType,
    ReferenceId,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CashTransactions {
    Table,
    Id,
    FirmId,
    CashRegisterId,
    Direction,
    Amount,
    ReferenceType,
    ReferenceId,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BankTransactions {
    Table,
    Id,
    FirmId,
    BankAccountId,
    Direction,
    Amount,
    ReferenceType,
    ReferenceId,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    Id,
    FirmId,
    ProductId,
    MovementType,
    Quantity,
    ReferenceType,
    ReferenceId,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Cheques {
    Table,
    Id,
    FirmId,
    CustomerId,
    DocumentKind,
    SerialNumber,
    BankName,
    Amount,
    DueDate,
    Status,
    CreatedAt,
    UpdatedAt,
}
