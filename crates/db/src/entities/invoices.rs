//! `SeaORM` Entity for the invoices table.
//!
//! `invoice_number` is unique per owning user and year (enforced by a
//! unique index); `row_version` is the optimistic-concurrency token,
//! regenerated on every successful write. Totals are derived columns,
//! recomputed from the full item set whenever items change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub firm_id: Uuid,
    pub owner_user_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_number: String,
    pub number_year: i32,
    pub status: String,
    pub issue_date: Date,
    pub sub_total: Decimal,
    pub total_vat: Decimal,
    pub grand_total: Decimal,
    pub row_version: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(has_many = "super::invoice_items::Entity")]
    InvoiceItems,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::invoice_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
