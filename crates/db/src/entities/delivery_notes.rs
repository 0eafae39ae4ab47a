//! `SeaORM` Entity for the delivery notes table.
//!
//! A set `invoice_id` marks the note as converted; the note is frozen
//! from that point regardless of status.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub firm_id: Uuid,
    pub owner_user_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub note_number: String,
    pub number_year: i32,
    pub status: String,
    pub note_date: Date,
    pub invoice_id: Option<Uuid>,
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
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
    #[sea_orm(has_many = "super::delivery_note_items::Entity")]
    DeliveryNoteItems,
}

impl Related<super::delivery_note_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryNoteItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
