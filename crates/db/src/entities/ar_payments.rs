//! `SeaORM` Entity for the ar_payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ar_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_id: Uuid,
    pub customer_id: Uuid,
    pub payment_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ar_invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::ar_invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ArInvoices,
}

impl Related<super::ar_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
