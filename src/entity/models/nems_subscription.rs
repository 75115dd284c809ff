use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{key_mismatch, ConversionError, Entity, EntityDescriptor, FieldDef, FieldKind, FieldValue};

/// A demographic-change subscription held with the message relay for one NHS number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct NemsSubscription {
    #[sqlx(rename = "SUBSCRIPTION_ID")]
    pub subscription_id: Uuid,
    #[sqlx(rename = "NHS_NUMBER")]
    pub nhs_number: i64,
    #[serde(default)]
    #[sqlx(rename = "RECORD_INSERT_DATETIME")]
    pub record_insert_date_time: Option<NaiveDateTime>,
    #[serde(default)]
    #[sqlx(rename = "SUBSCRIPTION_SOURCE")]
    pub subscription_source: Option<String>,
}

const SUBSCRIPTION_ID: FieldDef = FieldDef::new("SubscriptionId", "SUBSCRIPTION_ID", FieldKind::Uuid);

static FIELDS: &[FieldDef] = &[
    SUBSCRIPTION_ID,
    FieldDef::new("NhsNumber", "NHS_NUMBER", FieldKind::Integer),
    FieldDef::new("RecordInsertDateTime", "RECORD_INSERT_DATETIME", FieldKind::Timestamp).nullable(),
    FieldDef::new("SubscriptionSource", "SUBSCRIPTION_SOURCE", FieldKind::Text).nullable(),
];

static DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    resource: "nems-subscription",
    table: "NEMS_SUBSCRIPTION",
    key: &SUBSCRIPTION_ID,
    fields: FIELDS,
};

impl Entity for NemsSubscription {
    fn descriptor() -> &'static EntityDescriptor {
        &DESCRIPTOR
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "SubscriptionId" => self.subscription_id.into(),
            "NhsNumber" => self.nhs_number.into(),
            "RecordInsertDateTime" => self.record_insert_date_time.into(),
            "SubscriptionSource" => self.subscription_source.clone().into(),
            _ => return None,
        })
    }

    fn set_key(&mut self, key: FieldValue) -> Result<(), ConversionError> {
        match key {
            FieldValue::Uuid(id) => {
                self.subscription_id = id;
                Ok(())
            }
            other => Err(key_mismatch::<Self>(&other)),
        }
    }
}
