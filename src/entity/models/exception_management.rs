use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entity::{key_mismatch, ConversionError, Entity, EntityDescriptor, FieldDef, FieldKind, FieldValue};

/// Validation exception raised while processing a participant record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ExceptionManagement {
    #[serde(default)]
    #[sqlx(rename = "EXCEPTION_ID")]
    pub exception_id: i32,
    #[serde(default)]
    #[sqlx(rename = "FILE_NAME")]
    pub file_name: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "NHS_NUMBER")]
    pub nhs_number: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "DATE_CREATED")]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default)]
    #[sqlx(rename = "DATE_RESOLVED")]
    pub date_resolved: Option<NaiveDate>,
    #[serde(default)]
    #[sqlx(rename = "RULE_ID")]
    pub rule_id: Option<i32>,
    #[serde(default)]
    #[sqlx(rename = "RULE_DESCRIPTION")]
    pub rule_description: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "ERROR_RECORD")]
    pub error_record: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "CATEGORY")]
    pub category: Option<i32>,
    #[serde(default)]
    #[sqlx(rename = "SCREENING_NAME")]
    pub screening_name: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "EXCEPTION_DATE")]
    pub exception_date: Option<NaiveDateTime>,
    #[serde(default)]
    #[sqlx(rename = "COHORT_NAME")]
    pub cohort_name: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "IS_FATAL")]
    pub is_fatal: Option<i16>,
    #[serde(default)]
    #[sqlx(rename = "SERVICENOW_ID")]
    pub service_now_id: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "SERVICENOW_CREATED_DATE")]
    pub service_now_created_date: Option<NaiveDate>,
    #[serde(default)]
    #[sqlx(rename = "RECORD_UPDATED_DATE")]
    pub record_updated_date: Option<NaiveDateTime>,
}

const EXCEPTION_ID: FieldDef = FieldDef::new("ExceptionId", "EXCEPTION_ID", FieldKind::Integer).int32().generated();

static FIELDS: &[FieldDef] = &[
    EXCEPTION_ID,
    FieldDef::new("FileName", "FILE_NAME", FieldKind::Text).nullable(),
    FieldDef::new("NhsNumber", "NHS_NUMBER", FieldKind::Text).nullable(),
    FieldDef::new("DateCreated", "DATE_CREATED", FieldKind::Timestamp).nullable(),
    FieldDef::new("DateResolved", "DATE_RESOLVED", FieldKind::Date).nullable(),
    FieldDef::new("RuleId", "RULE_ID", FieldKind::Integer).int32().nullable(),
    FieldDef::new("RuleDescription", "RULE_DESCRIPTION", FieldKind::Text).nullable(),
    FieldDef::new("ErrorRecord", "ERROR_RECORD", FieldKind::Text).nullable(),
    FieldDef::new("Category", "CATEGORY", FieldKind::Integer).int32().nullable(),
    FieldDef::new("ScreeningName", "SCREENING_NAME", FieldKind::Text).nullable(),
    FieldDef::new("ExceptionDate", "EXCEPTION_DATE", FieldKind::Timestamp).nullable(),
    FieldDef::new("CohortName", "COHORT_NAME", FieldKind::Text).nullable(),
    FieldDef::new("IsFatal", "IS_FATAL", FieldKind::Integer).int16().nullable(),
    FieldDef::new("ServiceNowId", "SERVICENOW_ID", FieldKind::Text).nullable(),
    FieldDef::new("ServiceNowCreatedDate", "SERVICENOW_CREATED_DATE", FieldKind::Date).nullable(),
    FieldDef::new("RecordUpdatedDate", "RECORD_UPDATED_DATE", FieldKind::Timestamp).nullable(),
];

static DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    resource: "exception-management",
    table: "EXCEPTION_MANAGEMENT",
    key: &EXCEPTION_ID,
    fields: FIELDS,
};

impl Entity for ExceptionManagement {
    fn descriptor() -> &'static EntityDescriptor {
        &DESCRIPTOR
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "ExceptionId" => self.exception_id.into(),
            "FileName" => self.file_name.clone().into(),
            "NhsNumber" => self.nhs_number.clone().into(),
            "DateCreated" => self.date_created.into(),
            "DateResolved" => self.date_resolved.into(),
            "RuleId" => self.rule_id.into(),
            "RuleDescription" => self.rule_description.clone().into(),
            "ErrorRecord" => self.error_record.clone().into(),
            "Category" => self.category.into(),
            "ScreeningName" => self.screening_name.clone().into(),
            "ExceptionDate" => self.exception_date.into(),
            "CohortName" => self.cohort_name.clone().into(),
            "IsFatal" => self.is_fatal.into(),
            "ServiceNowId" => self.service_now_id.clone().into(),
            "ServiceNowCreatedDate" => self.service_now_created_date.into(),
            "RecordUpdatedDate" => self.record_updated_date.into(),
            _ => return None,
        })
    }

    fn set_key(&mut self, key: FieldValue) -> Result<(), ConversionError> {
        match key {
            FieldValue::Integer(id) => {
                self.exception_id = i32::try_from(id).map_err(|_| key_mismatch::<Self>(&key))?;
                Ok(())
            }
            other => Err(key_mismatch::<Self>(&other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_descriptor_field_is_readable() {
        let record = ExceptionManagement::default();
        for def in ExceptionManagement::descriptor().fields {
            assert!(record.field(def.name).is_some(), "unreadable field {}", def.name);
        }
        assert_eq!(ExceptionManagement::descriptor().key.name, "ExceptionId");
    }

    #[test]
    fn deserializes_pascal_case_and_rejects_unknown_fields() {
        let record: ExceptionManagement =
            serde_json::from_str(r#"{"ExceptionId": 7, "RuleId": 36, "ServiceNowId": "INC1"}"#).unwrap();
        assert_eq!(record.exception_id, 7);
        assert_eq!(record.service_now_id.as_deref(), Some("INC1"));

        let unknown = serde_json::from_str::<ExceptionManagement>(r#"{"ExceptionFlag": 1}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn set_key_rejects_out_of_range_and_wrong_kind() {
        let mut record = ExceptionManagement::default();
        assert!(record.set_key(FieldValue::Integer(12)).is_ok());
        assert_eq!(record.exception_id, 12);
        assert!(record.set_key(FieldValue::Integer(i64::MAX)).is_err());
        assert!(record.set_key(FieldValue::Text("12".into())).is_err());
    }
}
