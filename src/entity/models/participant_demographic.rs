use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entity::{key_mismatch, ConversionError, Entity, EntityDescriptor, FieldDef, FieldKind, FieldValue};

/// Demographic snapshot for a screening participant, keyed by the caller-assigned participant id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ParticipantDemographic {
    #[sqlx(rename = "PARTICIPANT_ID")]
    pub participant_id: i64,
    #[sqlx(rename = "NHS_NUMBER")]
    pub nhs_number: i64,
    #[serde(default)]
    #[sqlx(rename = "SUPERSEDED_BY_NHS_NUMBER")]
    pub superseded_by_nhs_number: Option<i64>,
    #[serde(default)]
    #[sqlx(rename = "PRIMARY_CARE_PROVIDER")]
    pub primary_care_provider: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "CURRENT_POSTING")]
    pub current_posting: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "NAME_PREFIX")]
    pub name_prefix: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "GIVEN_NAME")]
    pub given_name: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "FAMILY_NAME")]
    pub family_name: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "DATE_OF_BIRTH")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "GENDER")]
    pub gender: Option<i16>,
    #[serde(default)]
    #[sqlx(rename = "POST_CODE")]
    pub post_code: Option<String>,
    #[serde(default)]
    #[sqlx(rename = "RECORD_INSERT_DATETIME")]
    pub record_insert_date_time: Option<NaiveDateTime>,
}

const PARTICIPANT_ID: FieldDef = FieldDef::new("ParticipantId", "PARTICIPANT_ID", FieldKind::Integer);

static FIELDS: &[FieldDef] = &[
    PARTICIPANT_ID,
    FieldDef::new("NhsNumber", "NHS_NUMBER", FieldKind::Integer),
    FieldDef::new("SupersededByNhsNumber", "SUPERSEDED_BY_NHS_NUMBER", FieldKind::Integer).nullable(),
    FieldDef::new("PrimaryCareProvider", "PRIMARY_CARE_PROVIDER", FieldKind::Text).nullable(),
    FieldDef::new("CurrentPosting", "CURRENT_POSTING", FieldKind::Text).nullable(),
    FieldDef::new("NamePrefix", "NAME_PREFIX", FieldKind::Text).nullable(),
    FieldDef::new("GivenName", "GIVEN_NAME", FieldKind::Text).nullable(),
    FieldDef::new("FamilyName", "FAMILY_NAME", FieldKind::Text).nullable(),
    FieldDef::new("DateOfBirth", "DATE_OF_BIRTH", FieldKind::Text).nullable(),
    FieldDef::new("Gender", "GENDER", FieldKind::Integer).int16().nullable(),
    FieldDef::new("PostCode", "POST_CODE", FieldKind::Text).nullable(),
    FieldDef::new("RecordInsertDateTime", "RECORD_INSERT_DATETIME", FieldKind::Timestamp).nullable(),
];

static DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    resource: "participant-demographic",
    table: "PARTICIPANT_DEMOGRAPHIC",
    key: &PARTICIPANT_ID,
    fields: FIELDS,
};

impl Entity for ParticipantDemographic {
    fn descriptor() -> &'static EntityDescriptor {
        &DESCRIPTOR
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "ParticipantId" => self.participant_id.into(),
            "NhsNumber" => self.nhs_number.into(),
            "SupersededByNhsNumber" => self.superseded_by_nhs_number.into(),
            "PrimaryCareProvider" => self.primary_care_provider.clone().into(),
            "CurrentPosting" => self.current_posting.clone().into(),
            "NamePrefix" => self.name_prefix.clone().into(),
            "GivenName" => self.given_name.clone().into(),
            "FamilyName" => self.family_name.clone().into(),
            "DateOfBirth" => self.date_of_birth.clone().into(),
            "Gender" => self.gender.into(),
            "PostCode" => self.post_code.clone().into(),
            "RecordInsertDateTime" => self.record_insert_date_time.into(),
            _ => return None,
        })
    }

    fn set_key(&mut self, key: FieldValue) -> Result<(), ConversionError> {
        match key {
            FieldValue::Integer(id) => {
                self.participant_id = id;
                Ok(())
            }
            other => Err(key_mismatch::<Self>(&other)),
        }
    }
}
