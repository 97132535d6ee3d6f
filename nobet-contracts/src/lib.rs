//! JSON Schema contracts for the duty-roster HTTP surface.
//!
//! Mirrors the teacher's `solver-contracts` crate: it does not redefine
//! business logic, only the wire shapes exchanged at the four endpoints
//! (§6), derived with `schemars` so `nobet-cli schema` and the API's
//! `/schema` routes can hand callers a machine-checkable contract without
//! hand-maintaining it alongside the Rust types.
//!
//! `nobet-core`'s internal models are not schema-derived (the teacher's
//! `solver-core` keeps no `schemars` dependency either); these DTOs are a
//! parallel, intentionally looser wire representation that
//! `nobet_core::parse` turns into the strict domain types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Request body for the Capacity and Distribute/Solve endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RosterRequest {
    pub yil: i32,
    pub ay: u32,
    #[serde(default)]
    pub personeller: Vec<PersonDto>,
    #[serde(default)]
    pub gorevler: Vec<DutyDto>,
    #[serde(default)]
    pub kurallar: Vec<RuleDto>,
    #[serde(default)]
    #[serde(rename = "gorevKisitlamalari")]
    pub gorev_kisitlamalari: Vec<RoleRestrictionDto>,
    #[serde(default)]
    #[serde(rename = "manuelAtamalar")]
    pub manuel_atamalar: Vec<ManualAssignmentDto>,
    #[serde(default)]
    #[serde(rename = "resmiTatiller")]
    pub resmi_tatiller: Vec<HolidayDto>,
    #[serde(default)]
    #[serde(rename = "kilitliHedefler")]
    pub kilitli_hedefler: HashMap<String, HashMap<String, u32>>,
    #[serde(default)]
    #[serde(rename = "gorevKisitlamaIstisnalari")]
    pub gorev_kisitlama_istisnalari: Vec<RoleExceptionDto>,
    #[serde(default)]
    #[serde(rename = "birlikteIstisnalari")]
    pub birlikte_istisnalari: Vec<TogetherExceptionDto>,
    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonDto {
    pub id: Value,
    pub ad: String,
    #[serde(default)]
    pub mazeretler: Vec<u32>,
    #[serde(default)]
    #[serde(rename = "yillikIzinler")]
    pub yillik_izinler: Vec<u32>,
    #[serde(default)]
    #[serde(rename = "nobetIzinleri")]
    pub nobet_izinleri: Vec<u32>,
    #[serde(default)]
    #[serde(rename = "gorevKotalari")]
    pub gorev_kotalari: HashMap<String, u32>,
    #[serde(default)]
    #[serde(rename = "yillikGerceklesen")]
    pub yillik_gerceklesen: HashMap<String, u32>,
    #[serde(default)]
    pub devir: HashMap<String, u32>,
    #[serde(default)]
    #[serde(rename = "kisitliGorev")]
    pub kisitli_gorev: Option<String>,
    #[serde(default)]
    #[serde(rename = "tasmaGorevi")]
    pub tasma_gorevi: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DutyDto {
    pub id: Value,
    pub ad: String,
    #[serde(default)]
    #[serde(rename = "slotIdx")]
    pub slot_idx: Option<usize>,
    #[serde(default)]
    #[serde(rename = "baseName")]
    pub base_name: String,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    #[serde(rename = "ayriBina")]
    pub ayri_bina: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleDto {
    pub tur: String,
    #[serde(default)]
    pub kisiler: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoleRestrictionDto {
    #[serde(rename = "personelId")]
    pub personel_id: Value,
    #[serde(rename = "gorevAdi")]
    pub gorev_adi: String,
    #[serde(default)]
    pub exclusive: Option<bool>,
    #[serde(default)]
    #[serde(rename = "havuzIds")]
    pub havuz_ids: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManualAssignmentDto {
    #[serde(default)]
    pub personel: Option<Value>,
    pub gun: u32,
    #[serde(default)]
    #[serde(rename = "gorevId")]
    pub gorev_id: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HolidayDto {
    pub gun: u32,
    pub tur: String,
}

/// Per-(person,day) exception opening a normally-forbidden role (H7).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoleExceptionDto {
    #[serde(rename = "personelId")]
    pub personel_id: Value,
    pub gun: u32,
    #[serde(rename = "istisnaGorev")]
    pub istisna_gorev: String,
}

/// Per-(person,day) exception allowing a together-group member onto a
/// separate-building slot (H9).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TogetherExceptionDto {
    #[serde(rename = "personelId")]
    pub personel_id: Value,
    pub gun: u32,
}

/// Response body for the Capacity endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CapacityResponseDto {
    #[serde(rename = "gunSayisi")]
    pub gun_sayisi: u32,
    #[serde(rename = "tipSayilari")]
    pub tip_sayilari: HashMap<String, u32>,
}

/// Response body for the Target endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TargetResponseDto {
    pub durum: String,
    #[serde(rename = "perPerson")]
    pub per_person: HashMap<String, HashMap<String, u32>>,
}

/// Response body for the Solve/Distribute endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SolveResponseDto {
    pub durum: String,
    pub cizelge: Option<Vec<AssignmentDto>>,
    pub kalite: Option<Value>,
    pub istatistik: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssignmentDto {
    pub gun: u32,
    #[serde(rename = "slotIdx")]
    pub slot_idx: usize,
    #[serde(rename = "personelId")]
    pub personel_id: i64,
}

/// Returns the JSON Schema document for a request/response DTO.
pub fn schema_for<T: JsonSchema>() -> schemars::schema::RootSchema {
    schemars::schema_for!(T)
}

/// Converts a validated wire request into `nobet-core`'s strict domain
/// types, going through `nobet_core::parse`'s `Raw*` shapes. The DTOs
/// above carry identical field names/renames to those `Raw*` structs by
/// construction, so the conversion is a JSON round-trip rather than a
/// field-by-field mapping.
pub fn parse_people(
    request: &RosterRequest,
) -> Result<Vec<nobet_core::models::Person>, nobet_core::error::ParseError> {
    let raw: Vec<nobet_core::parse::RawPerson> =
        serde_json::from_value(serde_json::to_value(&request.personeller).unwrap())
            .expect("PersonDto and RawPerson share a wire shape");
    nobet_core::parse::parse_people(&raw)
}

/// Converts the request's role-exception DTOs into the lookup the
/// assignment solver consults (H7).
pub fn parse_role_exceptions(
    request: &RosterRequest,
    persons: &[nobet_core::models::Person],
) -> Result<nobet_core::models::RoleExceptions, nobet_core::error::ParseError> {
    let raw: Vec<nobet_core::parse::RawRoleException> = serde_json::from_value(
        serde_json::to_value(&request.gorev_kisitlama_istisnalari).unwrap(),
    )
    .expect("RoleExceptionDto and RawRoleException share a wire shape");
    nobet_core::parse::parse_role_exceptions(&raw, persons)
}

/// Converts the request's together-exception DTOs into the lookup the
/// assignment solver consults (H9).
pub fn parse_together_exceptions(
    request: &RosterRequest,
    persons: &[nobet_core::models::Person],
) -> Result<nobet_core::models::TogetherExceptions, nobet_core::error::ParseError> {
    let raw: Vec<nobet_core::parse::RawTogetherException> = serde_json::from_value(
        serde_json::to_value(&request.birlikte_istisnalari).unwrap(),
    )
    .expect("TogetherExceptionDto and RawTogetherException share a wire shape");
    nobet_core::parse::parse_together_exceptions(&raw, persons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_request_schema_has_required_fields() {
        let schema = schema_for::<RosterRequest>();
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json.get("properties").is_some());
    }
}
