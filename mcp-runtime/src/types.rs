use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The four record categories the RegisterUZ registry exposes. Each maps to
/// one fixed listing path and one detail path upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    AccountingEntities,
    FinancialStatements,
    FinancialReports,
    AnnualReports,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::AccountingEntities,
        EntityKind::FinancialStatements,
        EntityKind::FinancialReports,
        EntityKind::AnnualReports,
    ];

    /// Wire name as used in tool arguments and the remaining-count path.
    pub fn wire_name(self) -> &'static str {
        match self {
            EntityKind::AccountingEntities => "uctovne-jednotky",
            EntityKind::FinancialStatements => "uctovne-zavierky",
            EntityKind::FinancialReports => "uctovne-vykazy",
            EntityKind::AnnualReports => "vyrocne-spravy",
        }
    }

    pub fn list_path(self) -> &'static str {
        match self {
            EntityKind::AccountingEntities => "/uctovne-jednotky",
            EntityKind::FinancialStatements => "/uctovne-zavierky",
            EntityKind::FinancialReports => "/uctovne-vykazy",
            EntityKind::AnnualReports => "/vyrocne-spravy",
        }
    }

    pub fn detail_path(self) -> &'static str {
        match self {
            EntityKind::AccountingEntities => "/uctovna-jednotka",
            EntityKind::FinancialStatements => "/uctovna-zavierka",
            EntityKind::FinancialReports => "/uctovny-vykaz",
            EntityKind::AnnualReports => "/vyrocna-sprava",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_name() == value)
    }
}

/// Common Slovak legal form codes accepted by the entity search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalForm {
    /// s.r.o.
    LimitedLiability,
    /// a.s.
    JointStock,
    /// k.s.
    LimitedPartnership,
    /// v.o.s.
    GeneralPartnership,
    /// SE
    EuropeanCompany,
    /// Družstvo
    Cooperative,
}

impl LegalForm {
    pub const ALL: [LegalForm; 6] = [
        LegalForm::LimitedLiability,
        LegalForm::JointStock,
        LegalForm::LimitedPartnership,
        LegalForm::GeneralPartnership,
        LegalForm::EuropeanCompany,
        LegalForm::Cooperative,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LegalForm::LimitedLiability => "112",
            LegalForm::JointStock => "121",
            LegalForm::LimitedPartnership => "113",
            LegalForm::GeneralPartnership => "111",
            LegalForm::EuropeanCompany => "301",
            LegalForm::Cooperative => "221",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|form| form.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("max_records must be between 1 and 10000, got {0}")]
    MaxRecordsOutOfRange(u64),
    #[error("changed_since must be YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ, got '{0}'")]
    InvalidChangedSince(String),
    #[error("entity filters (ico/dic/legal_form) are only valid for uctovne-jednotky")]
    FiltersNotSupported,
}

/// Filters specific to accounting-entity search. Empty for every other kind.
#[derive(Debug, Clone, Default)]
pub struct EntityFilters {
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub legal_form: Option<LegalForm>,
}

impl EntityFilters {
    pub fn is_empty(&self) -> bool {
        self.ico.is_none() && self.dic.is_none() && self.legal_form.is_none()
    }
}

/// Parameters for one listing request. Internal names are English; the wire
/// uses the registry's hyphenated Slovak names (see [`SearchParams::to_query`]).
#[derive(Debug, Clone)]
pub struct SearchParams {
    changed_since: String,
    continue_after_id: Option<i64>,
    max_records: Option<u32>,
    filters: EntityFilters,
}

impl SearchParams {
    /// Validates the changed-since date eagerly; out-of-shape dates are a
    /// construction-time error, never a runtime API error.
    pub fn new(changed_since: &str) -> Result<Self, ParamError> {
        let changed_since = changed_since.trim();
        if !is_valid_changed_since(changed_since) {
            return Err(ParamError::InvalidChangedSince(changed_since.to_string()));
        }
        Ok(Self {
            changed_since: changed_since.to_string(),
            continue_after_id: None,
            max_records: None,
            filters: EntityFilters::default(),
        })
    }

    pub fn continue_after(mut self, id: i64) -> Self {
        self.continue_after_id = Some(id);
        self
    }

    pub fn with_max_records(mut self, max_records: u64) -> Result<Self, ParamError> {
        if !(1..=10_000).contains(&max_records) {
            return Err(ParamError::MaxRecordsOutOfRange(max_records));
        }
        self.max_records = Some(max_records as u32);
        Ok(self)
    }

    pub fn with_filters(mut self, filters: EntityFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn filters(&self) -> &EntityFilters {
        &self.filters
    }

    /// Page size override used by the aggregator. The value comes from the
    /// validated configuration, so no range check is repeated here.
    pub(crate) fn set_page_size(&mut self, max_records: u32) {
        self.max_records = Some(max_records);
    }

    /// Renders the wire query: `zmenene-od`, `pokracovat-za-id`,
    /// `max-zaznamov`, plus `ico`/`dic`/`pravna-forma` for entity filters.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![("zmenene-od".to_string(), self.changed_since.clone())];
        if let Some(id) = self.continue_after_id {
            query.push(("pokracovat-za-id".to_string(), id.to_string()));
        }
        if let Some(max) = self.max_records {
            query.push(("max-zaznamov".to_string(), max.to_string()));
        }
        if let Some(ico) = &self.filters.ico {
            query.push(("ico".to_string(), ico.clone()));
        }
        if let Some(dic) = &self.filters.dic {
            query.push(("dic".to_string(), dic.clone()));
        }
        if let Some(form) = self.filters.legal_form {
            query.push(("pravna-forma".to_string(), form.code().to_string()));
        }
        query
    }
}

fn is_valid_changed_since(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ").is_ok()
}

/// One decoded listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPage {
    /// Identifiers in server order; the order must be preserved because the
    /// last element of a page becomes the next cursor.
    pub ids: Vec<i64>,
    pub has_more: bool,
}

/// Tri-state value for sparse upstream records. The registry distinguishes a
/// field that is omitted from one that is explicitly `null`; re-serialized
/// records keep that distinction (omitted stays omitted, null stays null).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sparse<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Sparse<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Sparse::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Sparse::Value(value) => Some(value),
            Sparse::Absent | Sparse::Null => None,
        }
    }
}

impl<T> Default for Sparse<T> {
    fn default() -> Self {
        Sparse::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sparse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the field is present; absence is handled by
        // `#[serde(default)]` on the field.
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => Sparse::Null,
            Some(value) => Sparse::Value(value),
        })
    }
}

impl<T: Serialize> Serialize for Sparse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Sparse::Value(value) => value.serialize(serializer),
            Sparse::Absent | Sparse::Null => serializer.serialize_none(),
        }
    }
}

/// Detail of one accounting entity. Only `id` is guaranteed by the upstream
/// contract; everything else is sparse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingEntityDetail {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub ico: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub dic: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub sid: Sparse<String>,
    #[serde(default, rename = "nazovUJ", skip_serializing_if = "Sparse::is_absent")]
    pub nazov_uj: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub mesto: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub ulica: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub psc: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zalozenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zrusenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub pravna_forma: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub sk_nace: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub velkost_organizacie: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub druh_vlastnictva: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub kraj: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub okres: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub sidlo: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub konsolidovana: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_uctovnych_zavierok: Sparse<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_vyrocnych_sprav: Sparse<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub zdroj_dat: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_poslednej_upravy: Sparse<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStatementDetail {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obdobie_od: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obdobie_do: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_podania: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zostavenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_schvalenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zostavenia_k: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_prilozenia_spravy_auditora: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub nazov_fondu: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub lei_kod: Sparse<String>,
    #[serde(default, rename = "idUJ", skip_serializing_if = "Sparse::is_absent")]
    pub id_uj: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub konsolidovana: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub konsolidovana_zavierka_ustrednej_statnej_spravy: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub suhrnna_uctovna_zavierka_verejnej_spravy: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub typ: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_uctovnych_vykazov: Sparse<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub zdroj_dat: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_poslednej_upravy: Sparse<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub meno: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub mime_type: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub velkost_prilohy: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub pocet_stran: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub digest: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub jazyk: Sparse<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub ulica: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub cislo: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub psc: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub mesto: Sparse<String>,
}

/// Title page of a financial report form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePage {
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub nazov_uctovnej_jednotky: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub ico: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub dic: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub sid: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub adresa: Sparse<Address>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub miesto_podnikania: Sparse<Address>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub pravna_forma: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub sk_nace: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub typ_zavierky: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub konsolidovana: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub konsolidovana_zavierka_ustrednej_statnej_spravy: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub suhrnna_uctovna_zavierka_verejnej_spravy: Sparse<bool>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub typ_uctovnej_jednotky: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub oznacenie_obchodneho_registra: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub nazov_spravcovskeho_fondu: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub lei_kod: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obdobie_od: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obdobie_do: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub predchadzajuce_obdobie_od: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub predchadzajuce_obdobie_do: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_vyplnenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_schvalenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zostavenia: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zostavenia_k: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_prilozenia_spravy_auditora: Sparse<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    /// Localized table name, keyed by language code.
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub nazov: Sparse<std::collections::BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub data: Sparse<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContent {
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub titulna_strana: Sparse<TitlePage>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub tabulky: Sparse<Vec<ReportTable>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReportDetail {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_uctovnej_zavierky: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_vyrocnej_spravy: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_sablony: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub mena: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub kod_danoveho_uradu: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub pristupnost_dat: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub prilohy: Sparse<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obsah: Sparse<ReportContent>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub zdroj_dat: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_poslednej_upravy: Sparse<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualReportDetail {
    pub id: i64,
    #[serde(default, rename = "nazovUJ", skip_serializing_if = "Sparse::is_absent")]
    pub nazov_uj: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub typ: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub nazov_fondu: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub lei_kod: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obdobie_od: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub obdobie_do: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_podania: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_zostavenia_k: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub pristupnost_dat: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub prilohy: Sparse<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub id_uctovnych_vykazov: Sparse<Vec<i64>>,
    #[serde(default, rename = "idUJ", skip_serializing_if = "Sparse::is_absent")]
    pub id_uj: Sparse<i64>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub zdroj_dat: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub datum_poslednej_upravy: Sparse<String>,
}

/// One report template from `/sablony`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub nazov: Sparse<String>,
    #[serde(default, skip_serializing_if = "Sparse::is_absent")]
    pub tabulky: Sparse<Vec<serde_json::Value>>,
    #[serde(default, rename = "nariadenieMF", skip_serializing_if = "Sparse::is_absent")]
    pub nariadenie_mf: Sparse<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesResponse {
    #[serde(default)]
    pub sablony: Vec<Template>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_kind_wire_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_wire(kind.wire_name()), Some(kind));
        }
        assert_eq!(EntityKind::from_wire("obchodny-register"), None);
    }

    #[test]
    fn entity_kind_paths_match_upstream() {
        assert_eq!(EntityKind::AccountingEntities.list_path(), "/uctovne-jednotky");
        assert_eq!(EntityKind::AccountingEntities.detail_path(), "/uctovna-jednotka");
        assert_eq!(EntityKind::AnnualReports.list_path(), "/vyrocne-spravy");
        assert_eq!(EntityKind::AnnualReports.detail_path(), "/vyrocna-sprava");
    }

    #[test]
    fn legal_form_codes_round_trip() {
        assert_eq!(LegalForm::from_code("112"), Some(LegalForm::LimitedLiability));
        assert_eq!(LegalForm::from_code("221"), Some(LegalForm::Cooperative));
        assert_eq!(LegalForm::from_code("999"), None);
    }

    #[test]
    fn search_params_accept_date_and_timestamp() {
        assert!(SearchParams::new("2024-01-01").is_ok());
        assert!(SearchParams::new("2024-01-01T12:30:00Z").is_ok());
        assert!(SearchParams::new("not-a-date").is_err());
        assert!(SearchParams::new("2024-13-01").is_err());
        assert!(SearchParams::new("2024-01-01x").is_err());
    }

    #[test]
    fn max_records_bounds_are_construction_time_errors() {
        let params = SearchParams::new("2024-01-01").unwrap();
        assert_eq!(
            params.clone().with_max_records(0).unwrap_err(),
            ParamError::MaxRecordsOutOfRange(0)
        );
        assert_eq!(
            params.clone().with_max_records(10_001).unwrap_err(),
            ParamError::MaxRecordsOutOfRange(10_001)
        );
        assert!(params.clone().with_max_records(1).is_ok());
        assert!(params.with_max_records(10_000).is_ok());
    }

    #[test]
    fn query_uses_hyphenated_wire_names() {
        let params = SearchParams::new("2024-01-01")
            .unwrap()
            .continue_after(42)
            .with_max_records(500)
            .unwrap()
            .with_filters(EntityFilters {
                ico: Some("12345678".to_string()),
                dic: Some("2020000001".to_string()),
                legal_form: Some(LegalForm::JointStock),
            });

        assert_eq!(
            params.to_query(),
            vec![
                ("zmenene-od".to_string(), "2024-01-01".to_string()),
                ("pokracovat-za-id".to_string(), "42".to_string()),
                ("max-zaznamov".to_string(), "500".to_string()),
                ("ico".to_string(), "12345678".to_string()),
                ("dic".to_string(), "2020000001".to_string()),
                ("pravna-forma".to_string(), "121".to_string()),
            ]
        );
    }

    #[test]
    fn minimal_query_has_only_changed_since() {
        let params = SearchParams::new("2024-01-01").unwrap();
        assert_eq!(
            params.to_query(),
            vec![("zmenene-od".to_string(), "2024-01-01".to_string())]
        );
    }

    #[test]
    fn sparse_distinguishes_absent_null_and_value() {
        let detail: AccountingEntityDetail =
            serde_json::from_value(json!({ "id": 7, "ico": "12345678", "dic": null }))
                .expect("detail must decode");

        assert_eq!(detail.id, 7);
        assert_eq!(detail.ico, Sparse::Value("12345678".to_string()));
        assert_eq!(detail.dic, Sparse::Null);
        assert!(detail.nazov_uj.is_absent());
    }

    #[test]
    fn sparse_reserialization_keeps_null_and_drops_absent() {
        let detail: AccountingEntityDetail =
            serde_json::from_value(json!({ "id": 7, "ico": "12345678", "dic": null }))
                .expect("detail must decode");
        let out = serde_json::to_value(&detail).expect("detail must serialize");
        let obj = out.as_object().expect("detail serializes as an object");

        assert_eq!(obj.get("ico"), Some(&json!("12345678")));
        assert_eq!(obj.get("dic"), Some(&serde_json::Value::Null));
        assert!(!obj.contains_key("nazovUJ"));
        assert!(!obj.contains_key("mesto"));
    }

    #[test]
    fn detail_wire_names_use_upstream_casing() {
        let detail: FinancialStatementDetail = serde_json::from_value(json!({
            "id": 9,
            "idUJ": 100,
            "datumPodania": "2024-03-01",
            "idUctovnychVykazov": [1, 2]
        }))
        .expect("statement must decode");

        assert_eq!(detail.id_uj, Sparse::Value(100));
        assert_eq!(detail.datum_podania, Sparse::Value("2024-03-01".to_string()));
        assert_eq!(detail.id_uctovnych_vykazov, Sparse::Value(vec![1, 2]));

        let out = serde_json::to_value(&detail).expect("statement must serialize");
        assert_eq!(out["idUJ"], json!(100));
        assert_eq!(out["datumPodania"], json!("2024-03-01"));
    }

    #[test]
    fn templates_response_defaults_to_empty_list() {
        let parsed: TemplatesResponse =
            serde_json::from_value(json!({})).expect("empty object must decode");
        assert!(parsed.sablony.is_empty());
    }
}
