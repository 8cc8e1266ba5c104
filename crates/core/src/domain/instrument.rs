use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    FixedIncome,
    Fx,
    Commodity,
    Cash,
}

/// Instrument static data maintained through the back-office screens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: String,
    pub isin: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub currency: String,
    pub active: bool,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for instrument static data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDraft {
    pub isin: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub currency: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::{AssetClass, Instrument};

    #[test]
    fn instrument_decodes_snake_case_asset_class() {
        let instrument: Instrument = serde_json::from_str(
            r#"{
                "id": "ins-9",
                "isin": "US0378331005",
                "name": "Apple Inc.",
                "assetClass": "equity",
                "currency": "USD",
                "active": true,
                "updatedBy": "refdata",
                "updatedAt": "2026-01-15T09:00:00Z"
            }"#,
        )
        .expect("instrument should decode");

        assert_eq!(instrument.asset_class, AssetClass::Equity);
        assert!(instrument.active);
    }
}
