use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// End-of-day price for a benchmark index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPrice {
    pub id: String,
    pub index_code: String,
    pub price_date: NaiveDate,
    pub price: Decimal,
    pub currency: String,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Modified duration of an index, effective from a given date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDuration {
    pub id: String,
    pub index_code: String,
    pub effective_date: NaiveDate,
    pub duration_years: Decimal,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Beta of an index against its benchmark, effective from a given date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBeta {
    pub id: String,
    pub index_code: String,
    pub benchmark_code: String,
    pub effective_date: NaiveDate,
    pub beta: Decimal,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for an index price; the backend assigns the id
/// and audit columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPriceDraft {
    pub index_code: String,
    pub price_date: NaiveDate,
    pub price: Decimal,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDurationDraft {
    pub index_code: String,
    pub effective_date: NaiveDate,
    pub duration_years: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBetaDraft {
    pub index_code: String,
    pub benchmark_code: String,
    pub effective_date: NaiveDate,
    pub beta: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::IndexPrice;

    #[test]
    fn index_price_decodes_decimal_values_exactly() {
        let price: IndexPrice = serde_json::from_str(
            r#"{
                "id": "ip-1",
                "indexCode": "GLB-AGG",
                "priceDate": "2026-02-27",
                "price": "1043.27",
                "currency": "USD",
                "updatedBy": "marketdata",
                "updatedAt": "2026-02-28T06:00:00Z"
            }"#,
        )
        .expect("index price should decode");

        assert_eq!(price.price, Decimal::new(104_327, 2));
        assert_eq!(price.index_code, "GLB-AGG");
    }
}
