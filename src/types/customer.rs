//! Raw customer attributes as collected by the prediction form

use serde::{Deserialize, Serialize};

/// One form submission describing a telecom customer.
///
/// Serialized field names are the column names the classifier was trained
/// on; snake_case aliases are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// "Male" or "Female"
    #[serde(rename = "gender")]
    pub gender: String,

    /// 0 or 1
    #[serde(rename = "SeniorCitizen", alias = "senior_citizen")]
    pub senior_citizen: i64,

    #[serde(rename = "Partner", alias = "partner")]
    pub partner: String,

    #[serde(rename = "Dependents", alias = "dependents")]
    pub dependents: String,

    #[serde(rename = "PhoneService", alias = "phone_service")]
    pub phone_service: String,

    /// "Yes", "No" or "No phone service"
    #[serde(rename = "MultipleLines", alias = "multiple_lines")]
    pub multiple_lines: String,

    /// "DSL", "Fiber optic" or "No"
    #[serde(rename = "InternetService", alias = "internet_service")]
    pub internet_service: String,

    #[serde(rename = "OnlineSecurity", alias = "online_security")]
    pub online_security: String,

    #[serde(rename = "OnlineBackup", alias = "online_backup")]
    pub online_backup: String,

    #[serde(rename = "DeviceProtection", alias = "device_protection")]
    pub device_protection: String,

    #[serde(rename = "TechSupport", alias = "tech_support")]
    pub tech_support: String,

    #[serde(rename = "StreamingTV", alias = "streaming_tv")]
    pub streaming_tv: String,

    #[serde(rename = "StreamingMovies", alias = "streaming_movies")]
    pub streaming_movies: String,

    /// "Month-to-month", "One year" or "Two year"
    #[serde(rename = "Contract", alias = "contract")]
    pub contract: String,

    #[serde(rename = "PaperlessBilling", alias = "paperless_billing")]
    pub paperless_billing: String,

    #[serde(rename = "PaymentMethod", alias = "payment_method")]
    pub payment_method: String,

    /// Months with the company, 0..=72 as collected by the form
    #[serde(rename = "tenure")]
    pub tenure: i64,

    #[serde(rename = "MonthlyCharges", alias = "monthly_charges")]
    pub monthly_charges: f64,

    #[serde(rename = "TotalCharges", alias = "total_charges")]
    pub total_charges: f64,
}

impl CustomerRecord {
    /// Create a record with the given tenure and charges, every categorical
    /// attribute at its form default.
    pub fn new(tenure: i64, monthly_charges: f64, total_charges: f64) -> Self {
        Self {
            tenure,
            monthly_charges,
            total_charges,
            ..Self::default()
        }
    }
}

impl Default for CustomerRecord {
    /// The values the form starts out with.
    fn default() -> Self {
        Self {
            gender: "Male".to_string(),
            senior_citizen: 0,
            partner: "Yes".to_string(),
            dependents: "Yes".to_string(),
            phone_service: "Yes".to_string(),
            multiple_lines: "Yes".to_string(),
            internet_service: "DSL".to_string(),
            online_security: "Yes".to_string(),
            online_backup: "Yes".to_string(),
            device_protection: "Yes".to_string(),
            tech_support: "Yes".to_string(),
            streaming_tv: "Yes".to_string(),
            streaming_movies: "Yes".to_string(),
            contract: "Month-to-month".to_string(),
            paperless_billing: "Yes".to_string(),
            payment_method: "Electronic check".to_string(),
            tenure: 12,
            monthly_charges: 70.0,
            total_charges: 1000.0,
        }
    }
}
