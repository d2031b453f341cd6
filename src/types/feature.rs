//! Normalized feature record handed to the classifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tenure bucket derived from the number of months with the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenureBin {
    #[serde(rename = "0-12")]
    UpTo12,
    #[serde(rename = "13-24")]
    From13To24,
    #[serde(rename = "25-36")]
    From25To36,
    #[serde(rename = "37-48")]
    From37To48,
    #[serde(rename = "49-60")]
    From49To60,
    #[serde(rename = "61-72")]
    From61To72,
}

impl TenureBin {
    /// All buckets, in ascending tenure order.
    pub const ALL: [TenureBin; 6] = [
        TenureBin::UpTo12,
        TenureBin::From13To24,
        TenureBin::From25To36,
        TenureBin::From37To48,
        TenureBin::From49To60,
        TenureBin::From61To72,
    ];

    /// Label the classifier was trained on.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenureBin::UpTo12 => "0-12",
            TenureBin::From13To24 => "13-24",
            TenureBin::From25To36 => "25-36",
            TenureBin::From37To48 => "37-48",
            TenureBin::From49To60 => "49-60",
            TenureBin::From61To72 => "61-72",
        }
    }
}

impl fmt::Display for TenureBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenureBin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenureBin::ALL
            .iter()
            .copied()
            .find(|bin| bin.as_str() == s)
            .ok_or_else(|| format!("unknown tenure bin: {s}"))
    }
}

/// Borrowed view of one feature column value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Text(&'a str),
    Integer(i64),
    Number(f64),
}

impl FeatureValue<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureValue::Text(_) => "text",
            FeatureValue::Integer(_) => "integer",
            FeatureValue::Number(_) => "number",
        }
    }
}

impl fmt::Display for FeatureValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Text(s) => f.write_str(s),
            FeatureValue::Integer(i) => write!(f, "{i}"),
            FeatureValue::Number(x) => write!(f, "{x}"),
        }
    }
}

/// Customer record in the exact shape the classifier expects.
///
/// Identical to [`CustomerRecord`](crate::types::CustomerRecord) except
/// that `tenure` is replaced by `tenure_bin`. Field order matches the
/// training data frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "gender")]
    pub gender: String,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: i64,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: String,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    /// One of the [`TenureBin`] labels. Kept as text so that records
    /// arriving from outside can be checked against the schema.
    #[serde(rename = "tenure_bin")]
    pub tenure_bin: String,
}

impl FeatureRecord {
    /// Column names in training order.
    pub const COLUMNS: [&'static str; 19] = [
        "gender",
        "SeniorCitizen",
        "Partner",
        "Dependents",
        "PhoneService",
        "MultipleLines",
        "InternetService",
        "OnlineSecurity",
        "OnlineBackup",
        "DeviceProtection",
        "TechSupport",
        "StreamingTV",
        "StreamingMovies",
        "Contract",
        "PaperlessBilling",
        "PaymentMethod",
        "MonthlyCharges",
        "TotalCharges",
        "tenure_bin",
    ];

    /// The record as one ordered row of named values.
    pub fn columns(&self) -> Vec<(&'static str, FeatureValue<'_>)> {
        use FeatureValue::{Integer, Number, Text};

        vec![
            ("gender", Text(&self.gender)),
            ("SeniorCitizen", Integer(self.senior_citizen)),
            ("Partner", Text(&self.partner)),
            ("Dependents", Text(&self.dependents)),
            ("PhoneService", Text(&self.phone_service)),
            ("MultipleLines", Text(&self.multiple_lines)),
            ("InternetService", Text(&self.internet_service)),
            ("OnlineSecurity", Text(&self.online_security)),
            ("OnlineBackup", Text(&self.online_backup)),
            ("DeviceProtection", Text(&self.device_protection)),
            ("TechSupport", Text(&self.tech_support)),
            ("StreamingTV", Text(&self.streaming_tv)),
            ("StreamingMovies", Text(&self.streaming_movies)),
            ("Contract", Text(&self.contract)),
            ("PaperlessBilling", Text(&self.paperless_billing)),
            ("PaymentMethod", Text(&self.payment_method)),
            ("MonthlyCharges", Number(self.monthly_charges)),
            ("TotalCharges", Number(self.total_charges)),
            ("tenure_bin", Text(&self.tenure_bin)),
        ]
    }

    /// Look up a single column by its trained name.
    pub fn get(&self, column: &str) -> Option<FeatureValue<'_>> {
        self.columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}
