//! Explicit, versioned description of the classifier's input schema.
//!
//! The classifier only ever sees encoded rows. This module owns the
//! vocabulary each categorical column was trained with, rejects values
//! outside it before inference, and defines the one-hot layout of the
//! encoded row.

use crate::error::{ChurnError, Result};
use crate::normalizer::normalize;
use crate::types::{CustomerRecord, FeatureRecord, FeatureValue, TenureBin};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Kind and allowed values of one input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Text column, one-hot encoded in vocabulary order.
    Categorical { values: Vec<String> },
    /// Integer column restricted to a fixed set, passed through as a number.
    Integer { values: Vec<i64> },
    /// Finite numeric column, passed through.
    Numeric,
}

/// One input column of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn categorical(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Categorical {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        }
    }

    pub fn integer(name: &str, values: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Integer {
                values: values.to_vec(),
            },
        }
    }

    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Numeric,
        }
    }

    /// Number of encoded columns this field expands to.
    pub fn width(&self) -> usize {
        match &self.kind {
            FieldKind::Categorical { values } => values.len(),
            FieldKind::Integer { .. } | FieldKind::Numeric => 1,
        }
    }

    fn check(&self, value: FeatureValue<'_>) -> Result<()> {
        match (&self.kind, value) {
            (FieldKind::Categorical { values }, FeatureValue::Text(text)) => {
                if values.iter().any(|v| v == text) {
                    Ok(())
                } else {
                    Err(ChurnError::schema_mismatch(
                        &self.name,
                        text,
                        format!("not in trained vocabulary {values:?}"),
                    ))
                }
            }
            (FieldKind::Integer { values }, FeatureValue::Integer(i)) => {
                if values.contains(&i) {
                    Ok(())
                } else {
                    Err(ChurnError::schema_mismatch(
                        &self.name,
                        i.to_string(),
                        format!("expected one of {values:?}"),
                    ))
                }
            }
            (FieldKind::Numeric, FeatureValue::Number(x)) => {
                // The row is f32; a finite f64 can still overflow it.
                if x.is_finite() && (x as f32).is_finite() {
                    Ok(())
                } else {
                    Err(ChurnError::schema_mismatch(
                        &self.name,
                        x.to_string(),
                        "numeric value must be finite in single precision",
                    ))
                }
            }
            (FieldKind::Numeric, FeatureValue::Integer(_)) => Ok(()),
            (kind, value) => Err(ChurnError::schema_mismatch(
                &self.name,
                value.to_string(),
                format!("value type does not match field kind {kind:?}"),
            )),
        }
    }

    /// Whether a column holding `value` can ever satisfy this field.
    fn accepts_type(&self, value: FeatureValue<'_>) -> bool {
        matches!(
            (&self.kind, value),
            (FieldKind::Categorical { .. }, FeatureValue::Text(_))
                | (FieldKind::Integer { .. }, FeatureValue::Integer(_))
                | (FieldKind::Numeric, FeatureValue::Number(_) | FeatureValue::Integer(_))
        )
    }

    fn encode_into(&self, value: FeatureValue<'_>, row: &mut Vec<f32>) {
        match (&self.kind, value) {
            (FieldKind::Categorical { values }, FeatureValue::Text(text)) => {
                row.extend(values.iter().map(|v| if v == text { 1.0 } else { 0.0 }));
            }
            (_, FeatureValue::Integer(i)) => row.push(i as f32),
            (_, FeatureValue::Number(x)) => row.push(x as f32),
            // Unreachable after `check`; keep the row width stable regardless.
            (_, FeatureValue::Text(_)) => row.extend(std::iter::repeat(0.0).take(self.width())),
        }
    }
}

/// Versioned set of input columns, in the order the classifier reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: String,
    pub fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// Schema of the telco churn classifier.
    pub fn telco_v1() -> Self {
        const YES_NO: &[&str] = &["Yes", "No"];
        const INTERNET_ADDON: &[&str] = &["Yes", "No", "No internet service"];

        let tenure_bins: Vec<&str> = TenureBin::ALL.iter().map(|b| b.as_str()).collect();

        Self {
            version: "telco-churn/1".to_string(),
            fields: vec![
                FieldSpec::categorical("gender", &["Male", "Female"]),
                FieldSpec::integer("SeniorCitizen", &[0, 1]),
                FieldSpec::categorical("Partner", YES_NO),
                FieldSpec::categorical("Dependents", YES_NO),
                FieldSpec::categorical("PhoneService", YES_NO),
                FieldSpec::categorical("MultipleLines", &["Yes", "No", "No phone service"]),
                FieldSpec::categorical("InternetService", &["DSL", "Fiber optic", "No"]),
                FieldSpec::categorical("OnlineSecurity", INTERNET_ADDON),
                FieldSpec::categorical("OnlineBackup", INTERNET_ADDON),
                FieldSpec::categorical("DeviceProtection", INTERNET_ADDON),
                FieldSpec::categorical("TechSupport", INTERNET_ADDON),
                FieldSpec::categorical("StreamingTV", INTERNET_ADDON),
                FieldSpec::categorical("StreamingMovies", INTERNET_ADDON),
                FieldSpec::categorical("Contract", &["Month-to-month", "One year", "Two year"]),
                FieldSpec::categorical("PaperlessBilling", YES_NO),
                FieldSpec::categorical(
                    "PaymentMethod",
                    &[
                        "Electronic check",
                        "Mailed check",
                        "Bank transfer (automatic)",
                        "Credit card (automatic)",
                    ],
                ),
                FieldSpec::numeric("MonthlyCharges"),
                FieldSpec::numeric("TotalCharges"),
                FieldSpec::categorical("tenure_bin", &tenure_bins),
            ],
        }
    }

    /// Load a schema sidecar written next to the classifier artifact.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ChurnError::fatal_load(path, e))?;
        let schema: FeatureSchema =
            serde_json::from_str(&raw).map_err(|e| ChurnError::fatal_load(path, e))?;
        schema
            .check_consistency()
            .map_err(|reason| ChurnError::fatal_load(path, reason))?;
        Ok(schema)
    }

    fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.fields.is_empty() {
            return Err("schema declares no fields".to_string());
        }

        let sample = normalize(CustomerRecord::default());
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(format!("duplicate field {}", field.name));
            }
            let column = sample
                .get(&field.name)
                .ok_or_else(|| format!("field {} is not a feature record column", field.name))?;
            if !field.accepts_type(column) {
                return Err(format!(
                    "field {} declared as {:?} cannot hold a {} value",
                    field.name,
                    field.kind,
                    column.type_name()
                ));
            }
            let empty = match &field.kind {
                FieldKind::Categorical { values } => values.is_empty(),
                FieldKind::Integer { values } => values.is_empty(),
                FieldKind::Numeric => false,
            };
            if empty {
                return Err(format!("field {} has an empty vocabulary", field.name));
            }
        }
        Ok(())
    }

    /// Check every schema field against the record.
    pub fn validate(&self, record: &FeatureRecord) -> Result<()> {
        let columns = record.columns();
        for field in &self.fields {
            let value = lookup(&columns, &field.name)?;
            field.check(value)?;
        }
        Ok(())
    }

    /// Validate and encode a record into one classifier input row.
    pub fn encode(&self, record: &FeatureRecord) -> Result<Vec<f32>> {
        let columns = record.columns();
        let mut row = Vec::with_capacity(self.width());
        for field in &self.fields {
            let value = lookup(&columns, &field.name)?;
            field.check(value)?;
            field.encode_into(value, &mut row);
        }
        Ok(row)
    }

    /// Width of an encoded row.
    pub fn width(&self) -> usize {
        self.fields.iter().map(FieldSpec::width).sum()
    }

    /// Names of the encoded columns: `field=value` for one-hot columns,
    /// the field name otherwise.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        for field in &self.fields {
            match &field.kind {
                FieldKind::Categorical { values } => {
                    names.extend(values.iter().map(|v| format!("{}={}", field.name, v)));
                }
                FieldKind::Integer { .. } | FieldKind::Numeric => names.push(field.name.clone()),
            }
        }
        names
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::telco_v1()
    }
}

fn lookup<'a>(
    columns: &[(&'static str, FeatureValue<'a>)],
    name: &str,
) -> Result<FeatureValue<'a>> {
    columns
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            ChurnError::schema_mismatch(name, "", "field missing from feature record")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sidecar(schema: &FeatureSchema) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(schema).unwrap().as_bytes())
            .unwrap();
        file
    }

    fn sample() -> FeatureRecord {
        normalize(CustomerRecord::new(5, 19.99, 99.95))
    }

    #[test]
    fn test_telco_schema_covers_every_column_in_order() {
        let schema = FeatureSchema::telco_v1();
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, FeatureRecord::COLUMNS);
    }

    #[test]
    fn test_width_and_feature_names_agree() {
        let schema = FeatureSchema::telco_v1();
        // 15 categoricals (2+2+2+2+3+3+3*6+3+2+4) + tenure_bin (6) + 3 passthrough
        assert_eq!(schema.width(), 2 + 2 + 2 + 2 + 3 + 3 + 18 + 3 + 2 + 4 + 6 + 3);
        assert_eq!(schema.feature_names().len(), schema.width());
        assert_eq!(schema.feature_names()[0], "gender=Male");
        assert!(schema
            .feature_names()
            .contains(&"InternetService=Fiber optic".to_string()));
    }

    #[test]
    fn test_encode_one_hot_layout() {
        let schema = FeatureSchema::telco_v1();
        let record = sample();
        let row = schema.encode(&record).unwrap();
        let names = schema.feature_names();

        assert_eq!(row.len(), schema.width());
        let value_of = |name: &str| row[names.iter().position(|n| n == name).unwrap()];
        assert_eq!(value_of("gender=Male"), 1.0);
        assert_eq!(value_of("gender=Female"), 0.0);
        assert_eq!(value_of("SeniorCitizen"), 0.0);
        assert_eq!(value_of("tenure_bin=0-12"), 1.0);
        assert_eq!(value_of("tenure_bin=13-24"), 0.0);
        assert!((value_of("MonthlyCharges") - 19.99).abs() < 1e-4);

        // Every categorical contributes exactly one hot column.
        let hot: f32 = schema
            .fields
            .iter()
            .zip(offsets(&schema))
            .filter(|(f, _)| matches!(f.kind, FieldKind::Categorical { .. }))
            .map(|(f, start)| row[start..start + f.width()].iter().sum::<f32>())
            .sum();
        assert_eq!(hot, 16.0);
    }

    fn offsets(schema: &FeatureSchema) -> Vec<usize> {
        let mut start = 0;
        schema
            .fields
            .iter()
            .map(|f| {
                let s = start;
                start += f.width();
                s
            })
            .collect()
    }

    #[test]
    fn test_unknown_category_is_schema_mismatch() {
        let schema = FeatureSchema::telco_v1();
        let mut record = sample();
        record.internet_service = "Satellite".to_string();

        let err = schema.validate(&record).unwrap_err();
        match err {
            ChurnError::SchemaMismatch { field, value, .. } => {
                assert_eq!(field, "InternetService");
                assert_eq!(value, "Satellite");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(schema.encode(&record).is_err());
    }

    #[test]
    fn test_category_match_is_verbatim() {
        let schema = FeatureSchema::telco_v1();
        let mut record = sample();
        record.contract = "two year".to_string();
        assert!(schema.validate(&record).is_err());
    }

    #[test]
    fn test_integer_and_numeric_checks() {
        let schema = FeatureSchema::telco_v1();

        let mut record = sample();
        record.senior_citizen = 2;
        assert!(schema.validate(&record).is_err());

        let mut record = sample();
        record.total_charges = f64::INFINITY;
        assert!(schema.validate(&record).is_err());

        let mut record = sample();
        record.tenure_bin = "73-84".to_string();
        assert!(schema.validate(&record).is_err());
    }

    #[test]
    fn test_charges_beyond_single_precision_are_schema_mismatch() {
        let schema = FeatureSchema::telco_v1();
        let record = normalize(CustomerRecord::new(5, 1e39, 1e39));

        let err = schema.encode(&record).unwrap_err();
        assert!(
            matches!(err, ChurnError::SchemaMismatch { ref field, .. } if field == "MonthlyCharges")
        );

        let record = normalize(CustomerRecord::new(5, 3.0e38, 3.0e38));
        assert!(schema.encode(&record).is_ok());
    }

    #[test]
    fn test_sidecar_rejects_field_outside_feature_record() {
        let mut schema = FeatureSchema::telco_v1();
        schema.fields.push(FieldSpec::numeric("tenure"));
        let file = write_sidecar(&schema);

        let err = FeatureSchema::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ChurnError::FatalLoad { .. }));
        assert!(err.to_string().contains("tenure"));
    }

    #[test]
    fn test_sidecar_rejects_kind_that_cannot_match_column() {
        let mut schema = FeatureSchema::telco_v1();
        schema.fields[0] = FieldSpec::numeric("gender");
        let file = write_sidecar(&schema);

        let err = FeatureSchema::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ChurnError::FatalLoad { .. }));
    }

    #[test]
    fn test_field_missing_from_record() {
        let mut schema = FeatureSchema::telco_v1();
        schema.fields.push(FieldSpec::numeric("tenure"));

        let err = schema.validate(&sample()).unwrap_err();
        assert!(matches!(err, ChurnError::SchemaMismatch { ref field, .. } if field == "tenure"));
    }

    #[test]
    fn test_sidecar_round_trip() {
        let schema = FeatureSchema::telco_v1();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&schema).unwrap().as_bytes())
            .unwrap();

        let loaded = FeatureSchema::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, schema);
    }

    #[test]
    fn test_sidecar_rejects_duplicate_fields() {
        let mut schema = FeatureSchema::telco_v1();
        schema.fields.push(FieldSpec::numeric("MonthlyCharges"));
        let file = write_sidecar(&schema);

        let err = FeatureSchema::from_json_file(file.path()).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_missing_sidecar_is_fatal() {
        let err = FeatureSchema::from_json_file("/nonexistent/schema.json").unwrap_err();
        assert!(matches!(err, ChurnError::FatalLoad { .. }));
    }
}
