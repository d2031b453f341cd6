//! Feature normalization for churn model inference.
//!
//! Turns a raw form submission into the record shape used when the
//! classifier was trained: every attribute passes through unchanged and
//! `tenure` is replaced by its bucket label.

use crate::config::RangePolicy;
use crate::error::{ChurnError, Result};
use crate::types::{CustomerRecord, FeatureRecord, TenureBin};
use tracing::warn;

/// Tenure range collected by the form.
pub const MAX_TENURE_MONTHS: i64 = 72;

/// Map months of tenure to its bucket.
///
/// Upper bounds are inclusive. Anything above 60 lands in "61-72",
/// including values past 72; anything up to 12 (negative values too)
/// lands in "0-12".
pub fn tenure_to_bin(tenure: i64) -> TenureBin {
    match tenure {
        i64::MIN..=12 => TenureBin::UpTo12,
        13..=24 => TenureBin::From13To24,
        25..=36 => TenureBin::From25To36,
        37..=48 => TenureBin::From37To48,
        49..=60 => TenureBin::From49To60,
        _ => TenureBin::From61To72,
    }
}

/// Build the classifier's feature record from a customer record.
///
/// Total and deterministic: no validation is applied here.
pub fn normalize(record: CustomerRecord) -> FeatureRecord {
    let tenure_bin = tenure_to_bin(record.tenure).as_str().to_string();

    FeatureRecord {
        gender: record.gender,
        senior_citizen: record.senior_citizen,
        partner: record.partner,
        dependents: record.dependents,
        phone_service: record.phone_service,
        multiple_lines: record.multiple_lines,
        internet_service: record.internet_service,
        online_security: record.online_security,
        online_backup: record.online_backup,
        device_protection: record.device_protection,
        tech_support: record.tech_support,
        streaming_tv: record.streaming_tv,
        streaming_movies: record.streaming_movies,
        contract: record.contract,
        paperless_billing: record.paperless_billing,
        payment_method: record.payment_method,
        monthly_charges: record.monthly_charges,
        total_charges: record.total_charges,
        tenure_bin,
    }
}

/// Normalizer that applies the configured range policy before bucketing.
#[derive(Debug, Clone, Default)]
pub struct FeatureNormalizer {
    policy: RangePolicy,
}

impl FeatureNormalizer {
    /// Create a normalizer with the given range policy.
    pub fn new(policy: RangePolicy) -> Self {
        Self { policy }
    }

    /// Normalize a record, enforcing the range policy.
    ///
    /// Under [`RangePolicy::Lenient`] this never fails; out-of-range tenure
    /// is logged and bucketed by the catch-all. Under
    /// [`RangePolicy::Strict`] tenure outside 0..=72 and negative or
    /// non-finite charges are rejected.
    pub fn normalize_checked(&self, record: CustomerRecord) -> Result<FeatureRecord> {
        match self.policy {
            RangePolicy::Strict => Self::check_ranges(&record)?,
            RangePolicy::Lenient => {
                if !(0..=MAX_TENURE_MONTHS).contains(&record.tenure) {
                    warn!(
                        tenure = record.tenure,
                        tenure_bin = %tenure_to_bin(record.tenure),
                        "Tenure outside collected range, bucketed by catch-all"
                    );
                }
                for (field, value) in charges(&record) {
                    if value < 0.0 {
                        warn!(field = field, value = value, "Negative charge accepted");
                    }
                }
            }
        }

        Ok(normalize(record))
    }

    fn check_ranges(record: &CustomerRecord) -> Result<()> {
        if !(0..=MAX_TENURE_MONTHS).contains(&record.tenure) {
            return Err(ChurnError::RangeViolation {
                field: "tenure".to_string(),
                value: record.tenure.to_string(),
                allowed: format!("0..={MAX_TENURE_MONTHS}"),
            });
        }

        for (field, value) in charges(record) {
            if !value.is_finite() || value < 0.0 {
                return Err(ChurnError::RangeViolation {
                    field: field.to_string(),
                    value: value.to_string(),
                    allowed: ">= 0".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn charges(record: &CustomerRecord) -> [(&'static str, f64); 2] {
    [
        ("MonthlyCharges", record.monthly_charges),
        ("TotalCharges", record.total_charges),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_bucket_boundaries_are_inclusive_on_upper_end() {
        assert_eq!(tenure_to_bin(0), TenureBin::UpTo12);
        assert_eq!(tenure_to_bin(12), TenureBin::UpTo12);
        assert_eq!(tenure_to_bin(13), TenureBin::From13To24);
        assert_eq!(tenure_to_bin(24), TenureBin::From13To24);
        assert_eq!(tenure_to_bin(25), TenureBin::From25To36);
        assert_eq!(tenure_to_bin(36), TenureBin::From25To36);
        assert_eq!(tenure_to_bin(37), TenureBin::From37To48);
        assert_eq!(tenure_to_bin(48), TenureBin::From37To48);
        assert_eq!(tenure_to_bin(49), TenureBin::From49To60);
        assert_eq!(tenure_to_bin(60), TenureBin::From49To60);
        assert_eq!(tenure_to_bin(61), TenureBin::From61To72);
        assert_eq!(tenure_to_bin(72), TenureBin::From61To72);
    }

    #[test]
    fn test_every_collected_tenure_maps_to_its_bucket() {
        for tenure in 0..=MAX_TENURE_MONTHS {
            let label = tenure_to_bin(tenure).as_str();
            let (lo, hi) = label.split_once('-').unwrap();
            let (lo, hi): (i64, i64) = (lo.parse().unwrap(), hi.parse().unwrap());
            assert!(
                (lo..=hi).contains(&tenure),
                "tenure {tenure} landed in {label}"
            );
        }
    }

    #[test]
    fn test_catch_all_outside_collected_range() {
        assert_eq!(tenure_to_bin(73), TenureBin::From61To72);
        assert_eq!(tenure_to_bin(500), TenureBin::From61To72);
        assert_eq!(tenure_to_bin(-3), TenureBin::UpTo12);
    }

    #[test]
    fn test_normalize_passes_fields_through() {
        let record = CustomerRecord {
            gender: "Female".to_string(),
            senior_citizen: 1,
            internet_service: "Fiber optic".to_string(),
            contract: "One year".to_string(),
            payment_method: "Mailed check".to_string(),
            ..CustomerRecord::new(40, 88.5, 3540.0)
        };

        let features = normalize(record.clone());

        assert_eq!(features.gender, record.gender);
        assert_eq!(features.senior_citizen, 1);
        assert_eq!(features.internet_service, "Fiber optic");
        assert_eq!(features.contract, "One year");
        assert_eq!(features.payment_method, "Mailed check");
        assert_eq!(features.monthly_charges, 88.5);
        assert_eq!(features.total_charges, 3540.0);
        assert_eq!(features.tenure_bin, "37-48");
    }

    #[test]
    fn test_normalize_keeps_every_other_serialized_field() {
        let record = CustomerRecord::new(61, 20.0, 1220.0);
        let raw = serde_json::to_value(&record).unwrap();
        let normalized = serde_json::to_value(normalize(record)).unwrap();

        let raw = raw.as_object().unwrap();
        let normalized = normalized.as_object().unwrap();
        assert_eq!(normalized.len(), raw.len());
        for (key, value) in raw {
            if key == "tenure" {
                assert!(!normalized.contains_key("tenure"));
            } else {
                assert_eq!(normalized.get(key), Some(value), "field {key} changed");
            }
        }
        assert_eq!(normalized["tenure_bin"], "61-72");
    }

    #[test]
    fn test_lenient_policy_buckets_out_of_range_tenure() {
        let normalizer = FeatureNormalizer::new(RangePolicy::Lenient);
        let features = normalizer
            .normalize_checked(CustomerRecord::new(90, 50.0, 4500.0))
            .unwrap();
        assert_eq!(features.tenure_bin, "61-72");
    }

    /// Run `f` with a subscriber that writes formatted events into a buffer.
    fn captured_logs(f: impl FnOnce()) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || SharedWriter(sink.clone()))
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lenient_policy_logs_negative_charges() {
        let normalizer = FeatureNormalizer::new(RangePolicy::Lenient);
        let mut features = None;
        let logs = captured_logs(|| {
            features = Some(
                normalizer
                    .normalize_checked(CustomerRecord::new(5, -500.0, -10.0))
                    .unwrap(),
            );
        });

        let features = features.unwrap();
        assert_eq!(features.monthly_charges, -500.0);
        assert_eq!(features.total_charges, -10.0);
        assert!(logs.contains("Negative charge accepted"), "logs: {logs}");
        assert!(logs.contains("MonthlyCharges"));
        assert!(logs.contains("TotalCharges"));

        let logs = captured_logs(|| {
            normalizer
                .normalize_checked(CustomerRecord::new(5, 20.0, 100.0))
                .unwrap();
        });
        assert!(!logs.contains("Negative charge"));
    }

    #[test]
    fn test_strict_policy_rejects_out_of_range_values() {
        let normalizer = FeatureNormalizer::new(RangePolicy::Strict);

        let err = normalizer
            .normalize_checked(CustomerRecord::new(73, 50.0, 4500.0))
            .unwrap_err();
        assert!(matches!(err, ChurnError::RangeViolation { ref field, .. } if field == "tenure"));

        let err = normalizer
            .normalize_checked(CustomerRecord::new(10, -1.0, 100.0))
            .unwrap_err();
        assert!(
            matches!(err, ChurnError::RangeViolation { ref field, .. } if field == "MonthlyCharges")
        );

        let err = normalizer
            .normalize_checked(CustomerRecord::new(10, 10.0, f64::NAN))
            .unwrap_err();
        assert!(
            matches!(err, ChurnError::RangeViolation { ref field, .. } if field == "TotalCharges")
        );

        assert!(normalizer
            .normalize_checked(CustomerRecord::new(72, 0.0, 0.0))
            .is_ok());
    }
}
