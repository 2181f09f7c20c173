//! Property tests for ingestion and storage

use std::fs;

use customer_segmenter::{CustomerSegmentation, RawCustomerFields, SegmentError};
use proptest::prelude::*;
use tempfile::tempdir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_added_customer_is_last_loaded(
        first in "[A-Za-z ,'\"-]{0,12}",
        last in "[A-Za-z ,'\"-]{0,12}",
        avg in -1.0e6f64..1.0e6,
        freq in any::<i64>(),
        lifespan in any::<i64>(),
        preexisting in 0usize..4,
    ) {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customer_data.csv"));
        for i in 0..preexisting {
            app.add_customer(&RawCustomerFields::new(format!("P{i}"), "X", "1.0", "1", "1"))
                .unwrap();
        }

        let raw = RawCustomerFields::new(
            first.as_str(),
            last.as_str(),
            avg.to_string(),
            freq.to_string(),
            lifespan.to_string(),
        );
        let added = app.add_customer(&raw).unwrap();

        let loaded = app.customers().unwrap();
        prop_assert_eq!(loaded.len(), preexisting + 1);
        prop_assert_eq!(loaded.last().unwrap(), &added);
        prop_assert_eq!(&added.first_name, &first);
        prop_assert_eq!(added.avg_purchase_value, avg);
        prop_assert_eq!(added.purchase_frequency, freq);
        prop_assert_eq!(added.customer_lifespan, lifespan);
    }

    #[test]
    fn prop_non_numeric_input_is_rejected_without_append(
        junk in "[a-zA-Z]{1,8}",
        column in 0usize..3,
    ) {
        // "inf" and "nan" parse as floats but are rejected as non-finite
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customer_data.csv"));
        app.add_customer(&RawCustomerFields::new("A", "B", "1.0", "1", "1")).unwrap();
        let before = fs::read_to_string(app.store().path()).unwrap();

        let mut numbers = ["2.5".to_string(), "3".to_string(), "4".to_string()];
        numbers[column] = junk;
        let [avg, freq, lifespan] = numbers;
        let result = app.add_customer(&RawCustomerFields::new("C", "D", avg, freq, lifespan));

        prop_assert!(matches!(result, Err(SegmentError::InvalidInput { .. })), "expected InvalidInput, got {:?}", result);
        prop_assert_eq!(fs::read_to_string(app.store().path()).unwrap(), before);
    }

    #[test]
    fn prop_one_label_per_customer(
        points in prop::collection::vec((0.0f64..1000.0, 0i64..100, 0i64..100), 2..20),
    ) {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customer_data.csv"));
        for (i, (avg, freq, lifespan)) in points.iter().enumerate() {
            app.add_customer(&RawCustomerFields::new(
                format!("C{i}"),
                "X",
                avg.to_string(),
                freq.to_string(),
                lifespan.to_string(),
            ))
            .unwrap();
        }

        let result = app.run_clustering().unwrap();
        prop_assert_eq!(result.labels.len(), points.len());
        prop_assert!(result.labels.iter().all(|&label| label < 3));
        prop_assert_eq!(result.records, app.customers().unwrap());
    }

    #[test]
    fn prop_extreme_values_never_panic(
        points in prop::collection::vec(
            (
                prop_oneof![
                    prop::num::f64::NORMAL,
                    prop::num::f64::SUBNORMAL,
                    Just(f64::MAX),
                    Just(f64::MIN),
                    -1.0e6f64..1.0e6,
                ],
                prop_oneof![any::<i64>(), Just(i64::MIN), Just(i64::MAX)],
                prop_oneof![any::<i64>(), Just(i64::MIN), Just(i64::MAX)],
            ),
            2..12,
        ),
    ) {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customer_data.csv"));
        for (i, (avg, freq, lifespan)) in points.iter().enumerate() {
            app.add_customer(&RawCustomerFields::new(
                format!("C{i}"),
                "X",
                avg.to_string(),
                freq.to_string(),
                lifespan.to_string(),
            ))
            .unwrap();
        }

        match app.run_clustering() {
            Ok(result) => {
                prop_assert_eq!(result.labels.len(), points.len());
                prop_assert!(result.labels.iter().all(|&label| label < 3));
            }
            Err(SegmentError::Clustering { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
