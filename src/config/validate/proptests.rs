//! Property-based tests for configuration validation

use super::validator::validate_config;
use crate::config::RunConfig;
use proptest::prelude::*;

fn arb_valid_config() -> impl Strategy<Value = RunConfig> {
    (
        1usize..200,  // epochs
        1usize..200,  // steps_per_epoch
        1usize..2048, // batch_size
        1usize..15,   // nb_layers
        0.0f32..0.99, // dropout
        1e-6f32..1.0, // learning_rate
        1e-3f32..1e3, // mixup_alpha
    )
        .prop_map(|(epochs, steps_per_epoch, batch_size, nb_layers, dropout, learning_rate, mixup_alpha)| {
            RunConfig {
                epochs,
                steps_per_epoch,
                batch_size,
                nb_layers,
                dropout,
                learning_rate,
                mixup_alpha,
                ..RunConfig::default()
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_config_passes(config in arb_valid_config(), classes in prop::sample::select(vec![10usize, 100])) {
        prop_assert!(validate_config(&config, classes).is_ok());
    }

    #[test]
    fn prop_unsupported_class_count_fails(classes in 0usize..1000) {
        prop_assume!(classes != 10 && classes != 100);
        prop_assert!(validate_config(&RunConfig::default(), classes).is_err());
    }

    #[test]
    fn prop_dropout_of_one_or_more_fails(dropout in 1.0f32..10.0) {
        let config = RunConfig { dropout, ..RunConfig::default() };
        prop_assert!(validate_config(&config, 10).is_err());
    }
}
