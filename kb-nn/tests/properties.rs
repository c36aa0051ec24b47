//! Property tests for network inference.

use kb_core::seeded_rng;
use kb_nn::FeedforwardNetwork;
use proptest::prelude::*;

fn input_strategy(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e3f64..1.0e3, len)
}

proptest! {
    // Outputs always lie strictly inside (0,1), whatever the (finite) input.
    #[test]
    fn outputs_bounded(seed in any::<u64>(), x in input_strategy(12)) {
        let net = FeedforwardNetwork::new(12, 24, 8, 0.1, &mut seeded_rng(seed)).unwrap();
        let y = net.predict(&x).unwrap();
        prop_assert_eq!(y.len(), 8);
        for v in y {
            prop_assert!(v > 0.0 && v < 1.0, "v={}", v);
        }
    }

    // Inference has no hidden state.
    #[test]
    fn predict_deterministic(seed in any::<u64>(), x in input_strategy(18)) {
        let net = FeedforwardNetwork::new(18, 36, 6, 0.1, &mut seeded_rng(seed)).unwrap();
        let a = net.predict(&x).unwrap();
        let b = net.predict(&x).unwrap();
        prop_assert_eq!(a, b);
    }

    // Training on normalized inputs never produces NaN.
    #[test]
    fn training_stays_finite(seed in any::<u64>(), x in prop::collection::vec(0.0f64..=1.0, 12), label in 0usize..8) {
        let mut net = FeedforwardNetwork::new(12, 24, 8, 0.1, &mut seeded_rng(seed)).unwrap();
        let mut t = vec![0.0; 8];
        t[label] = 1.0;
        let stats = net.train_batch(&[(x.clone(), t)], 5).unwrap();
        prop_assert!(stats.last_epoch_mse.is_finite());
        for v in net.predict(&x).unwrap() {
            prop_assert!(v.is_finite());
        }
    }
}
