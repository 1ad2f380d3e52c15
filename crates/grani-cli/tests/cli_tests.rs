//! CLI-level integration tests.
//!
//! The binary crate's command modules are not importable, so these tests
//! exercise the equivalent run logic through the underlying crates: the
//! trial loop the `search` command drives and the input sweep the `sort`
//! command generates.

// ============================================================================
// Search run loop
// ============================================================================

mod search_loop {
    use grani_adapter_sim::SimulatorBackend;
    use grani_hal::{Aggregate, Backend};
    use grani_ir::search;

    /// Equivalent to commands::search::execute's trial loop.
    async fn run_trials(trials: u32, shots: u32, target: &str) -> anyhow::Result<Aggregate> {
        let backend = SimulatorBackend::new();
        let mut aggregate = Aggregate::new(shots);

        for _ in 0..trials {
            let circuit = search::grover_eraser(target, search::DEFAULT_ITERATIONS)?;
            let job_id = backend.submit(&circuit, shots).await?;
            let result = backend.wait(&job_id).await?;
            aggregate.fold(&result.counts);
        }

        Ok(aggregate)
    }

    #[tokio::test]
    async fn test_single_trial_totals() {
        let aggregate = run_trials(1, 512, "011").await.unwrap();

        assert_eq!(aggregate.trials(), 1);
        assert_eq!(aggregate.total(), 512);
        assert_eq!(aggregate.total(), aggregate.expected_total());
    }

    #[tokio::test]
    async fn test_multi_trial_aggregation() {
        let aggregate = run_trials(3, 512, "011").await.unwrap();

        assert_eq!(aggregate.trials(), 3);
        assert_eq!(aggregate.total(), 3 * 512);

        // Two amplification rounds put ~94.5% on the target.
        assert!(aggregate.percentage("011") > 85.0);
        assert_eq!(aggregate.ranked()[0].0, "011");
    }

    #[tokio::test]
    async fn test_unamplified_target_reports_low_percentage() {
        // Amplify "011" but ask about "100": close to the 1/8 background.
        let aggregate = run_trials(2, 1024, "011").await.unwrap();
        assert!(aggregate.percentage("100") < 10.0);
    }

    #[tokio::test]
    async fn test_invalid_target_fails_before_submission() {
        let result = run_trials(1, 16, "0101").await;
        assert!(result.is_err());
    }
}

// ============================================================================
// Sort input sweep
// ============================================================================

mod sort_sweep {
    use grani_adapter_sim::SimulatorBackend;
    use grani_hal::Backend;
    use grani_ir::sort;

    /// Equivalent to commands::sort::execute's input selection.
    fn inputs(input: Option<&str>) -> Vec<String> {
        match input {
            Some(bits) => vec![bits.to_string()],
            None => (0..8).map(|i| format!("{i:03b}")).collect(),
        }
    }

    #[test]
    fn test_sweep_covers_all_inputs() {
        let all = inputs(None);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], "000");
        assert_eq!(all[5], "101");
        assert_eq!(all[7], "111");
    }

    #[test]
    fn test_explicit_input_is_single() {
        assert_eq!(inputs(Some("110")), vec!["110".to_string()]);
    }

    #[tokio::test]
    async fn test_sweep_runs_deterministically() {
        let backend = SimulatorBackend::new();

        for bits in inputs(None) {
            let circuit = sort::three_pass(&bits).unwrap();
            let job_id = backend.submit(&circuit, 32).await.unwrap();
            let result = backend.wait(&job_id).await.unwrap();

            // Classical circuit: a single outcome carries all shots.
            let (_, count) = result.counts.most_frequent().unwrap();
            assert_eq!(count, 32, "input {bits}");
        }
    }
}
