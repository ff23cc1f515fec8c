//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract behaviour shared by both servers
//! - Config file -> server -> merged feed
//! - Ordering and exactly-once properties

#[cfg(test)]
mod support {
    use contracts::{DataServer, Stamped, StreamKind};

    /// Drain a server through explicit `next_kind` / `take_*` calls
    pub fn collect(server: &mut dyn DataServer) -> Vec<(StreamKind, f64)> {
        let mut out = Vec::new();
        loop {
            let kind = server.next_kind();
            let stamp = match kind {
                StreamKind::Image => server.take_image().unwrap().stamp(),
                StreamKind::Imu => server.take_imu().unwrap().stamp(),
                StreamKind::Attitude => server.take_attitude().unwrap().stamp(),
                StreamKind::None => break,
            };
            out.push((kind, stamp));
        }
        out
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{DataServer, DataServerError, QueueCapacities, StreamKind};
    use data_server::{SimpleDataServer, ThreadedDataServer};
    use ingestion::FixtureSource;

    use crate::support::collect;

    fn worked_example() -> FixtureSource {
        FixtureSource::from_stamps(&[0.0, 2.0], &[0.1, 0.5, 1.0], &[1.0])
    }

    fn servers(source: impl Fn() -> FixtureSource) -> Vec<Box<dyn DataServer>> {
        vec![
            Box::new(SimpleDataServer::new(source())),
            Box::new(ThreadedDataServer::new(source(), QueueCapacities::default()).unwrap()),
            Box::new(ThreadedDataServer::new(source(), QueueCapacities::uniform(1)).unwrap()),
        ]
    }

    #[test]
    fn test_worked_example_all_servers() {
        let expected = vec![
            (StreamKind::Image, 0.0),
            (StreamKind::Imu, 0.1),
            (StreamKind::Imu, 0.5),
            (StreamKind::Imu, 1.0),
            (StreamKind::Attitude, 1.0),
            (StreamKind::Image, 2.0),
        ];
        for mut server in servers(worked_example) {
            assert_eq!(collect(server.as_mut()), expected);
            assert_eq!(server.next_kind(), StreamKind::None);
            assert!(server.next_stamp().is_nan());
        }
    }

    #[test]
    fn test_tie_breaks_all_servers() {
        let tied = || FixtureSource::from_stamps(&[1.0, 2.0], &[1.0, 2.0], &[1.0, 2.0]);
        for mut server in servers(tied) {
            let kinds: Vec<_> = collect(server.as_mut()).into_iter().map(|(k, _)| k).collect();
            assert_eq!(
                kinds,
                vec![
                    StreamKind::Image,
                    StreamKind::Imu,
                    StreamKind::Attitude,
                    StreamKind::Image,
                    StreamKind::Imu,
                    StreamKind::Attitude,
                ]
            );
        }

        let imu_attitude = || FixtureSource::from_stamps(&[], &[0.5], &[0.5]);
        for mut server in servers(imu_attitude) {
            assert_eq!(server.next_kind(), StreamKind::Imu);
            server.take_imu().unwrap();
            assert_eq!(server.next_kind(), StreamKind::Attitude);
        }
    }

    #[test]
    fn test_none_only_when_every_stream_is_exhausted() {
        let single = || FixtureSource::from_stamps(&[], &[], &[3.0]);
        for mut server in servers(single) {
            assert_eq!(server.next_kind(), StreamKind::Attitude);
            assert_eq!(server.next_stamp(), 3.0);
            server.take_attitude().unwrap();
            assert_eq!(server.next_kind(), StreamKind::None);
        }

        for server in servers(FixtureSource::default) {
            assert_eq!(server.next_kind(), StreamKind::None);
        }
    }

    #[test]
    fn test_wrong_take_is_reported_by_all_servers() {
        for mut server in servers(worked_example) {
            assert_eq!(server.next_kind(), StreamKind::Image);
            let err = server.take_attitude().unwrap_err();
            assert_eq!(
                err,
                DataServerError::contract_violation(StreamKind::Attitude, StreamKind::Image)
            );
            // The feed is intact afterwards
            assert_eq!(collect(server.as_mut()).len(), 6);
            assert!(server.take_image().is_err());
        }
    }

    #[test]
    fn test_take_next_and_drain_agree() {
        for mut server in servers(worked_example) {
            let first = server.take_next().unwrap().unwrap();
            assert_eq!(first.kind(), StreamKind::Image);
            let rest: Vec<_> = server.drain().map(|m| m.unwrap().kind()).collect();
            assert_eq!(rest.len(), 5);
            assert!(server.take_next().unwrap().is_none());
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::{Duration, Instant};

    use config_loader::ConfigLoader;
    use contracts::{
        DataServer, DataServerConfig, Measurement, QueueCapacities, ServerMode, Stamped,
        StreamKind,
    };
    use data_server::{create_data_server, ThreadedDataServer};
    use ingestion::{SyntheticConfig, SyntheticSource, ThrottledSource};
    use observability::MergeStatsAggregator;

    use crate::support::collect;

    fn synthetic(seed: u64) -> SyntheticSource {
        SyntheticSource::new(SyntheticConfig {
            duration_s: 2.0,
            jitter_s: 0.001,
            seed,
            ..SyntheticConfig::default()
        })
        .unwrap()
    }

    /// End-to-end: config file -> create_data_server -> merged feed
    #[test]
    fn test_config_file_drives_server() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "mode = \"threaded\"\n\n[queues]\nimage = 2\nimu = 5\nattitude = 3"
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.queues, QueueCapacities { image: 2, imu: 5, attitude: 3 });

        let source = synthetic(7);
        let expected = source.total_count();
        let mut server = create_data_server(&config, source).unwrap();

        let mut stats = MergeStatsAggregator::new();
        for measurement in server.drain() {
            stats.update(&measurement.unwrap());
        }
        assert_eq!(stats.total, expected);
        assert_eq!(stats.order_violations, 0);
    }

    #[test]
    fn test_simple_and_threaded_match_on_synthetic_source() {
        let simple = DataServerConfig {
            mode: ServerMode::Simple,
            ..DataServerConfig::default()
        };
        let reference = collect(create_data_server(&simple, synthetic(3)).unwrap().as_mut());

        for capacity in [1, 2, 1000] {
            let threaded = DataServerConfig {
                mode: ServerMode::Threaded,
                queues: QueueCapacities::uniform(capacity),
            };
            let mut server = create_data_server(&threaded, synthetic(3)).unwrap();
            assert_eq!(collect(server.as_mut()), reference, "capacity {capacity}");
        }
    }

    #[test]
    fn test_exactly_once_per_stream() {
        let config = SyntheticConfig {
            duration_s: 1.0,
            ..SyntheticConfig::default()
        };
        for capacity in [1, 2, 64] {
            let source = SyntheticSource::new(config.clone()).unwrap();
            let mut server =
                ThreadedDataServer::new(source, QueueCapacities::uniform(capacity)).unwrap();

            let mut per_stream: Vec<Vec<f64>> = vec![Vec::new(); 3];
            for measurement in server.drain() {
                let measurement: Measurement = measurement.unwrap();
                let index = StreamKind::STREAMS
                    .iter()
                    .position(|&k| k == measurement.kind())
                    .unwrap();
                per_stream[index].push(measurement.stamp());
            }

            for (kind, stamps) in StreamKind::STREAMS.iter().zip(&per_stream) {
                assert_eq!(stamps.len() as u64, config.expected_count(*kind));
                assert!(stamps.windows(2).all(|w| w[0] < w[1]), "{kind} duplicated");
            }
        }
    }

    #[test]
    fn test_drop_with_slow_source_returns_promptly() {
        let source = ThrottledSource::new(synthetic(1), Duration::from_millis(50));
        let metrics = source.metrics();

        let started = Instant::now();
        let server = ThreadedDataServer::new(source, QueueCapacities::default()).unwrap();
        drop(server);

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(metrics.snapshot().total() < 10);
    }

    #[test]
    fn test_partial_consumption_then_drop() {
        let mut server = ThreadedDataServer::new(synthetic(2), QueueCapacities::uniform(4)).unwrap();
        for _ in 0..25 {
            assert!(server.take_next().unwrap().is_some());
        }
        drop(server);
    }
}

#[cfg(test)]
mod property_tests {
    use contracts::{DataServer, QueueCapacities, StreamKind};
    use data_server::{SimpleDataServer, ThreadedDataServer};
    use ingestion::FixtureSource;
    use proptest::prelude::*;

    use crate::support::collect;

    /// Sorted stamps on a coarse grid so cross-stream ties are common
    fn stamps() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0u16..200, 0..40).prop_map(|mut ticks| {
            ticks.sort_unstable();
            ticks.into_iter().map(|t| f64::from(t) * 0.05).collect()
        })
    }

    fn fixture(image: &[f64], imu: &[f64], attitude: &[f64]) -> FixtureSource {
        FixtureSource::from_stamps(image, imu, attitude)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn merged_feed_is_ordered_and_complete(
            image in stamps(),
            imu in stamps(),
            attitude in stamps(),
            capacity in 1usize..6,
        ) {
            let mut simple = SimpleDataServer::new(fixture(&image, &imu, &attitude));
            let reference = collect(&mut simple);

            prop_assert_eq!(reference.len(), image.len() + imu.len() + attitude.len());
            prop_assert!(reference.windows(2).all(|w| w[0].1 <= w[1].1));
            // Equal stamps come out in priority order
            prop_assert!(reference
                .windows(2)
                .all(|w| w[0].1 < w[1].1 || w[0].0 <= w[1].0));

            for (kind, stamps) in StreamKind::STREAMS.iter().zip([&image, &imu, &attitude]) {
                let delivered: Vec<f64> = reference
                    .iter()
                    .filter(|(k, _)| k == kind)
                    .map(|(_, s)| *s)
                    .collect();
                prop_assert_eq!(&delivered, stamps);
            }

            let mut threaded = ThreadedDataServer::new(
                fixture(&image, &imu, &attitude),
                QueueCapacities::uniform(capacity),
            )
            .unwrap();
            prop_assert_eq!(collect(&mut threaded), reference);
            prop_assert_eq!(threaded.next_kind(), StreamKind::None);
        }
    }
}
