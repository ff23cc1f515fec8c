//! Next-measurement selection shared by both servers.

use contracts::StreamKind;

/// Pick the stream whose pending measurement comes first
///
/// `None` arguments mean the stream has nothing available. The earliest
/// stamp wins; on exactly equal stamps the priority Image > Imu > Attitude
/// decides. Returns [`StreamKind::None`] when no stream has anything.
pub fn select_next(image: Option<f64>, imu: Option<f64>, attitude: Option<f64>) -> StreamKind {
    let candidates = [
        (StreamKind::Image, image),
        (StreamKind::Imu, imu),
        (StreamKind::Attitude, attitude),
    ];

    let mut best: Option<(StreamKind, f64)> = None;
    for (kind, stamp) in candidates {
        let Some(stamp) = stamp else {
            continue;
        };
        match best {
            // Strictly earlier only: equal stamps keep the higher-priority stream
            Some((_, best_stamp)) if best_stamp <= stamp => {}
            _ => best = Some((kind, stamp)),
        }
    }

    best.map_or(StreamKind::None, |(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_when_nothing_available() {
        assert_eq!(select_next(None, None, None), StreamKind::None);
    }

    #[test]
    fn test_single_stream() {
        assert_eq!(select_next(Some(5.0), None, None), StreamKind::Image);
        assert_eq!(select_next(None, Some(5.0), None), StreamKind::Imu);
        assert_eq!(select_next(None, None, Some(5.0)), StreamKind::Attitude);
    }

    #[test]
    fn test_earliest_wins() {
        assert_eq!(select_next(Some(2.0), Some(1.0), Some(3.0)), StreamKind::Imu);
        assert_eq!(select_next(Some(2.0), Some(1.0), Some(0.5)), StreamKind::Attitude);
        assert_eq!(select_next(Some(0.1), Some(1.0), Some(0.5)), StreamKind::Image);
    }

    #[test]
    fn test_pairwise_ties() {
        assert_eq!(select_next(Some(1.0), Some(1.0), None), StreamKind::Image);
        assert_eq!(select_next(Some(1.0), None, Some(1.0)), StreamKind::Image);
        assert_eq!(select_next(None, Some(1.0), Some(1.0)), StreamKind::Imu);
    }

    #[test]
    fn test_three_way_tie() {
        assert_eq!(select_next(Some(1.0), Some(1.0), Some(1.0)), StreamKind::Image);
    }

    #[test]
    fn test_tie_behind_earlier_stream() {
        // Imu/Attitude tie is irrelevant when Image is strictly earlier
        assert_eq!(select_next(Some(0.5), Some(1.0), Some(1.0)), StreamKind::Image);
        // Image/Imu tie loses to a strictly earlier attitude
        assert_eq!(select_next(Some(1.0), Some(1.0), Some(0.9)), StreamKind::Attitude);
    }
}
