//! Channel/interface resolution.
//!
//! Maps a capture kind and an optional channel filter onto the concrete
//! (interface, channel) targets the run will iterate. Device-wide kinds
//! always resolve to the single synthetic target, ignoring any filter.

use pnm_core::{CaptureKind, ChannelTarget, CmDevice, ServiceStatus};
use tracing::debug;

use crate::StageFailure;

/// Resolve the ordered channel targets for one capture kind.
///
/// For per-direction kinds the device is queried for its full channel
/// stack; a supplied filter intersects by channel id preserving device
/// order. An empty device stack is the distinct `NO_CHANNELS_OF_KIND`
/// failure; an empty intersection is an empty (not error) result.
pub async fn resolve(
    device: &dyn CmDevice,
    kind: CaptureKind,
    filter: Option<&[u32]>,
) -> Result<Vec<ChannelTarget>, StageFailure> {
    let Some(direction) = kind.direction() else {
        return Ok(vec![ChannelTarget::DEVICE_WIDE]);
    };

    let stack = device
        .channel_stack(direction)
        .await
        .map_err(StageFailure::comm)?;

    if stack.is_empty() {
        return Err(StageFailure::new(
            ServiceStatus::NoChannelsOfKind,
            format!("device reports no {direction:?} channels for {kind:?}"),
        ));
    }

    let targets = match filter {
        None => stack,
        Some(ids) => stack
            .into_iter()
            .filter(|t| ids.contains(&t.channel_id))
            .collect(),
    };

    debug!(?kind, count = targets.len(), "resolved channel targets");
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::Direction;
    use pnm_device_mock::MockCmDevice;

    fn device_with_downstream() -> MockCmDevice {
        MockCmDevice::builder()
            .channel_stack(Direction::Downstream, [(3, 1), (4, 2), (5, 3)])
            .build()
    }

    #[tokio::test]
    async fn test_unfiltered_resolve_returns_device_order() {
        let device = device_with_downstream();
        let targets = resolve(&device, CaptureKind::RxMer, None).await.unwrap();
        assert_eq!(
            targets,
            vec![
                ChannelTarget::new(3, 1),
                ChannelTarget::new(4, 2),
                ChannelTarget::new(5, 3),
            ]
        );
    }

    #[tokio::test]
    async fn test_filter_intersects_preserving_device_order() {
        let device = device_with_downstream();
        let targets = resolve(&device, CaptureKind::RxMer, Some(&[3, 1]))
            .await
            .unwrap();
        assert_eq!(
            targets,
            vec![ChannelTarget::new(3, 1), ChannelTarget::new(5, 3)]
        );
    }

    #[tokio::test]
    async fn test_filter_with_no_matches_is_empty_not_error() {
        let device = device_with_downstream();
        let targets = resolve(&device, CaptureKind::RxMer, Some(&[99]))
            .await
            .unwrap();
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn test_empty_stack_is_distinct_failure() {
        let device = MockCmDevice::builder().build();
        let err = resolve(&device, CaptureKind::UsPreEq, None).await.unwrap_err();
        assert_eq!(err.code, ServiceStatus::NoChannelsOfKind);
    }

    #[tokio::test]
    async fn test_device_wide_kind_ignores_filter() {
        let device = MockCmDevice::builder().build();
        let targets = resolve(&device, CaptureKind::Histogram, Some(&[7]))
            .await
            .unwrap();
        assert_eq!(targets, vec![ChannelTarget::DEVICE_WIDE]);
    }
}
