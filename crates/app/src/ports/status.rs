//! Status port — one-off component status queries.

use std::future::{self, Future};
use std::sync::Arc;

use autolight_domain::id::DeviceRef;
use autolight_domain::platform::DeviceStatus;

/// Answers "what is this component reporting right now?".
///
/// Used once at startup to seed the motion reading. `None` means the
/// platform had no status to give; the caller decides whether to ask again.
pub trait StatusSource: Send + Sync {
    fn query_status(
        &self,
        device: DeviceRef,
    ) -> impl Future<Output = Option<DeviceStatus>> + Send;
}

impl<T: StatusSource> StatusSource for Arc<T> {
    fn query_status(
        &self,
        device: DeviceRef,
    ) -> impl Future<Output = Option<DeviceStatus>> + Send {
        (**self).query_status(device)
    }
}

/// Placeholder source for hosts that cannot answer status queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStatusSource;

impl StatusSource for NoStatusSource {
    fn query_status(
        &self,
        _device: DeviceRef,
    ) -> impl Future<Output = Option<DeviceStatus>> + Send {
        future::ready(None)
    }
}
