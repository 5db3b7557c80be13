//! Capability check and device acquisition shared by both hosts.
//!
//! These are the only two start-up failures the user is told about. Each one
//! produces exactly one [`Notifier::notify`] call and initialisation stops;
//! there is no retry and no fallback rendering path.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, error};

/// Start-up failures that are surfaced to the user.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("{reason}")]
    Unsupported { reason: &'static str },
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to get GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Host capabilities needed before any GPU object exists.
pub trait Platform {
    /// Device, queue and surface produced by a successful acquisition.
    type Gpu;

    /// Message shown when [`Platform::has_gpu_support`] is false.
    const UNSUPPORTED_REASON: &'static str;

    fn has_gpu_support(&self) -> bool;

    /// Requests an adapter and a device and configures the presentation surface.
    fn acquire_gpu(self) -> impl Future<Output = Result<Self::Gpu, InitError>>;
}

/// Shows a blocking, user-visible message.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Runs the capability check and device acquisition.
///
/// On failure the notifier has already been called once when this returns.
pub async fn bootstrap<P, N>(platform: P, notifier: &mut N) -> Result<P::Gpu, InitError>
where
    P: Platform,
    N: Notifier + ?Sized,
{
    if !platform.has_gpu_support() {
        let err = InitError::Unsupported {
            reason: P::UNSUPPORTED_REASON,
        };
        error!(error = %err, "GPU capability check failed");
        notifier.notify(&err.to_string());
        return Err(err);
    }

    match platform.acquire_gpu().await {
        Ok(gpu) => {
            debug!("GPU device acquired");
            Ok(gpu)
        }
        Err(err) => {
            error!(error = %err, "GPU device acquisition failed");
            notifier.notify(&err.to_string());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Vec<String>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    struct FakePlatform {
        supported: bool,
        acquisition_succeeds: bool,
        acquisitions: Rc<Cell<usize>>,
    }

    impl FakePlatform {
        fn new(supported: bool, acquisition_succeeds: bool) -> (Self, Rc<Cell<usize>>) {
            let acquisitions = Rc::new(Cell::new(0));
            let platform = Self {
                supported,
                acquisition_succeeds,
                acquisitions: Rc::clone(&acquisitions),
            };
            (platform, acquisitions)
        }
    }

    impl Platform for FakePlatform {
        type Gpu = &'static str;

        const UNSUPPORTED_REASON: &'static str = "no GPU here";

        fn has_gpu_support(&self) -> bool {
            self.supported
        }

        async fn acquire_gpu(self) -> Result<Self::Gpu, InitError> {
            self.acquisitions.set(self.acquisitions.get() + 1);
            if self.acquisition_succeeds {
                Ok("device")
            } else {
                Err(InitError::Unsupported {
                    reason: "adapter request returned nothing",
                })
            }
        }
    }

    #[test]
    fn missing_capability_notifies_once_and_never_acquires() {
        let (platform, acquisitions) = FakePlatform::new(false, true);
        let mut notifier = RecordingNotifier::default();

        let result = pollster::block_on(bootstrap(platform, &mut notifier));

        assert!(matches!(result, Err(InitError::Unsupported { .. })));
        assert_eq!(acquisitions.get(), 0);
        assert_eq!(notifier.messages, vec!["no GPU here".to_string()]);
    }

    #[test]
    fn failed_acquisition_notifies_once() {
        let (platform, acquisitions) = FakePlatform::new(true, false);
        let mut notifier = RecordingNotifier::default();

        let result = pollster::block_on(bootstrap(platform, &mut notifier));

        assert!(result.is_err());
        assert_eq!(acquisitions.get(), 1);
        assert_eq!(notifier.messages.len(), 1);
        assert_eq!(notifier.messages[0], "adapter request returned nothing");
    }

    #[test]
    fn successful_start_is_silent() {
        let (platform, _) = FakePlatform::new(true, true);
        let mut notifier = RecordingNotifier::default();

        let gpu = pollster::block_on(bootstrap(platform, &mut notifier)).unwrap();

        assert_eq!(gpu, "device");
        assert!(notifier.messages.is_empty());
    }
}
