use std::ops::Deref;

use gattbus_frame::LockType;
use gattbus_gateway::IoGateway;
use tracing::warn;

use crate::bus::Expander;
use crate::error::Result;

/// Scoped access to an [`Expander`] that releases the device lock when dropped.
///
/// Bus operations acquire the lock inside their own frames. The session makes
/// sure `set_lock(Released)` is sent on every exit path, including early
/// returns and `?` propagation. Use [`release`](Self::release) to observe the
/// outcome of the release; on drop a failure is only logged.
pub struct BusSession<'a, G: IoGateway> {
    expander: &'a Expander<G>,
    released: bool,
}

impl<'a, G: IoGateway> BusSession<'a, G> {
    pub(crate) fn new(expander: &'a Expander<G>) -> Self {
        Self {
            expander,
            released: false,
        }
    }

    /// Release the lock now and report the result.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.expander.set_lock(LockType::Released)
    }
}

impl<G: IoGateway> Deref for BusSession<'_, G> {
    type Target = Expander<G>;

    fn deref(&self) -> &Self::Target {
        self.expander
    }
}

impl<G: IoGateway> Drop for BusSession<'_, G> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.expander.set_lock(LockType::Released) {
            warn!(
                peripheral = %self.expander.peripheral_address(),
                error = %err,
                "failed to release expander lock"
            );
        }
    }
}
