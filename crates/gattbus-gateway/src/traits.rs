use std::sync::Arc;

use crate::error::Result;
use crate::model::{IoRequest, IoResponse};

/// Something that can execute a batched IO request against a BLE adapter.
///
/// Implementations block until the complete response is available and hand
/// it back as received. Callers verify it against the request with
/// [`IoResponse::check_shape`].
pub trait IoGateway {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> Result<IoResponse>;
}

impl<T: IoGateway + ?Sized> IoGateway for &T {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> Result<IoResponse> {
        (**self).execute(adapter_id, request)
    }
}

impl<T: IoGateway + ?Sized> IoGateway for Box<T> {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> Result<IoResponse> {
        (**self).execute(adapter_id, request)
    }
}

impl<T: IoGateway + ?Sized> IoGateway for Arc<T> {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> Result<IoResponse> {
        (**self).execute(adapter_id, request)
    }
}
