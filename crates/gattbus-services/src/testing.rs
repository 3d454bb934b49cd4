//! Recording gateway used by the service tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use gattbus_gateway::{
    BatchResponse, CommandResponse, IoGateway, IoRequest, IoResponse, TransportError,
};

#[derive(Default)]
pub(crate) struct RecordingGateway {
    requests: RefCell<Vec<(String, IoRequest)>>,
    responses: RefCell<VecDeque<IoResponse>>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, batches: Vec<Vec<Option<CommandResponse>>>) {
        self.responses.borrow_mut().push_back(IoResponse {
            batch_responses: batches
                .into_iter()
                .map(|command_responses| BatchResponse { command_responses })
                .collect(),
        });
    }

    /// Answer every command of the next request with an empty `Ok`.
    pub(crate) fn push_all_ok(&self, shape: &[usize]) {
        self.push(
            shape
                .iter()
                .map(|&len| vec![Some(CommandResponse::Ok(Vec::new())); len])
                .collect(),
        );
    }

    pub(crate) fn requests(&self) -> Vec<(String, IoRequest)> {
        self.requests.borrow().clone()
    }
}

impl IoGateway for RecordingGateway {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> gattbus_gateway::Result<IoResponse> {
        self.requests
            .borrow_mut()
            .push((adapter_id.to_string(), request.clone()));
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or(TransportError::Status {
                status: 599,
                body: None,
            })
    }
}

pub(crate) fn ok(value: &[u8]) -> Option<CommandResponse> {
    Some(CommandResponse::Ok(value.to_vec()))
}
