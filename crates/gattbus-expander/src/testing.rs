//! Scripted gateway used by the bus tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use gattbus_gateway::{
    BatchResponse, Command, CommandResponse, IoGateway, IoRequest, IoResponse, TransportError,
};
use serde_json::json;

use crate::endpoints::DATA_BUNDLE_UUID;

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    requests: RefCell<Vec<(String, IoRequest)>>,
    responses: RefCell<VecDeque<gattbus_gateway::Result<IoResponse>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_batch(&self, command_responses: Vec<Option<CommandResponse>>) {
        self.responses.borrow_mut().push_back(Ok(IoResponse {
            batch_responses: vec![BatchResponse { command_responses }],
        }));
    }

    /// A successful bundle write with the given result code.
    pub(crate) fn push_bundle_result(&self, code: i8) {
        self.push_batch(vec![
            Some(CommandResponse::Ok(Vec::new())),
            Some(CommandResponse::Ok(code.to_le_bytes().to_vec())),
        ]);
    }

    pub(crate) fn push_bundle_ok(&self) {
        self.push_bundle_result(0);
    }

    pub(crate) fn push_miso(&self, bytes: &[u8]) {
        self.push_batch(vec![Some(CommandResponse::Ok(bytes.to_vec()))]);
    }

    pub(crate) fn push_gateway_error(&self, message: &str) {
        self.push_batch(vec![
            Some(CommandResponse::Error(json!(message))),
            None,
        ]);
    }

    pub(crate) fn push_status(&self, status: u16) {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError::Status { status, body: None }));
    }

    pub(crate) fn requests(&self) -> Vec<(String, IoRequest)> {
        self.requests.borrow().clone()
    }

    /// Every control frame written to the data bundle characteristic, in order.
    pub(crate) fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.requests
            .borrow()
            .iter()
            .flat_map(|(_, request)| request.batches.iter())
            .flat_map(|batch| batch.commands.iter())
            .filter_map(|command| match command {
                Command::Write(write) if write.endpoint.characteristic_uuid == DATA_BUNDLE_UUID => {
                    Some(write.value.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl IoGateway for ScriptedGateway {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> gattbus_gateway::Result<IoResponse> {
        self.requests
            .borrow_mut()
            .push((adapter_id.to_string(), request.clone()));
        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(TransportError::Status {
                status: 599,
                body: Some("no scripted response".to_string()),
            })
        })
    }
}
