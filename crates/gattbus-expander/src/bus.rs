use gattbus_frame::{BusCommand, ControlFrame, LockType, ResultCode};
use gattbus_gateway::{Batch, BatchResponse, Command, Endpoint, IoGateway, IoRequest};
use tracing::{debug, info};

use crate::config::ExpanderConfig;
use crate::endpoints::{DATA_BUNDLE_UUID, MISO_UUID, RESULT_UUID, SERVICE_UUID};
use crate::error::{ExpanderError, Result};
use crate::message::I2cMessage;
use crate::session::BusSession;

const BUNDLE_BATCH_PARALLELISM: u32 = 32;
const BUNDLE_REQUEST_PARALLELISM: u32 = 16;

/// An I2C master emulated by one expander peripheral.
///
/// Every operation is a blocking round trip through the gateway. Nothing is
/// cached between calls: the device's lock and power registers are the only
/// state, and they are not mirrored here. Operations take the bus lock as part
/// of their frame but never release it; use [`session`](Self::session) to get
/// a guard that does.
///
/// There is no local mutual exclusion. Two callers sharing one peripheral must
/// coordinate through the device lock.
pub struct Expander<G> {
    gateway: G,
    adapter_id: String,
    peripheral_address: String,
    config: ExpanderConfig,
}

impl<G: IoGateway> Expander<G> {
    /// Create a bus for `peripheral_address` behind `adapter_id` with default settings.
    pub fn new(
        gateway: G,
        adapter_id: impl Into<String>,
        peripheral_address: impl Into<String>,
    ) -> Self {
        Self::with_config(
            gateway,
            adapter_id,
            peripheral_address,
            ExpanderConfig::default(),
        )
    }

    /// Create a bus with explicit configuration.
    pub fn with_config(
        gateway: G,
        adapter_id: impl Into<String>,
        peripheral_address: impl Into<String>,
        config: ExpanderConfig,
    ) -> Self {
        Self {
            gateway,
            adapter_id: adapter_id.into(),
            peripheral_address: peripheral_address.into(),
            config,
        }
    }

    pub fn adapter_id(&self) -> &str {
        &self.adapter_id
    }

    pub fn peripheral_address(&self) -> &str {
        &self.peripheral_address
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Borrow the bus behind a guard that releases the device lock on drop.
    pub fn session(&self) -> BusSession<'_, G> {
        BusSession::new(self)
    }

    fn endpoint(&self, characteristic_uuid: &str) -> Endpoint {
        Endpoint::new(&self.peripheral_address, SERVICE_UUID, characteristic_uuid)
    }

    /// Execute a one-batch request and fail on the first errored command.
    fn execute_batch(&self, request: &IoRequest) -> Result<BatchResponse> {
        let response = self.gateway.execute(&self.adapter_id, request)?;
        response.check_shape(request)?;

        let batch = response
            .batch_responses
            .into_iter()
            .next()
            .unwrap_or_default();
        if let Some((position, error)) = batch.first_error() {
            return Err(ExpanderError::BatchExecution {
                position,
                error: error.clone(),
            });
        }
        Ok(batch)
    }

    /// Write a control frame and read back its result code.
    ///
    /// The write and the result read travel in one batch, write first, so the
    /// result always belongs to this frame.
    pub fn set_bundle(&self, frame: &ControlFrame) -> Result<ResultCode> {
        let timeout = self.config.timeout;
        let request = IoRequest::single(
            Batch::new([
                Command::write(
                    self.endpoint(DATA_BUNDLE_UUID),
                    frame.to_bytes().to_vec(),
                    false,
                    timeout,
                ),
                Command::read(self.endpoint(RESULT_UUID), true, timeout),
            ])
            .with_parallelism(BUNDLE_BATCH_PARALLELISM),
        )
        .with_parallelism(BUNDLE_REQUEST_PARALLELISM);

        let batch = self.execute_batch(&request)?;
        let value = batch
            .get(1)
            .and_then(|response| response.as_ok())
            .ok_or(ExpanderError::MissingResponse { position: 1 })?;
        let code = ResultCode::from_le_bytes(value)?;

        debug!(
            peripheral = %self.peripheral_address,
            command_id = code.command_id(),
            raw = code.raw(),
            "expander result"
        );

        if !code.is_success() {
            return Err(ExpanderError::Protocol {
                command_id: code.command_id(),
                name: code.command_name(),
            });
        }
        Ok(code)
    }

    /// Read the MISO characteristic as-is.
    pub fn read_miso(&self) -> Result<Vec<u8>> {
        let request = IoRequest::single(Batch::new([Command::read(
            self.endpoint(MISO_UUID),
            false,
            self.config.timeout,
        )]));

        let batch = self.execute_batch(&request)?;
        batch
            .get(0)
            .and_then(|response| response.as_ok())
            .map(<[u8]>::to_vec)
            .ok_or(ExpanderError::MissingResponse { position: 0 })
    }

    /// Drive the chip-select line.
    pub fn set_cs(&self, cs: u8) -> Result<()> {
        self.set_bundle(&ControlFrame::new().cs(cs))?;
        Ok(())
    }

    /// Set the device lock. `LockType::Released` frees the bus.
    pub fn set_lock(&self, lock: LockType) -> Result<()> {
        self.set_bundle(&ControlFrame::new().lock(lock))?;
        Ok(())
    }

    /// Switch bus power.
    pub fn set_power(&self, on: bool) -> Result<()> {
        self.set_bundle(
            &ControlFrame::new()
                .power(on)
                .power_wait(self.config.power_wait),
        )?;
        Ok(())
    }

    /// Full-duplex transfer under an exclusive lock. Returns MISO untruncated.
    pub fn xfer(&self, buf: &[u8]) -> Result<Vec<u8>> {
        let frame = ControlFrame::new()
            .lock(LockType::Exclusive)
            .power(true)
            .power_wait(self.config.power_wait)
            .command(BusCommand::Transfer)
            .write_payload(buf.to_vec())?;
        debug!(len = buf.len(), "expander xfer");
        self.set_bundle(&frame)?;
        self.read_miso()
    }

    /// Addresses of every device that answered a bus scan.
    pub fn scan_i2c(&self) -> Result<Vec<u8>> {
        let frame = ControlFrame::new()
            .lock(LockType::Shared)
            .power(true)
            .power_wait(self.config.power_wait)
            .command(BusCommand::Scan)
            .address(0)
            .size_write(0)
            .mosi(Vec::<u8>::new());
        debug!("expander scan");
        self.set_bundle(&frame)?;

        let mut table = self.read_miso()?;
        table.retain(|&address| address != 0);
        Ok(table)
    }

    /// Write `buf` to the device at `address`.
    pub fn write(&self, address: u8, buf: &[u8]) -> Result<()> {
        let frame = ControlFrame::new()
            .lock(LockType::Shared)
            .power(true)
            .power_wait(self.config.power_wait)
            .command(BusCommand::Write)
            .address(address)
            .write_payload(buf.to_vec())?;
        debug!(address, len = buf.len(), "expander write");
        self.set_bundle(&frame)?;
        Ok(())
    }

    /// Read `size` bytes from the device at `address`.
    pub fn read(&self, address: u8, size: usize) -> Result<Vec<u8>> {
        let frame = ControlFrame::new()
            .lock(LockType::Shared)
            .power(true)
            .command(BusCommand::Read)
            .address(address)
            .read_len(size)?;
        debug!(address, size, "expander read");
        self.set_bundle(&frame)?;

        let mut data = self.read_miso()?;
        data.truncate(size);
        Ok(data)
    }

    /// Write `buf` then read `size_read` bytes in one bus transaction.
    pub fn write_read(&self, address: u8, buf: &[u8], size_read: usize) -> Result<Vec<u8>> {
        let frame = ControlFrame::new()
            .lock(LockType::Shared)
            .power(true)
            .command(BusCommand::Transfer)
            .address(address)
            .read_len(size_read)?
            .write_payload(buf.to_vec())?;
        debug!(address, len = buf.len(), size_read, "expander write_read");
        self.set_bundle(&frame)?;

        let mut data = self.read_miso()?;
        data.truncate(size_read);
        Ok(data)
    }

    /// Run `messages` in order, one bus call each.
    ///
    /// Read messages get their buffer replaced with the bytes read. The first
    /// failure stops the transaction; later messages are not sent.
    pub fn i2c_transaction(&self, messages: &mut [I2cMessage]) -> Result<()> {
        for (index, message) in messages.iter_mut().enumerate() {
            match message {
                I2cMessage::Write { address, buf } => {
                    self.write(*address, buf)?;
                    info!(index, address = *address, len = buf.len(), "i2c write");
                }
                I2cMessage::Read { address, size, buf } => {
                    *buf = self.read(*address, *size)?;
                    info!(index, address = *address, size = *size, data = ?buf, "i2c read");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gattbus_gateway::{CommandResponse, TransportError};

    use super::*;
    use crate::testing::ScriptedGateway;

    const PERIPHERAL: &str = "FA:6F:EC:EE:4B:36";

    fn expander(gateway: &ScriptedGateway) -> Expander<&ScriptedGateway> {
        Expander::new(gateway, "hci0", PERIPHERAL)
    }

    #[test]
    fn set_bundle_writes_then_reads_result_in_one_batch() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_result(6);

        let frame = ControlFrame::new().lock(LockType::Shared);
        let code = expander(&gateway).set_bundle(&frame).unwrap();
        assert_eq!(code.command_id(), 6);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        let (adapter, request) = &requests[0];
        assert_eq!(adapter, "hci0");
        assert_eq!(request.parallelism.get(), 16);
        assert_eq!(request.batches.len(), 1);

        let batch = &request.batches[0];
        assert_eq!(batch.parallelism.get(), 32);
        assert_eq!(batch.commands.len(), 2);
        match &batch.commands[0] {
            Command::Write(write) => {
                assert_eq!(write.endpoint.peripheral_address, PERIPHERAL);
                assert_eq!(write.endpoint.service_uuid, SERVICE_UUID);
                assert_eq!(write.endpoint.characteristic_uuid, DATA_BUNDLE_UUID);
                assert_eq!(write.value, frame.to_bytes().to_vec());
                assert!(!write.wait_response);
                assert_eq!(write.timeout_ms, 5000);
            }
            other => panic!("expected write first, got {other:?}"),
        }
        match &batch.commands[1] {
            Command::Read(read) => {
                assert_eq!(read.endpoint.characteristic_uuid, RESULT_UUID);
                assert!(read.wait_notification);
            }
            other => panic!("expected result read second, got {other:?}"),
        }
    }

    #[test]
    fn set_bundle_fails_fast_on_first_gateway_error() {
        let gateway = ScriptedGateway::new();
        gateway.push_batch(vec![
            Some(CommandResponse::Ok(Vec::new())),
            Some(CommandResponse::Error(serde_json::json!("notification timeout"))),
        ]);

        let err = expander(&gateway)
            .set_bundle(&ControlFrame::new())
            .unwrap_err();
        match err {
            ExpanderError::BatchExecution { position, error } => {
                assert_eq!(position, 1);
                assert_eq!(error, serde_json::json!("notification timeout"));
            }
            other => panic!("unexpected error: {other}"),
        }

        gateway.push_gateway_error("write failed");
        let err = expander(&gateway)
            .set_bundle(&ControlFrame::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ExpanderError::BatchExecution { position: 0, .. }
        ));
    }

    #[test]
    fn failed_result_code_is_a_protocol_error() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_result(-4);

        let err = expander(&gateway)
            .set_lock(LockType::Exclusive)
            .unwrap_err();
        match err {
            ExpanderError::Protocol { command_id, name } => {
                assert_eq!(command_id, 4);
                assert_eq!(name, "LOCK");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unnamed_failure_renders_unknown() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_result(-5);

        let err = expander(&gateway).set_cs(1).unwrap_err();
        assert!(matches!(
            err,
            ExpanderError::Protocol {
                command_id: 5,
                name: "UNKNOWN"
            }
        ));
        assert_eq!(err.to_string(), "command UNKNOWN failed (id 5)");
    }

    #[test]
    fn missing_result_is_reported() {
        let gateway = ScriptedGateway::new();
        gateway.push_batch(vec![Some(CommandResponse::Ok(Vec::new())), None]);

        let err = expander(&gateway)
            .set_bundle(&ControlFrame::new())
            .unwrap_err();
        assert!(matches!(err, ExpanderError::MissingResponse { position: 1 }));
    }

    #[test]
    fn transport_errors_pass_through_unchanged() {
        let gateway = ScriptedGateway::new();
        gateway.push_status(502);

        let err = expander(&gateway).scan_i2c().unwrap_err();
        assert!(matches!(
            err,
            ExpanderError::Transport(TransportError::Status { status: 502, .. })
        ));
        assert_eq!(gateway.requests().len(), 1);
    }

    #[test]
    fn malformed_response_shape_is_a_transport_error() {
        let gateway = ScriptedGateway::new();
        gateway.push_miso(&[0]);

        let err = expander(&gateway)
            .set_bundle(&ControlFrame::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ExpanderError::Transport(TransportError::CommandCountMismatch { .. })
        ));
    }

    #[test]
    fn read_miso_is_a_single_read() {
        let gateway = ScriptedGateway::new();
        gateway.push_miso(&[9, 8, 7]);

        assert_eq!(expander(&gateway).read_miso().unwrap(), vec![9, 8, 7]);

        let (_, request) = &gateway.requests()[0];
        assert_eq!(request.parallelism.get(), 1);
        assert_eq!(request.batches[0].parallelism.get(), 1);
        match &request.batches[0].commands[..] {
            [Command::Read(read)] => {
                assert_eq!(read.endpoint.characteristic_uuid, MISO_UUID);
                assert!(!read.wait_notification);
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn scan_filters_empty_slots_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_miso(&[0, 0x42, 0, 0x53, 0]);

        assert_eq!(expander(&gateway).scan_i2c().unwrap(), vec![0x42, 0x53]);

        let frames = gateway.sent_frames();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.len(), 16);
        assert_eq!(frame[0], 0xDF);
        assert_eq!(frame[2], 2);
        assert_eq!(frame[3], 1);
        assert_eq!(frame[4], 1);
        assert_eq!(frame[7], 3);
        assert_eq!(frame[8], 0);
    }

    #[test]
    fn read_truncates_padded_miso() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_miso(&[0xAA; 16]);

        let data = expander(&gateway).read(0x44, 4).unwrap();
        assert_eq!(data, vec![0xAA; 4]);

        let frame = &gateway.sent_frames()[0];
        assert_eq!(frame.len(), 16);
        assert_eq!(frame[0], 0xDE);
        assert_eq!(frame[2], 2);
        assert_eq!(frame[4], 0);
        assert_eq!(frame[7], 1);
        assert_eq!(frame[8], 0x44);
        assert_eq!(&frame[9..11], &[4, 0]);
        assert_eq!(&frame[11..13], &[0, 0]);
    }

    #[test]
    fn read_keeps_short_miso() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_miso(&[1, 2]);

        assert_eq!(expander(&gateway).read(0x44, 6).unwrap(), vec![1, 2]);
    }

    #[test]
    fn write_does_not_read_miso() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();

        expander(&gateway).write(0x62, &[0x21, 0xB1]).unwrap();

        assert_eq!(gateway.requests().len(), 1);
        let frame = &gateway.sent_frames()[0];
        assert_eq!(frame.len(), 18);
        assert_eq!(frame[0], 0xDF);
        assert_eq!(frame[4], 1);
        assert_eq!(frame[7], 0);
        assert_eq!(frame[8], 0x62);
        assert_eq!(&frame[11..13], &[2, 0]);
        assert_eq!(&frame[16..], &[0x21, 0xB1]);
    }

    #[test]
    fn write_read_uses_transfer_and_truncates() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_miso(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let data = expander(&gateway).write_read(0x62, &[0xEC, 0x05], 3).unwrap();
        assert_eq!(data, vec![1, 2, 3]);

        let frame = &gateway.sent_frames()[0];
        assert_eq!(frame[0], 0xDF);
        assert_eq!(frame[7], 2);
        assert_eq!(frame[8], 0x62);
        assert_eq!(&frame[9..11], &[3, 0]);
        assert_eq!(&frame[11..13], &[2, 0]);
        assert_eq!(&frame[16..], &[0xEC, 0x05]);
    }

    #[test]
    fn xfer_is_exclusive_and_untruncated() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_miso(&[5; 10]);

        let data = expander(&gateway).xfer(&[1, 2, 3]).unwrap();
        assert_eq!(data, vec![5; 10]);

        let frame = &gateway.sent_frames()[0];
        assert_eq!(frame[0], 0xD7);
        assert_eq!(frame[2], 1);
        assert_eq!(frame[4], 1);
        assert_eq!(frame[7], 2);
        assert_eq!(frame.len(), 19);
    }

    #[test]
    fn empty_result_slot_counts_as_success() {
        let gateway = ScriptedGateway::new();
        gateway.push_batch(vec![
            Some(CommandResponse::Ok(Vec::new())),
            Some(CommandResponse::Ok(Vec::new())),
        ]);

        expander(&gateway).set_lock(LockType::Released).unwrap();
        assert_eq!(gateway.sent_frames().len(), 1);
    }

    #[test]
    fn register_wrappers_send_single_field_frames() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_bundle_ok();
        gateway.push_bundle_ok();

        let bus = Expander::with_config(
            &gateway,
            "hci0",
            PERIPHERAL,
            ExpanderConfig {
                timeout: Duration::from_secs(10),
                power_wait: 3,
            },
        );
        bus.set_cs(7).unwrap();
        bus.set_lock(LockType::Released).unwrap();
        bus.set_power(true).unwrap();

        let frames = gateway.sent_frames();
        assert_eq!(frames[0][0], 0b0010_0110);
        assert_eq!(frames[0][5], 7);
        assert_eq!(frames[1][0], 0b1000_0110);
        assert_eq!(frames[1][2], 0);
        assert_eq!(frames[2][0], 0b0100_0110);
        assert_eq!(frames[2][3], 1);
        assert_eq!(frames[2][4], 3);

        let (_, request) = &gateway.requests()[0];
        assert_eq!(
            request.batches[0].commands[0].timeout(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn oversized_write_fails_before_sending() {
        let gateway = ScriptedGateway::new();
        let err = expander(&gateway)
            .write(0x10, &vec![0u8; 70_000])
            .unwrap_err();
        assert!(matches!(err, ExpanderError::Frame(_)));
        assert!(gateway.requests().is_empty());
    }

    #[test]
    fn transaction_runs_in_order_and_fills_reads() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_bundle_ok();
        gateway.push_miso(&[0x80, 0x00, 0xA2, 0x00]);

        let mut messages = [I2cMessage::write(0x62, [0xECu8, 0x05]), I2cMessage::read(0x62, 3)];
        expander(&gateway).i2c_transaction(&mut messages).unwrap();

        assert_eq!(messages[1].data(), &[0x80, 0x00, 0xA2]);
        let frames = gateway.sent_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][7], 0);
        assert_eq!(frames[1][7], 1);
        assert_eq!(gateway.remaining(), 0);
    }

    #[test]
    fn transaction_aborts_after_first_failure() {
        let gateway = ScriptedGateway::new();
        gateway.push_bundle_ok();
        gateway.push_bundle_result(-8);
        gateway.push_bundle_ok();

        let mut messages = [
            I2cMessage::write(0x10, [1u8]),
            I2cMessage::read(0x11, 2),
            I2cMessage::write(0x12, [3u8]),
        ];
        let err = expander(&gateway)
            .i2c_transaction(&mut messages)
            .unwrap_err();
        assert!(matches!(
            err,
            ExpanderError::Protocol {
                command_id: 8,
                name: "ADDRESS"
            }
        ));

        let frames = gateway.sent_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][8], 0x10);
        assert_eq!(frames[1][8], 0x11);
        assert!(messages[1].data().is_empty());
        assert_eq!(gateway.remaining(), 1);
    }
}
