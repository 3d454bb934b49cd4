//! SwitchBot bot and curtain commands.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use gattbus_gateway::{Batch, Command, Endpoint, IoGateway, IoRequest};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::exchange;

pub const SWITCHBOT_SERVICE_UUID: &str = "cba20d00-224d-11e6-9fb8-0002a5d5c51b";
pub const SWITCHBOT_COMMAND_UUID: &str = "cba20002-224d-11e6-9fb8-0002a5d5c51b";

/// The device can take a while to wake up and act.
pub const SWITCHBOT_TIMEOUT: Duration = Duration::from_secs(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchBotCommand {
    Press,
    On,
    Off,
    Open,
    Close,
    Pause,
}

impl SwitchBotCommand {
    pub const ALL: [SwitchBotCommand; 6] = [
        SwitchBotCommand::Press,
        SwitchBotCommand::On,
        SwitchBotCommand::Off,
        SwitchBotCommand::Open,
        SwitchBotCommand::Close,
        SwitchBotCommand::Pause,
    ];

    /// Raw command bytes.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            SwitchBotCommand::Press => &[0x57, 0x01, 0x00],
            SwitchBotCommand::On => &[0x57, 0x01, 0x01],
            SwitchBotCommand::Off => &[0x57, 0x01, 0x02],
            SwitchBotCommand::Open => &[0x57, 0x0F, 0x45, 0x01, 0x05, 0xFF, 0x00],
            SwitchBotCommand::Close => &[0x57, 0x0F, 0x45, 0x01, 0x05, 0xFF, 0x64],
            SwitchBotCommand::Pause => &[0x57, 0x0F, 0x45, 0x01, 0x00, 0xFF],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SwitchBotCommand::Press => "press",
            SwitchBotCommand::On => "on",
            SwitchBotCommand::Off => "off",
            SwitchBotCommand::Open => "open",
            SwitchBotCommand::Close => "close",
            SwitchBotCommand::Pause => "pause",
        }
    }
}

impl fmt::Display for SwitchBotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SwitchBotCommand {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        SwitchBotCommand::ALL
            .into_iter()
            .find(|command| command.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ServiceError::UnknownCommand(s.to_string()))
    }
}

/// One SwitchBot device.
pub struct SwitchBot<G> {
    gateway: G,
    adapter_id: String,
    peripheral_address: String,
}

impl<G: IoGateway> SwitchBot<G> {
    pub fn new(
        gateway: G,
        adapter_id: impl Into<String>,
        peripheral_address: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            adapter_id: adapter_id.into(),
            peripheral_address: peripheral_address.into(),
        }
    }

    /// A single write without response carrying `command`.
    pub fn build_request(&self, command: SwitchBotCommand) -> IoRequest {
        IoRequest::single(Batch::new([Command::write(
            Endpoint::new(
                &self.peripheral_address,
                SWITCHBOT_SERVICE_UUID,
                SWITCHBOT_COMMAND_UUID,
            ),
            command.bytes(),
            false,
            SWITCHBOT_TIMEOUT,
        )]))
    }

    pub fn send(&self, command: SwitchBotCommand) -> Result<()> {
        let request = self.build_request(command);
        let response = exchange::execute(&self.gateway, &self.adapter_id, &request)?;
        let batch = response.batch_responses.first().cloned().unwrap_or_default();
        exchange::command_value(&batch, 0, &self.peripheral_address, SWITCHBOT_COMMAND_UUID)?;
        info!(peripheral = %self.peripheral_address, %command, "switchbot command sent");
        Ok(())
    }

    pub fn press(&self) -> Result<()> {
        self.send(SwitchBotCommand::Press)
    }
}
