//! Adapter and peripheral descriptions reported by the gateway.

use serde::{Deserialize, Serialize};

/// A local BLE adapter known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub id: String,
    pub modalias: String,
}

/// An adapter together with every peripheral it has discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adapter {
    pub adapter_info: AdapterInfo,
    #[serde(default)]
    pub peripherals: Vec<Peripheral>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peripheral {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub props: Option<PeripheralProps>,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    Public,
    Random,
}

/// Advertisement data last seen for a peripheral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeripheralProps {
    pub address: String,
    pub address_type: AddressType,
    #[serde(default)]
    pub manufacturer_data: Option<serde_json::Value>,
    #[serde(default)]
    pub service_data: Option<serde_json::Value>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub local_name: Option<String>,
    #[serde(default)]
    pub tx_power_level: Option<i16>,
    #[serde(default)]
    pub rssi: Option<i16>,
    #[serde(default, alias = "class_")]
    pub class: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub uuid: String,
    pub primary: bool,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristic {
    pub uuid: String,
    pub service_uuid: String,
    #[serde(default)]
    pub properties: Vec<CharProp>,
    #[serde(default)]
    pub descriptors: Vec<Descriptor>,
}

/// GATT characteristic property flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharProp {
    Broadcast,
    Read,
    WriteWithoutResponse,
    Write,
    Notify,
    Indicate,
    AuthenticatedSignedWrites,
    ExtendedProperties,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub uuid: String,
    pub service_uuid: String,
    pub characteristic_uuid: String,
}

impl Adapter {
    /// Look up a discovered peripheral by address (case-insensitive).
    pub fn peripheral(&self, address: &str) -> Option<&Peripheral> {
        self.peripherals
            .iter()
            .find(|p| p.address.eq_ignore_ascii_case(address))
    }
}
