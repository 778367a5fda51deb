//! RADIUS servers: `system radius-server <address>`.

use std::net::IpAddr;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;

use devcfg_codec::{
    CodecResult, ConfigObject, PrefixTable, ReadContext, StatementWriter, Validator, Words,
};

use crate::error::{ResourceError, ResourceResult};
use crate::object::{Capabilities, ManagedObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Secret,
    Port,
    AccountingPort,
    Timeout,
    Retry,
    SourceAddress,
}

const OPTIONS: &[(&str, Field)] = &[
    ("secret", Field::Secret),
    ("port", Field::Port),
    ("accounting-port", Field::AccountingPort),
    ("timeout", Field::Timeout),
    ("retry", Field::Retry),
    ("source-address", Field::SourceAddress),
];

static FIELDS: Lazy<PrefixTable<Field>> = Lazy::new(|| PrefixTable::new(OPTIONS));

/// A RADIUS server the device authenticates against.
///
/// The device stores `secret` encoded; it is decoded again on read unless
/// secret decoding is switched off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RadiusServer {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounting_port: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
}

impl RadiusServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Secret => self.secret.is_some(),
            Field::Port => self.port.is_some(),
            Field::AccountingPort => self.accounting_port.is_some(),
            Field::Timeout => self.timeout.is_some(),
            Field::Retry => self.retry.is_some(),
            Field::SourceAddress => self.source_address.is_some(),
        }
    }
}

impl ConfigObject for RadiusServer {
    fn validate(&self, validator: &mut Validator) {
        validator.require("radius-server", "address", &self.address);
        let empty = OPTIONS.iter().all(|(_, field)| !self.is_set(*field));
        validator.non_empty("radius-server", &self.address, empty);
    }

    fn write(&self, w: &mut StatementWriter) {
        w.set_opt(&["secret"], self.secret.as_ref());
        w.set_opt(&["port"], self.port.as_ref());
        w.set_opt(&["accounting-port"], self.accounting_port.as_ref());
        w.set_opt(&["timeout"], self.timeout.as_ref());
        w.set_opt(&["retry"], self.retry.as_ref());
        w.set_opt(&["source-address"], self.source_address.as_ref());
    }

    fn read_line(&mut self, words: Words<'_>, ctx: &ReadContext<'_>) -> CodecResult<()> {
        let Some((field, value)) = FIELDS.matches(words) else {
            return Ok(());
        };
        match field {
            Field::Secret => self.secret = Some(ctx.secret("secret", value)?),
            Field::Port => self.port = Some(value.parse("port")?),
            Field::AccountingPort => self.accounting_port = Some(value.parse("accounting-port")?),
            Field::Timeout => self.timeout = Some(value.parse("timeout")?),
            Field::Retry => self.retry = Some(value.parse("retry")?),
            Field::SourceAddress => self.source_address = Some(value.text()),
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedObject for RadiusServer {
    const KIND: &'static str = "radius-server";
    const CAPABILITIES: Capabilities = Capabilities::OWNED.with_retract_on_update();

    fn root_path(&self) -> Vec<String> {
        vec![
            "system".to_string(),
            "radius-server".to_string(),
            self.address.clone(),
        ]
    }

    fn seed(&self) -> Self {
        Self::new(self.address.clone())
    }

    /// Options left out of the plan, so an update drops them on the device.
    fn retract_paths(&self) -> Vec<Vec<String>> {
        OPTIONS
            .iter()
            .filter(|(_, field)| !self.is_set(*field))
            .map(|(keyword, _)| vec![keyword.to_string()])
            .collect()
    }

    fn check_plan(&self) -> ResourceResult<()> {
        if self.address.parse::<IpAddr>().is_err() {
            return Err(ResourceError::compatibility(
                self.identity(),
                format!("{} is not an IP address", self.address),
            ));
        }
        Ok(())
    }
}
