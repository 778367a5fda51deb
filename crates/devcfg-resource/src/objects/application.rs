//! Custom applications: `applications application <name>`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;

use devcfg_codec::{
    block_entry, Block, CodecResult, ConfigObject, PrefixTable, ReadContext, StatementWriter,
    Validator, Words,
};

use crate::error::{ResourceError, ResourceResult};
use crate::object::{Capabilities, ManagedObject};

#[derive(Debug, Clone, Copy)]
enum MatchField {
    Protocol,
    SourcePort,
    DestinationPort,
    InactivityTimeout,
}

static MATCH_FIELDS: Lazy<PrefixTable<MatchField>> = Lazy::new(|| {
    PrefixTable::new(&[
        ("protocol", MatchField::Protocol),
        ("source-port", MatchField::SourcePort),
        ("destination-port", MatchField::DestinationPort),
        ("inactivity-timeout", MatchField::InactivityTimeout),
    ])
});

/// Traffic match criteria shared by applications and their terms.
///
/// Ports stay textual: the device accepts numbers, ranges and well-known
/// names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout: Option<u32>,
}

impl MatchFields {
    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.protocol.is_none()
            && self.source_port.is_none()
            && self.destination_port.is_none()
            && self.inactivity_timeout.is_none()
    }

    pub(crate) fn write(&self, w: &mut StatementWriter) {
        w.set_opt(&["protocol"], self.protocol.as_ref());
        w.set_opt(&["source-port"], self.source_port.as_ref());
        w.set_opt(&["destination-port"], self.destination_port.as_ref());
        w.set_opt(&["inactivity-timeout"], self.inactivity_timeout.as_ref());
    }

    /// Applies `words` if they name a criterion; returns false otherwise.
    pub(crate) fn read(&mut self, words: Words<'_>) -> CodecResult<bool> {
        let Some((field, value)) = MATCH_FIELDS.matches(words) else {
            return Ok(false);
        };
        match field {
            MatchField::Protocol => self.protocol = Some(value.text()),
            MatchField::SourcePort => self.source_port = Some(value.text()),
            MatchField::DestinationPort => self.destination_port = Some(value.text()),
            MatchField::InactivityTimeout => {
                self.inactivity_timeout = Some(value.parse("inactivity-timeout")?)
            }
        }
        Ok(true)
    }
}

/// One `term` of a multi-term application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationTerm {
    pub name: String,
    #[serde(flatten)]
    pub matching: MatchFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl ApplicationTerm {
    /// A term with only its name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn write(&self, w: &mut StatementWriter) {
        self.matching.write(w);
        w.set_opt(&["alg"], self.alg.as_ref());
    }
}

impl Block for ApplicationTerm {
    fn kind(&self) -> &'static str {
        "term"
    }

    fn identifier(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn is_empty_config(&self) -> bool {
        self.matching.is_empty() && self.alg.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Description,
    Term,
}

static FIELDS: Lazy<PrefixTable<Field>> = Lazy::new(|| {
    PrefixTable::new(&[("description", Field::Description), ("term", Field::Term)])
});

/// A custom application, matched either by its own criteria or by terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Application {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub matching: MatchFields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<ApplicationTerm>,
}

impl Application {
    /// An application with only its name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn is_empty_config(&self) -> bool {
        self.description.is_none() && self.matching.is_empty() && self.terms.is_empty()
    }
}

impl ConfigObject for Application {
    fn validate(&self, validator: &mut Validator) {
        validator.require("application", "name", &self.name);
        validator.non_empty("application", &self.name, self.is_empty_config());
        validator.blocks(&self.terms);
    }

    fn write(&self, w: &mut StatementWriter) {
        w.set_opt(&["description"], self.description.as_ref());
        self.matching.write(w);
        for term in &self.terms {
            w.nested(&["term", term.name.as_str()], |w| term.write(w));
        }
    }

    fn read_line(&mut self, words: Words<'_>, _ctx: &ReadContext<'_>) -> CodecResult<()> {
        match FIELDS.matches(words) {
            Some((Field::Description, value)) => self.description = Some(value.text()),
            Some((Field::Term, rest)) => {
                let Some((name, rest)) = rest.split_first() else {
                    return Ok(());
                };
                let term = block_entry(&mut self.terms, &[name], || ApplicationTerm::named(name));
                if !term.matching.read(rest)? {
                    if let Some(value) = rest.strip(&["alg"]) {
                        term.alg = Some(value.text());
                    }
                }
            }
            None => {
                self.matching.read(words)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedObject for Application {
    const KIND: &'static str = "application";
    const CAPABILITIES: Capabilities = Capabilities::OWNED;

    fn root_path(&self) -> Vec<String> {
        vec![
            "applications".to_string(),
            "application".to_string(),
            self.name.clone(),
        ]
    }

    fn seed(&self) -> Self {
        Self::named(self.name.clone())
    }

    fn check_plan(&self) -> ResourceResult<()> {
        if !self.terms.is_empty() && !self.matching.is_empty() {
            return Err(ResourceError::conflict_config(
                self.identity(),
                "term cannot be combined with protocol, ports or inactivity-timeout",
            ));
        }
        if let Some(term) = self.terms.iter().find(|t| t.matching.protocol.is_none()) {
            return Err(ResourceError::missing_config(
                self.identity(),
                format!("protocol is required in term {}", term.name),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcfg_codec::{parse_into, render, to_dump, PlainDecoder};
    use pretty_assertions::assert_eq;

    fn web() -> Application {
        Application {
            description: Some("web front end".to_string()),
            matching: MatchFields {
                protocol: Some("tcp".to_string()),
                destination_port: Some("443".to_string()),
                ..MatchFields::default()
            },
            ..Application::named("web")
        }
    }

    #[test]
    fn test_render_order() {
        let app = web();
        let statements = render(&app, &app.root_path()).unwrap();
        assert_eq!(
            to_dump(&statements),
            "set applications application web description \"web front end\"\n\
             set applications application web protocol tcp\n\
             set applications application web destination-port 443\n"
        );
    }

    #[test]
    fn test_round_trip_with_terms() {
        let mut app = Application::named("dns");
        for (name, protocol, port) in [("t1", "udp", "53"), ("t2", "tcp", "53")] {
            let mut term = ApplicationTerm::named(name);
            term.matching.protocol = Some(protocol.to_string());
            term.matching.destination_port = Some(port.to_string());
            term.matching.inactivity_timeout = Some(30);
            app.terms.push(term);
        }
        app.terms[0].alg = Some("dns".to_string());

        let statements = render(&app, &[] as &[&str]).unwrap();
        let back = parse_into(app.seed(), &to_dump(&statements), &PlainDecoder).unwrap();
        assert_eq!(back, app);
    }

    #[test]
    fn test_empty_application_is_rejected() {
        let err = render(&Application::named("idle"), &["applications"]).unwrap_err();
        assert!(err.is_empty_block());
    }

    #[test]
    fn test_bad_timeout_fails_parse() {
        let dump = "set inactivity-timeout never\n";
        let err = parse_into(Application::named("x"), dump, &PlainDecoder).unwrap_err();
        assert!(err.to_string().contains("inactivity-timeout"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(web()).unwrap();
        assert_eq!(json["name"], "web");
        assert_eq!(json["protocol"], "tcp");
        assert!(json.get("terms").is_none());
        assert!(json.get("source_port").is_none());
    }

    #[test]
    fn test_plan_conflict_and_missing() {
        assert!(web().check_plan().is_ok());

        let mut app = web();
        app.terms.push(ApplicationTerm::named("t1"));
        let err = app.check_plan().unwrap_err();
        assert_eq!(err.kind(), "ConflictConfigErr");

        app.matching = MatchFields::default();
        app.description = None;
        let err = app.check_plan().unwrap_err();
        assert_eq!(err.kind(), "MissingConfigErr");
        assert!(err.to_string().contains("term t1"));
    }
}
