//! The whole `applications` stanza, managed as one shared object.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;

use devcfg_codec::{
    block_entry, Block, CodecResult, ConfigObject, PrefixTable, ReadContext, StatementWriter,
    Validator, Words,
};

use super::application::MatchFields;
use crate::object::{Capabilities, ManagedObject};

/// An `application` block inside the stanza.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub matching: MatchFields,
}

impl ApplicationEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Block for ApplicationEntry {
    fn kind(&self) -> &'static str {
        "application"
    }

    fn identifier(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn is_empty_config(&self) -> bool {
        self.description.is_none() && self.matching.is_empty()
    }
}

/// An `application-set` block: an ordered list of application names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationSet {
    pub name: String,
    pub applications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApplicationSet {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Block for ApplicationSet {
    fn kind(&self) -> &'static str {
        "application-set"
    }

    fn identifier(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn is_empty_config(&self) -> bool {
        self.applications.is_empty() && self.description.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Application,
    ApplicationSet,
}

static FIELDS: Lazy<PrefixTable<Field>> = Lazy::new(|| {
    PrefixTable::new(&[
        ("application", Field::Application),
        ("application-set", Field::ApplicationSet),
    ])
});

#[derive(Debug, Clone, Copy)]
enum SetField {
    Application,
    Description,
}

static SET_FIELDS: Lazy<PrefixTable<SetField>> = Lazy::new(|| {
    PrefixTable::new(&[
        ("application", SetField::Application),
        ("description", SetField::Description),
    ])
});

/// Every application and application set on the device.
///
/// Deleting leaves the device untouched unless `clean_on_destroy` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Applications {
    /// Local setting; never written to the device.
    #[serde(skip)]
    pub clean_on_destroy: bool,
    pub applications: Vec<ApplicationEntry>,
    pub application_sets: Vec<ApplicationSet>,
}

impl ConfigObject for Applications {
    fn validate(&self, validator: &mut Validator) {
        validator.non_empty(
            "applications",
            "applications",
            self.applications.is_empty() && self.application_sets.is_empty(),
        );
        validator.blocks(&self.applications);
        validator.blocks(&self.application_sets);
    }

    fn write(&self, w: &mut StatementWriter) {
        for app in &self.applications {
            w.nested(&["application", app.name.as_str()], |w| {
                w.set_opt(&["description"], app.description.as_ref());
                app.matching.write(w);
            });
        }
        for set in &self.application_sets {
            w.nested(&["application-set", set.name.as_str()], |w| {
                w.set_each(&["application"], &set.applications);
                w.set_opt(&["description"], set.description.as_ref());
            });
        }
    }

    fn read_line(&mut self, words: Words<'_>, _ctx: &ReadContext<'_>) -> CodecResult<()> {
        let Some((field, rest)) = FIELDS.matches(words) else {
            return Ok(());
        };
        let Some((name, rest)) = rest.split_first() else {
            return Ok(());
        };
        match field {
            Field::Application => {
                let app = block_entry(&mut self.applications, &[name], || {
                    ApplicationEntry::named(name)
                });
                if let Some(value) = rest.strip(&["description"]) {
                    app.description = Some(value.text());
                } else {
                    app.matching.read(rest)?;
                }
            }
            Field::ApplicationSet => {
                let set = block_entry(&mut self.application_sets, &[name], || {
                    ApplicationSet::named(name)
                });
                match SET_FIELDS.matches(rest) {
                    Some((SetField::Application, value)) => set.applications.push(value.text()),
                    Some((SetField::Description, value)) => set.description = Some(value.text()),
                    None => {}
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedObject for Applications {
    const KIND: &'static str = "applications";
    const CAPABILITIES: Capabilities = Capabilities::NONE
        .with_retract_on_update()
        .with_shared_state();

    fn root_path(&self) -> Vec<String> {
        vec!["applications".to_string()]
    }

    fn seed(&self) -> Self {
        Self {
            clean_on_destroy: self.clean_on_destroy,
            ..Self::default()
        }
    }

    fn retract_paths(&self) -> Vec<Vec<String>> {
        vec![
            vec!["application".to_string()],
            vec!["application-set".to_string()],
        ]
    }

    fn clean_on_destroy(&self) -> bool {
        self.clean_on_destroy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcfg_codec::{parse, render, to_dump, PlainDecoder};
    use devcfg_test::application_fixtures::TESTACC_DUMP;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_testacc_dump() {
        let parsed: Applications = parse(TESTACC_DUMP, &PlainDecoder).unwrap();
        assert_eq!(parsed.applications.len(), 1);
        let app = &parsed.applications[0];
        assert_eq!(app.name, "testacc");
        assert_eq!(app.matching.protocol.as_deref(), Some("tcp"));
        assert_eq!(app.matching.destination_port.as_deref(), Some("80"));
    }

    #[test]
    fn test_set_members_keep_order() {
        let mut set = ApplicationSet::named("web-apps");
        set.applications = vec!["junos-https".to_string(), "junos-http".to_string()];
        let stanza = Applications {
            application_sets: vec![set],
            ..Applications::default()
        };

        let statements = render(&stanza, &stanza.root_path()).unwrap();
        assert_eq!(
            to_dump(&statements),
            "set applications application-set web-apps application junos-https\n\
             set applications application-set web-apps application junos-http\n"
        );

        let relative = render(&stanza, &[] as &[&str]).unwrap();
        let back: Applications = parse(&to_dump(&relative), &PlainDecoder).unwrap();
        assert_eq!(back, stanza);
    }

    #[test]
    fn test_duplicate_application_names() {
        let stanza = Applications {
            applications: vec![
                ApplicationEntry {
                    description: Some("a".to_string()),
                    ..ApplicationEntry::named("dup")
                },
                ApplicationEntry {
                    description: Some("b".to_string()),
                    ..ApplicationEntry::named("dup")
                },
            ],
            ..Applications::default()
        };
        let err = render(&stanza, &stanza.root_path()).unwrap_err();
        assert!(err.is_duplicate_identifier());
    }

    #[test]
    fn test_seed_keeps_local_setting() {
        let stanza = Applications {
            clean_on_destroy: true,
            applications: vec![ApplicationEntry::named("x")],
            ..Applications::default()
        };
        let seed = stanza.seed();
        assert!(seed.clean_on_destroy());
        assert!(seed.applications.is_empty());
    }
}
