//! The contract an object type fulfils to be managed by the controller.

use async_trait::async_trait;

use devcfg_codec::{join_words, ConfigObject};
use devcfg_session::Session;

use crate::error::ResourceResult;

/// Optional lifecycle behaviour, declared once per object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Probe before create (duplicate) and after apply (not found).
    pub existence_checks: bool,
    /// On update, delete [`ManagedObject::retract_paths`] instead of the
    /// whole root.
    pub retract_on_update: bool,
    /// The object maps to device-global configuration; delete honours
    /// [`ManagedObject::clean_on_destroy`].
    pub shared_state: bool,
}

impl Capabilities {
    /// No optional behaviour.
    pub const NONE: Capabilities = Capabilities {
        existence_checks: false,
        retract_on_update: false,
        shared_state: false,
    };

    /// An object owning its own root path, checked for existence.
    pub const OWNED: Capabilities = Capabilities {
        existence_checks: true,
        ..Capabilities::NONE
    };

    /// Enables option retraction on update.
    pub const fn with_retract_on_update(self) -> Self {
        Capabilities {
            retract_on_update: true,
            ..self
        }
    }

    /// Marks the object as device-global state.
    pub const fn with_shared_state(self) -> Self {
        Capabilities {
            shared_state: true,
            ..self
        }
    }
}

/// A configuration object with a lifecycle on the device.
///
/// Implementations are plain values; the controller renders them with
/// [`ConfigObject::write`] under [`root_path`](ManagedObject::root_path) and
/// parses read-back dumps relative to the same path.
#[async_trait]
pub trait ManagedObject: ConfigObject + Clone + Send + Sync + 'static {
    /// Type name for logs.
    const KIND: &'static str;

    /// Optional behaviour of this type.
    const CAPABILITIES: Capabilities;

    /// Path of the object's root statement.
    fn root_path(&self) -> Vec<String>;

    /// An object carrying only what identifies this one (and any settings
    /// that do not live on the device), used to parse read-back.
    fn seed(&self) -> Self;

    /// Human-readable identity.
    fn identity(&self) -> String {
        join_words(&self.root_path())
    }

    /// Paths below the root to delete before an in-place update.
    ///
    /// Only used with [`Capabilities::retract_on_update`].
    fn retract_paths(&self) -> Vec<Vec<String>> {
        Vec::new()
    }

    /// Whether delete removes the configuration. Only consulted for
    /// [`Capabilities::shared_state`] objects.
    fn clean_on_destroy(&self) -> bool {
        true
    }

    /// Checks the plan on its own, before any session is opened.
    fn check_plan(&self) -> ResourceResult<()> {
        Ok(())
    }

    /// Extra checks before applying, with the lock held.
    async fn pre_check(&self, _session: &mut Session) -> ResourceResult<()> {
        Ok(())
    }

    /// Extra checks after committing.
    async fn post_check(&self, _session: &mut Session) -> ResourceResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_builders() {
        const SHARED: Capabilities = Capabilities::NONE
            .with_retract_on_update()
            .with_shared_state();
        assert!(!SHARED.existence_checks);
        assert!(SHARED.retract_on_update);
        assert!(SHARED.shared_state);
        assert!(Capabilities::OWNED.existence_checks);
        assert!(!Capabilities::OWNED.retract_on_update);
    }
}
