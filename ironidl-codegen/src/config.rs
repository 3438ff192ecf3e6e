//! Generator configuration.

use ironidl_core::Principal;

/// Options for Rust binding generation.
///
/// # Example
/// ```
/// use ironidl_codegen::Config;
/// use ironidl_core::Principal;
///
/// let config = Config::new()
///     .binding_name("Ledger")
///     .package_name("ledger")
///     .destination(Principal::management());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) binding_name: String,
    pub(crate) package_name: Option<String>,
    pub(crate) agent_name: String,
    pub(crate) destination: Option<Principal>,
    pub(crate) box_recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binding_name: "Service".to_string(),
            package_name: None,
            agent_name: "agent".to_string(),
            destination: None,
            box_recursive: true,
        }
    }

    /// Sets the name of the generated client struct.
    #[must_use]
    pub fn binding_name(mut self, name: impl Into<String>) -> Self {
        self.binding_name = name.into();
        self
    }

    /// Sets the package name mentioned in the generated header.
    #[must_use]
    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// Sets the field and parameter name of the transport agent.
    #[must_use]
    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    /// Sets a default destination, emitted as a `DESTINATION` constant.
    #[must_use]
    pub fn destination(mut self, principal: Principal) -> Self {
        self.destination = Some(principal);
        self
    }

    /// Sets whether recursive references are emitted as `Box<T>`.
    ///
    /// With boxing off, generation fails for schemas whose recursion does
    /// not pass through a `vec`.
    #[must_use]
    pub fn box_recursive(mut self, enabled: bool) -> Self {
        self.box_recursive = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.binding_name, "Service");
        assert_eq!(config.agent_name, "agent");
        assert!(config.package_name.is_none());
        assert!(config.destination.is_none());
        assert!(config.box_recursive);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .binding_name("Ledger")
            .agent_name("transport")
            .box_recursive(false);
        assert_eq!(config.binding_name, "Ledger");
        assert_eq!(config.agent_name, "transport");
        assert!(!config.box_recursive);
    }
}
