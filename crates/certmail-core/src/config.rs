//! Parser configuration.

use crate::model::TransportType;

/// Options controlling what the parser extracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Copy every raw header of each message into [`crate::Mail::headers`].
    pub extract_all_headers: bool,
    /// `X-Trasporto` values whose `daticert.xml` is bound to certification
    /// data. Other transports still yield a PEC, without certification data.
    pub certified_transport_types: Vec<TransportType>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            extract_all_headers: false,
            certified_transport_types: vec![TransportType::PostaCertificata],
        }
    }
}

impl ParserConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::new()
    }

    /// True if certification data is bound for this transport.
    #[must_use]
    pub fn is_certified(&self, transport: TransportType) -> bool {
        self.certified_transport_types.contains(&transport)
    }
}

/// Builder for [`ParserConfig`].
#[derive(Debug, Clone, Default)]
pub struct ParserConfigBuilder {
    extract_all_headers: bool,
    certified_transport_types: Option<Vec<TransportType>>,
}

impl ParserConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables raw header extraction.
    #[must_use]
    pub const fn extract_all_headers(mut self, enabled: bool) -> Self {
        self.extract_all_headers = enabled;
        self
    }

    /// Replaces the set of certified transport types.
    #[must_use]
    pub fn certified_transport_types(
        mut self,
        types: impl IntoIterator<Item = TransportType>,
    ) -> Self {
        self.certified_transport_types = Some(types.into_iter().collect());
        self
    }

    /// Adds one certified transport type to the set.
    #[must_use]
    pub fn certify_transport(mut self, transport: TransportType) -> Self {
        let types = self
            .certified_transport_types
            .get_or_insert_with(|| ParserConfig::default().certified_transport_types);
        if !types.contains(&transport) {
            types.push(transport);
        }
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ParserConfig {
        let defaults = ParserConfig::default();
        ParserConfig {
            extract_all_headers: self.extract_all_headers,
            certified_transport_types: self
                .certified_transport_types
                .unwrap_or(defaults.certified_transport_types),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert!(!config.extract_all_headers);
        assert!(config.is_certified(TransportType::PostaCertificata));
        assert!(!config.is_certified(TransportType::Errore));
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::builder()
            .extract_all_headers(true)
            .certify_transport(TransportType::Errore)
            .build();

        assert!(config.extract_all_headers);
        assert!(config.is_certified(TransportType::PostaCertificata));
        assert!(config.is_certified(TransportType::Errore));
    }

    #[test]
    fn test_builder_replaces_transport_types() {
        let config = ParserConfig::builder()
            .certified_transport_types([TransportType::Errore])
            .build();

        assert_eq!(config.certified_transport_types, vec![TransportType::Errore]);
        assert_eq!(ParserConfig::builder().build(), ParserConfig::default());
    }
}
