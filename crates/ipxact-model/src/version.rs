use core::fmt;
use std::str::FromStr;

use crate::ModelError;

/// IEEE 1685 (IP-XACT) revision selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaVersion {
    Ieee1685_2009,
    #[default]
    Ieee1685_2014,
    Ieee1685_2022,
}

impl SchemaVersion {
    /// Every recognised revision, oldest first.
    pub const ALL: [SchemaVersion; 3] = [
        SchemaVersion::Ieee1685_2009,
        SchemaVersion::Ieee1685_2014,
        SchemaVersion::Ieee1685_2022,
    ];

    /// Selector string such as `1685-2014`.
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::Ieee1685_2009 => "1685-2009",
            SchemaVersion::Ieee1685_2014 => "1685-2014",
            SchemaVersion::Ieee1685_2022 => "1685-2022",
        }
    }

    /// Target namespace URI of the revision.
    pub const fn namespace(self) -> &'static str {
        match self {
            SchemaVersion::Ieee1685_2009 => {
                "http://www.spiritconsortium.org/XMLSchema/SPIRIT/1685-2009"
            }
            SchemaVersion::Ieee1685_2014 => "http://www.accellera.org/XMLSchema/IPXACT/1685-2014",
            SchemaVersion::Ieee1685_2022 => "http://www.accellera.org/XMLSchema/IPXACT/1685-2022",
        }
    }

    /// Conventional element prefix bound to [`Self::namespace`].
    pub const fn prefix(self) -> &'static str {
        match self {
            SchemaVersion::Ieee1685_2009 => "spirit",
            SchemaVersion::Ieee1685_2014 | SchemaVersion::Ieee1685_2022 => "ipxact",
        }
    }

    /// URL of the top-level `index.xsd`.
    pub const fn schema_url(self) -> &'static str {
        match self {
            SchemaVersion::Ieee1685_2009 => {
                "http://www.spiritconsortium.org/XMLSchema/SPIRIT/1685-2009/index.xsd"
            }
            SchemaVersion::Ieee1685_2014 => {
                "http://www.accellera.org/XMLSchema/IPXACT/1685-2014/index.xsd"
            }
            SchemaVersion::Ieee1685_2022 => {
                "http://www.accellera.org/XMLSchema/IPXACT/1685-2022/index.xsd"
            }
        }
    }

    /// Value of the `xsi:schemaLocation` attribute (`namespace location`).
    pub fn schema_location(self) -> String {
        format!("{} {}", self.namespace(), self.schema_url())
    }

    /// Whether documents can be rendered for this revision.
    pub const fn is_supported(self) -> bool {
        matches!(self, SchemaVersion::Ieee1685_2014)
    }

    /// Return `self` when renderable, otherwise [`ModelError::UnsupportedVersion`].
    pub fn ensure_supported(self) -> Result<Self, ModelError> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(ModelError::UnsupportedVersion(self.as_str().to_string()))
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SchemaVersion::ALL
            .into_iter()
            .find(|version| version.as_str() == wanted)
            .ok_or_else(|| ModelError::UnknownVersion(wanted.to_string()))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_selectors() {
        for version in SchemaVersion::ALL {
            assert_eq!(version.as_str().parse::<SchemaVersion>().unwrap(), version);
        }
        assert!(matches!(
            "1685-2099".parse::<SchemaVersion>(),
            Err(ModelError::UnknownVersion(_))
        ));
    }

    #[test]
    fn only_2014_is_renderable() {
        assert!(SchemaVersion::default().ensure_supported().is_ok());
        assert!(matches!(
            SchemaVersion::Ieee1685_2009.ensure_supported(),
            Err(ModelError::UnsupportedVersion(v)) if v == "1685-2009"
        ));
        assert!(SchemaVersion::Ieee1685_2022.ensure_supported().is_err());
    }

    #[test]
    fn schema_location_pairs_namespace_and_url() {
        let location = SchemaVersion::Ieee1685_2014.schema_location();
        assert_eq!(
            location,
            "http://www.accellera.org/XMLSchema/IPXACT/1685-2014 \
             http://www.accellera.org/XMLSchema/IPXACT/1685-2014/index.xsd"
        );
    }
}
