//! Registration manifests
//!
//! A YAML file listing several contracts to register in one run, in order.

use crate::domain::ports::RegistryEntry;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// One manifest line as written by the operator
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestContract {
    pub name: String,
    pub version: String,
    pub address: String,
}

/// Parsed manifest file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub contracts: Vec<ManifestContract>,
}

impl Manifest {
    /// Parse manifest text
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read manifest {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Validate every line, failing on the first bad one
    pub fn entries(&self) -> Result<Vec<RegistryEntry>> {
        if self.contracts.is_empty() {
            return Err(Error::Configuration("manifest lists no contracts".into()));
        }

        self.contracts
            .iter()
            .enumerate()
            .map(|(index, c)| {
                RegistryEntry::new(&c.name, &c.version, &c.address).map_err(|e| {
                    Error::Configuration(format!("manifest entry {}: {}", index + 1, e))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    const MANIFEST: &str = r#"
contracts:
  - name: CarbonToken
    version: "1.0"
    address: "0x5FbDB2315678afecb367f032d93F642f64180aa3"
  - name: ETHStaking
    version: "1.0"
    address: "0xcc7a9e9c8e60ecc12d5a6cd9befeffcd253104e9"
"#;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        let entries = manifest.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "CarbonToken");
        assert_eq!(entries[1].version, "1.0");
    }

    #[test]
    fn test_empty_manifest_rejected() {
        let manifest = Manifest::from_yaml("contracts: []").unwrap();
        assert_matches!(manifest.entries(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_bad_entry_names_its_position() {
        let manifest = Manifest::from_yaml(
            r#"
contracts:
  - name: CarbonToken
    version: "1.0"
    address: "0x5FbDB2315678afecb367f032d93F642f64180aa3"
  - name: ETHStaking
    version: "1.0"
    address: "0xdeadbeef"
"#,
        )
        .unwrap();
        assert_matches!(
            manifest.entries(),
            Err(Error::Configuration(msg)) if msg.starts_with("manifest entry 2")
        );
    }

    #[test]
    fn test_malformed_yaml() {
        assert_matches!(Manifest::from_yaml("contracts: {"), Err(Error::YamlParse(_)));
        assert_matches!(
            Manifest::from_yaml("registries: []"),
            Err(Error::YamlParse(_))
        );
    }

    #[test]
    fn test_missing_file() {
        assert_matches!(
            Manifest::load("/nonexistent/registrations.yaml"),
            Err(Error::Configuration(_))
        );
    }
}
