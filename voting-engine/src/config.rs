//! Engine configuration

use crate::{VotingError, VotingResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use voting_core::Address;

/// Voting engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Administrator identity
    pub authority: Address,
    /// Voter registered at construction; the zero address means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_voter: Option<Address>,
    /// Further voters registered at construction, null and duplicates skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial_voters: Vec<Address>,
}

impl EngineConfig {
    /// Create a configuration with no pre-registered voters
    pub fn new(authority: Address) -> Self {
        Self {
            authority,
            initial_voter: None,
            initial_voters: Vec::new(),
        }
    }

    /// Set the constructor voter
    pub fn with_initial_voter(mut self, voter: Address) -> Self {
        self.initial_voter = Some(voter);
        self
    }

    /// Set the pre-registered voter list
    pub fn with_initial_voters(mut self, voters: Vec<Address>) -> Self {
        self.initial_voters = voters;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> VotingResult<()> {
        if self.authority.is_zero() {
            return Err(VotingError::Config(
                "Authority cannot be the zero address".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse configuration from TOML
    pub fn from_toml(toml_str: &str) -> VotingResult<Self> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> VotingResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Load configuration from file; `.json` files are read as JSON, anything else as TOML
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> VotingResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| VotingError::Config(format!("Failed to read config file: {}", e)))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            let config: EngineConfig = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Save configuration to file as TOML
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> VotingResult<()> {
        let content = self.to_toml()?;
        fs::write(path.as_ref(), content)
            .map_err(|e| VotingError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const AUTHORITY: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const VOTER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn test_from_toml() {
        let toml_str = format!(
            "authority = \"{}\"\ninitial_voter = \"{}\"\n",
            AUTHORITY, VOTER
        );
        let config = EngineConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.authority, AUTHORITY.parse().unwrap());
        assert_eq!(config.initial_voter, Some(VOTER.parse().unwrap()));
        assert!(config.initial_voters.is_empty());
    }

    #[test]
    fn test_zero_authority_rejected() {
        let toml_str = "authority = \"0x0000000000000000000000000000000000000000\"\n";
        assert!(matches!(
            EngineConfig::from_toml(toml_str),
            Err(VotingError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_address_rejected() {
        let toml_str = "authority = \"0x1234\"\n";
        assert!(matches!(
            EngineConfig::from_toml(toml_str),
            Err(VotingError::Config(_))
        ));
    }

    #[test]
    fn test_file_operations() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("engine.toml");

        let config = EngineConfig::new(AUTHORITY.parse().unwrap())
            .with_initial_voters(vec![VOTER.parse().unwrap()]);
        config.save_to_file(&file_path).unwrap();

        let loaded = EngineConfig::load_from_file(&file_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("engine.json");
        fs::write(
            &file_path,
            format!("{{\"authority\": \"{}\", \"initial_voter\": \"{}\"}}", AUTHORITY, VOTER),
        )
        .unwrap();

        let loaded = EngineConfig::load_from_file(&file_path).unwrap();
        assert_eq!(loaded.initial_voter, Some(VOTER.parse().unwrap()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(EngineConfig::load_from_file(dir.path().join("absent.toml")).is_err());
    }
}
