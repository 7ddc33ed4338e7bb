//! Governor families and per-DAO configuration
//!
//! Each tracked DAO runs one of a closed set of on-chain governance
//! families. The family decides how raw event arguments are shaped and
//! which derived parameters apply; it is selected by configuration at
//! startup, never per event.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernorFamily {
    /// OpenZeppelin-style Governor (ERC-5805 clocks, voteStart/voteEnd)
    Standard,
    /// Nouns-style Governor (startBlock/endBlock, dynamic deadline)
    Nouns,
    /// Safe/Azorius module (boolean vote support)
    Azorius,
    /// Snapshot-style offchain governance (ISO-8601 voting windows)
    Offchain,
}

impl GovernorFamily {
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(GovernorFamily::Standard),
            "nouns" => Some(GovernorFamily::Nouns),
            "azorius" => Some(GovernorFamily::Azorius),
            "offchain" => Some(GovernorFamily::Offchain),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GovernorFamily::Standard => "standard",
            GovernorFamily::Nouns => "nouns",
            GovernorFamily::Azorius => "azorius",
            GovernorFamily::Offchain => "offchain",
        }
    }
}

/// Derived governance parameters for one DAO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernorParams {
    pub quorum: U256,
    /// Blocks between proposal creation and voting start
    pub voting_delay: u64,
    /// Voting window length in blocks
    pub voting_period: u64,
    pub proposal_threshold: U256,
    /// Timelock delay in seconds; zero for governors without a timelock
    pub timelock_delay: u64,
}

impl GovernorParams {
    /// Conservative defaults per family, used until chain-sourced values
    /// are configured for a DAO.
    pub fn defaults_for(family: GovernorFamily) -> Self {
        match family {
            GovernorFamily::Standard => GovernorParams {
                quorum: U256::from(40_000u64),
                voting_delay: 7_200,
                voting_period: 50_400,
                proposal_threshold: U256::from(1_000u64),
                timelock_delay: 172_800,
            },
            GovernorFamily::Nouns => GovernorParams {
                quorum: U256::from(80u64),
                voting_delay: 36_000,
                voting_period: 28_800,
                proposal_threshold: U256::from(2u64),
                timelock_delay: 172_800,
            },
            GovernorFamily::Azorius => GovernorParams {
                quorum: U256::from(10_000u64),
                voting_delay: 0,
                voting_period: 43_200,
                proposal_threshold: U256::ZERO,
                timelock_delay: 86_400,
            },
            GovernorFamily::Offchain => GovernorParams {
                quorum: U256::ZERO,
                voting_delay: 0,
                voting_period: 0,
                proposal_threshold: U256::ZERO,
                timelock_delay: 0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Governor {
    family: GovernorFamily,
    params: GovernorParams,
}

impl Governor {
    pub fn new(family: GovernorFamily, params: GovernorParams) -> Self {
        Self { family, params }
    }

    pub fn with_default_params(family: GovernorFamily) -> Self {
        Self::new(family, GovernorParams::defaults_for(family))
    }

    pub fn family(&self) -> GovernorFamily {
        self.family
    }

    pub fn quorum(&self) -> U256 {
        self.params.quorum
    }

    pub fn voting_delay(&self) -> u64 {
        self.params.voting_delay
    }

    pub fn voting_period(&self) -> u64 {
        self.params.voting_period
    }

    pub fn proposal_threshold(&self) -> U256 {
        self.params.proposal_threshold
    }

    pub fn timelock_delay(&self) -> u64 {
        self.params.timelock_delay
    }

    pub fn params(&self) -> &GovernorParams {
        &self.params
    }

    /// Snapshot-style governance lets a voter replace an earlier vote;
    /// on-chain families reject the second VoteCast.
    pub fn allows_vote_change(&self) -> bool {
        matches!(self.family, GovernorFamily::Offchain)
    }
}

/// Static configuration for one tracked DAO. The governance token is
/// registered here once and treated as immutable.
#[derive(Debug, Clone)]
pub struct DaoConfig {
    pub dao_id: String,
    /// Governance token contract address, lowercased
    pub token_id: String,
    pub family: GovernorFamily,
    pub token_symbol: String,
    pub token_decimals: u8,
}

/// Parse the DAO registry env string:
/// `daoId:tokenAddress:family[:symbol[:decimals]],...`
pub fn parse_dao_registry(raw: &str) -> Result<Vec<DaoConfig>, String> {
    let mut configs = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let fields: Vec<&str> = part.split(':').collect();
        if fields.len() < 3 || fields.len() > 5 {
            return Err(format!(
                "Invalid DAO registry entry '{}'. Expected daoId:tokenAddress:family[:symbol[:decimals]]",
                part
            ));
        }
        let family = GovernorFamily::from_str_opt(fields[2])
            .ok_or_else(|| format!("Unknown governor family '{}'", fields[2]))?;
        let token_symbol = fields
            .get(3)
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| fields[0].to_uppercase());
        let token_decimals = match fields.get(4) {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("Invalid token decimals '{}'", raw))?,
            None => 18,
        };
        configs.push(DaoConfig {
            dao_id: fields[0].to_string(),
            token_id: fields[1].to_lowercase(),
            family,
            token_symbol,
            token_decimals,
        });
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dao_registry() {
        let configs = parse_dao_registry(
            "uniswap:0xAbC0000000000000000000000000000000000001:standard:UNI, nouns:0x02:nouns",
        )
        .unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].dao_id, "uniswap");
        assert_eq!(
            configs[0].token_id,
            "0xabc0000000000000000000000000000000000001"
        );
        assert_eq!(configs[0].family, GovernorFamily::Standard);
        assert_eq!(configs[0].token_symbol, "UNI");
        assert_eq!(configs[0].token_decimals, 18);
        assert_eq!(configs[1].family, GovernorFamily::Nouns);
        // symbol falls back to the dao id
        assert_eq!(configs[1].token_symbol, "NOUNS");
    }

    #[test]
    fn test_parse_dao_registry_rejects_bad_entries() {
        assert!(parse_dao_registry("dao:0x01:compound").is_err());
        assert!(parse_dao_registry("dao-without-fields").is_err());
        assert!(parse_dao_registry("dao:0x01:standard:SYM:eighteen").is_err());
    }

    #[test]
    fn test_only_offchain_allows_vote_change() {
        for family in [
            GovernorFamily::Standard,
            GovernorFamily::Nouns,
            GovernorFamily::Azorius,
        ] {
            assert!(!Governor::with_default_params(family).allows_vote_change());
        }
        assert!(Governor::with_default_params(GovernorFamily::Offchain).allows_vote_change());
    }
}
