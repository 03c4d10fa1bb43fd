//! Rollout parameters: destination addresses, fee percents, and initial amounts.
//!
//! Parameters are read from TOML. Two presets are embedded in the binary, one
//! for each rollout; a user-supplied file replaces the preset entirely.

use std::{fmt::Display, fs, path::Path, str::FromStr};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Deserializer};

use crate::{
    constants::{COMMUNITY_ROLLOUT_PARAMS, FEE_PERCENT_DENOMINATOR, FULL_ROLLOUT_PARAMS},
    errors::ScriptError,
};

/// The full set of rollout parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployParams {
    /// Parameters of the `ReferrerStorage` contract.
    ///
    /// Only required by rollouts that deploy it.
    pub referrer_storage: Option<ReferrerStorageParams>,
    /// Parameters of the `TouchFanSharesV1` contract.
    ///
    /// Only required by rollouts that deploy it.
    pub fan_shares: Option<FanSharesParams>,
    /// Parameters of the `TFCommunitySharesV1` contract
    pub community_shares: CommunitySharesParams,
}

/// Parameters of the `ReferrerStorage` contract
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferrerStorageParams {
    /// The referrer registered right after deployment
    #[serde(deserialize_with = "from_str")]
    pub referrer: Address,
}

/// Parameters of the `TouchFanSharesV1` contract
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanSharesParams {
    /// The address receiving protocol fees
    #[serde(deserialize_with = "from_str")]
    pub fee_destination: Address,
    /// The protocol's cut of each trade
    #[serde(deserialize_with = "from_str")]
    pub protocol_fee_percent: U256,
    /// The shares subject's cut of each trade
    #[serde(deserialize_with = "from_str")]
    pub subject_fee_percent: U256,
    /// The referrer's cut of each trade
    #[serde(deserialize_with = "from_str")]
    pub referrer_fee_percent: U256,
    /// The number of the deployer's own shares to buy once configured, if any
    #[serde(default, deserialize_with = "option_from_str")]
    pub initial_buy_amount: Option<U256>,
    /// The final owner of the contract, if ownership is to be handed over
    #[serde(default, deserialize_with = "option_from_str")]
    pub new_owner: Option<Address>,
}

/// Parameters of the `TFCommunitySharesV1` contract
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommunitySharesParams {
    /// The address receiving protocol fees
    #[serde(deserialize_with = "from_str")]
    pub fee_destination: Address,
    /// The protocol's cut of each trade
    #[serde(deserialize_with = "from_str")]
    pub protocol_fee_percent: U256,
    /// The referrer's cut of each trade
    #[serde(deserialize_with = "from_str")]
    pub referrer_fee_percent: U256,
    /// The fee, in wei, charged for creating a proposal
    #[serde(deserialize_with = "from_str")]
    pub proposal_fee: U256,
    /// An already-deployed `ReferrerStorage`.
    ///
    /// When absent, the `ReferrerStorage` deployed in the same run or recorded
    /// in the deployments file is used.
    #[serde(default, deserialize_with = "option_from_str")]
    pub referrer_storage: Option<Address>,
    /// The manager; defaults to the deployer
    #[serde(default, deserialize_with = "option_from_str")]
    pub manager: Option<Address>,
    /// A proposal to seed the contract with, if any
    #[serde(default)]
    pub proposal: Option<ProposalParams>,
    /// The final owner of the contract, if ownership is to be handed over
    #[serde(default, deserialize_with = "option_from_str")]
    pub new_owner: Option<Address>,
}

/// A proposal created, activated, and bought into during the rollout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposalParams {
    /// The off-chain identifier passed to `createProposal`
    pub external_id: String,
    /// The on-chain index the contract assigns to the proposal
    #[serde(deserialize_with = "from_str")]
    pub index: U256,
    /// The state the proposal is moved to after creation
    #[serde(deserialize_with = "from_str")]
    pub state: U256,
    /// The number of community shares to buy, if any
    #[serde(default, deserialize_with = "option_from_str")]
    pub buy_amount: Option<U256>,
}

impl DeployParams {
    /// The parameters of the full rollout
    pub fn full_rollout() -> Result<Self, ScriptError> {
        Self::from_toml(FULL_ROLLOUT_PARAMS)
    }

    /// The parameters of the standalone community rollout
    pub fn community_rollout() -> Result<Self, ScriptError> {
        Self::from_toml(COMMUNITY_ROLLOUT_PARAMS)
    }

    /// Parse parameters from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ScriptError> {
        toml::from_str(s).map_err(|e| ScriptError::ParamsParsing(e.to_string()))
    }

    /// Read parameters from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ParamsParsing(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Read parameters from `path` if given, otherwise fall back to `preset`
    pub fn load_or(
        path: Option<&Path>,
        preset: fn() -> Result<Self, ScriptError>,
    ) -> Result<Self, ScriptError> {
        match path {
            Some(path) => Self::from_file(path),
            None => preset(),
        }
    }

    /// The fan shares parameters, which the full rollout requires
    pub fn fan_shares(&self) -> Result<&FanSharesParams, ScriptError> {
        self.fan_shares
            .as_ref()
            .ok_or_else(|| ScriptError::InvalidParams("missing [fan_shares] section".to_string()))
    }

    /// The referrer storage parameters, which the full rollout requires
    pub fn referrer_storage(&self) -> Result<&ReferrerStorageParams, ScriptError> {
        self.referrer_storage.as_ref().ok_or_else(|| {
            ScriptError::InvalidParams("missing [referrer_storage] section".to_string())
        })
    }

    /// Check that the fee splits of every configured contract are sane
    pub fn validate(&self) -> Result<(), ScriptError> {
        if let Some(fan) = &self.fan_shares {
            check_fee_split(
                "fan_shares",
                &[
                    fan.protocol_fee_percent,
                    fan.subject_fee_percent,
                    fan.referrer_fee_percent,
                ],
            )?;
        }

        let community = &self.community_shares;
        check_fee_split(
            "community_shares",
            &[community.protocol_fee_percent, community.referrer_fee_percent],
        )
    }

    /// The checks of `validate`, plus those of the standalone community
    /// rollout, which deploys no `ReferrerStorage` of its own
    pub fn validate_standalone_community(&self) -> Result<(), ScriptError> {
        self.validate()?;
        self.standalone_referrer_storage().map(|_| ())
    }

    /// The existing `ReferrerStorage` the standalone community rollout wires in
    pub fn standalone_referrer_storage(&self) -> Result<Address, ScriptError> {
        self.community_shares.referrer_storage.ok_or_else(|| {
            ScriptError::InvalidParams(
                "community_shares.referrer_storage is required when the community rollout runs \
                 standalone"
                    .to_string(),
            )
        })
    }
}

/// Reject fee splits that add up to more than 100%
fn check_fee_split(section: &str, fees: &[U256]) -> Result<(), ScriptError> {
    let total = fees
        .iter()
        .try_fold(U256::ZERO, |acc, fee| acc.checked_add(*fee))
        .ok_or_else(|| ScriptError::InvalidParams(format!("{section}: fee total overflows")))?;

    if total > U256::from(FEE_PERCENT_DENOMINATOR) {
        return Err(ScriptError::InvalidParams(format!(
            "{section}: fees add up to {total}, more than {FEE_PERCENT_DENOMINATOR} (100%)"
        )));
    }

    Ok(())
}

/// Deserialize a value from its string form, so that 256-bit amounts
/// survive formats with 64-bit integers
fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(s.trim()).map_err(serde::de::Error::custom)
}

/// Deserialize an optional value from its string form
fn option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| T::from_str(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use alloy::primitives::{address, U256};

    use super::DeployParams;
    use crate::errors::ScriptError;

    #[test]
    fn test_full_rollout_preset() {
        let params = DeployParams::full_rollout().unwrap();
        params.validate().unwrap();

        let referrer = params.referrer_storage().unwrap();
        assert_eq!(referrer.referrer, address!("Ecb6f9d167F514d7C5764751468EC7658272Be5c"));

        let fan = params.fan_shares().unwrap();
        assert_eq!(fan.protocol_fee_percent, U256::from(50_000_000_000_000_000u64));
        assert_eq!(fan.subject_fee_percent, U256::from(40_000_000_000_000_000u64));
        assert_eq!(fan.referrer_fee_percent, U256::from(10_000_000_000_000_000u64));
        assert_eq!(fan.initial_buy_amount, Some(U256::from(1_000_000u64)));

        let community = &params.community_shares;
        assert_eq!(community.proposal_fee, U256::from(500_000_000_000_000u64));
        assert!(community.proposal.is_none());
        assert!(community.referrer_storage.is_none());
    }

    #[test]
    fn test_community_rollout_preset() {
        let params = DeployParams::community_rollout().unwrap();
        params.validate().unwrap();
        assert!(params.fan_shares.is_none());
        assert!(params.fan_shares().is_err());

        let community = &params.community_shares;
        assert_eq!(
            community.referrer_storage,
            Some(address!("1D68ae39BF07d05d41755C6342a6F724129D9FE0"))
        );
        assert_eq!(
            community.new_owner,
            Some(address!("0eAF6Be67D7cB0ADE23f3dD8180e43ca41824226"))
        );

        let proposal = community.proposal.as_ref().unwrap();
        assert_eq!(proposal.external_id, "tf_123456");
        assert_eq!(proposal.index, U256::from(1));
        assert_eq!(proposal.state, U256::from(100));
        assert_eq!(proposal.buy_amount, Some(U256::from(1_000_000u64)));
    }

    #[test]
    fn test_fee_split_over_100_percent() {
        let params = DeployParams::from_toml(
            r#"
            [community_shares]
            fee_destination = "0x444156834BC8Fc991324Bb2b5790Af0F1c57f825"
            protocol_fee_percent = "700000000000000000"
            referrer_fee_percent = "300000000000000001"
            proposal_fee = "0"
            "#,
        )
        .unwrap();

        assert!(matches!(params.validate(), Err(ScriptError::InvalidParams(_))));
    }

    #[test]
    fn test_standalone_community_requires_storage() {
        let params = DeployParams::from_toml(
            r#"
            [community_shares]
            fee_destination = "0x444156834BC8Fc991324Bb2b5790Af0F1c57f825"
            protocol_fee_percent = "70000000000000000"
            referrer_fee_percent = "30000000000000000"
            proposal_fee = "50000000000000"
            "#,
        )
        .unwrap();

        // Fine as part of the full rollout, which deploys its own storage
        params.validate().unwrap();
        assert!(matches!(
            params.validate_standalone_community(),
            Err(ScriptError::InvalidParams(_))
        ));

        let preset = DeployParams::community_rollout().unwrap();
        preset.validate_standalone_community().unwrap();
        assert_eq!(
            preset.standalone_referrer_storage().unwrap(),
            address!("1D68ae39BF07d05d41755C6342a6F724129D9FE0")
        );
    }

    #[test]
    fn test_bad_address_rejected() {
        let res = DeployParams::from_toml(
            r#"
            [community_shares]
            fee_destination = "0x1234"
            protocol_fee_percent = "0"
            referrer_fee_percent = "0"
            proposal_fee = "0"
            "#,
        );

        assert!(matches!(res, Err(ScriptError::ParamsParsing(_))));
    }

    #[test]
    fn test_params_from_file() -> eyre::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"
            [community_shares]
            fee_destination = "0x444156834BC8Fc991324Bb2b5790Af0F1c57f825"
            protocol_fee_percent = "16"
            referrer_fee_percent = "16"
            proposal_fee = "0"
            "#
        )?;

        let params = DeployParams::load_or(Some(file.path()), DeployParams::full_rollout)?;
        assert_eq!(params.community_shares.protocol_fee_percent, U256::from(16));
        assert_eq!(params.community_shares.referrer_fee_percent, U256::from(16));
        assert!(params.referrer_storage.is_none());

        Ok(())
    }
}
