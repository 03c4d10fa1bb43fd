//! Constants used in the rollout scripts

/// The default RPC URL, a local development node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The default directory containing the compiled contract artifacts
pub const DEFAULT_ARTIFACTS_PATH: &str = "artifacts-zk";

/// The default directory containing the flattened contract sources
pub const DEFAULT_SOURCES_PATH: &str = ".";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The deployments key in the deployments file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The directory, relative to the project root, holding the contract sources
pub const CONTRACTS_DIR: &str = "contracts";

/// The suffix of a flattened Solidity source file
pub const FLAT_SOURCE_SUFFIX: &str = "_flat.sol";

/// The extension of a compilation artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The full rollout preset, embedded at compile time
pub const FULL_ROLLOUT_PARAMS: &str = include_str!("../params/full_rollout.toml");

/// The community rollout preset, embedded at compile time
pub const COMMUNITY_ROLLOUT_PARAMS: &str = include_str!("../params/community_rollout.toml");

/// One whole unit of an 18-decimal fixed point percentage, i.e. 100%
pub const FEE_PERCENT_DENOMINATOR: u128 = 1_000_000_000_000_000_000;

// --- Explorer verification --- //

/// The code format submitted for a flattened single-file source
pub const SINGLE_FILE_CODE_FORMAT: &str = "solidity-single-file";

/// The encoded constructor arguments of contracts with an empty constructor
pub const EMPTY_CONSTRUCTOR_ARGS: &str = "0x";

/// The default solc version the contracts are compiled with
pub const DEFAULT_SOLC_VERSION: &str = "0.8.17";

/// The default zksolc version the contracts are compiled with
pub const DEFAULT_ZKSOLC_VERSION: &str = "v1.3.13";

/// The number of times to poll a verification request before giving up
pub const VERIFICATION_POLL_ATTEMPTS: usize = 30;

/// The interval between verification status polls, in milliseconds
pub const VERIFICATION_POLL_INTERVAL_MS: u64 = 2_000;

/// The verification status reported once the explorer accepted the source
pub const VERIFICATION_STATUS_SUCCESSFUL: &str = "successful";

/// The verification status reported once the explorer rejected the source
pub const VERIFICATION_STATUS_FAILED: &str = "failed";
