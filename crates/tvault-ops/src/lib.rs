//! tvault-ops: the orchestrators that wire archive, crypto, and container
//! into the seal / unseal / reseal / info workflows.

pub mod info;
pub mod options;
pub mod reseal;
pub mod seal;
pub mod unseal;

pub use info::{info, inspect, Information};
pub use options::{InfoOptions, ResealOptions, SealOptions, UnsealOptions};
pub use reseal::reseal;
pub use seal::seal;
pub use unseal::unseal;

/// Wire version of the tokens this build issues and accepts.
pub const TOKEN_VERSION: u32 = tvault_crypto::token::VERSION;
