//! Account and region identifiers keying partitioned backend state.

use std::{fmt, str::FromStr};

use crate::error::RustStackError;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, default = $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// A 12-digit AWS account number.
    AccountId,
    default = AccountId::DEFAULT
);

identifier!(
    /// An AWS region name, or the pseudo-region holding global service state.
    AwsRegion,
    default = AwsRegion::DEFAULT
);

impl AccountId {
    /// Account used when a request names none.
    pub const DEFAULT: &str = "000000000000";

    /// Validate and wrap an account number.
    ///
    /// # Errors
    /// Returns [`RustStackError::InvalidAccountId`] unless `id` is exactly
    /// twelve ASCII digits.
    pub fn new(id: impl Into<String>) -> Result<Self, RustStackError> {
        let id = id.into();
        let valid = id.len() == 12 && id.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Self(id))
        } else {
            Err(RustStackError::InvalidAccountId(id))
        }
    }
}

impl FromStr for AccountId {
    type Err = RustStackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AwsRegion {
    /// Region used when a request names none.
    pub const DEFAULT: &str = "us-east-1";

    /// Pseudo-region under which global services (IAM, Route 53) keep state.
    pub const GLOBAL: &str = "global";

    /// Wrap a region name. Region names are not validated.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// The [`AwsRegion::GLOBAL`] pseudo-region.
    #[must_use]
    pub fn global() -> Self {
        Self::new(Self::GLOBAL)
    }
}

impl From<&str> for AwsRegion {
    fn from(region: &str) -> Self {
        Self::new(region)
    }
}
