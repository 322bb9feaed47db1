//! Custom Resource Definitions for the Meridian platform.
//!
//! Every migrated kind exists under two API groups: [`legacy`] holds the
//! schema the platform is migrating away from (including fields that were
//! deprecated there), [`current`] holds the schema that replaces it. The two
//! groups share their embedded payload types via [`types`].

pub mod current;
pub mod legacy;
pub mod types;


/// API group the platform is migrating away from.
pub const LEGACY_GROUP: &str = "meridian.k8s.io";

/// API group that replaces [`LEGACY_GROUP`].
pub const GROUP: &str = "meridian.io";

/// Both groups serve this version.
pub const VERSION: &str = "v1";
