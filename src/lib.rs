//! function-tenant-rbac - Crossplane composition function for tenant provider RBAC
//!
//! This function grants a GitOps tenant's ServiceAccount edit access over
//! every Crossplane provider installed in the cluster. On each run it lists
//! ProviderRevisions, derives one ClusterRoleBinding per revision (wrapped in
//! a provider-kubernetes `Object` so a downstream provider applies it), and
//! merges the bindings into the desired composed resources shared with the
//! rest of the composition pipeline.
//!
//! # Architecture
//!
//! The function is a gRPC server implementing the composition function
//! runner protocol:
//! - The engine sends observed + desired state for a composite resource
//! - The function lists ProviderRevisions through an injected lister
//! - One binding per revision is synthesized and merged into desired state
//! - Entries owned by other pipeline functions are passed through untouched
//!
//! # Modules
//!
//! - [`identity`] - Deterministic binding and aggregate-role naming
//! - [`manifest`] - ClusterRoleBinding payload templating
//! - [`observed`] - ProviderRevision projection and cluster listing
//! - [`synthesis`] - Per-revision synthesis into the desired-resource map
//! - [`function`] - The gRPC FunctionRunnerService implementation
//! - [`structpb`] - protobuf Struct <-> JSON bridging
//! - [`proto`] - Generated protocol types
//! - [`tls`] - Server TLS configuration
//! - [`error`] - Error types for the function

#![deny(missing_docs)]

pub mod error;
pub mod function;
pub mod identity;
pub mod manifest;
pub mod observed;
pub mod proto;
pub mod structpb;
pub mod synthesis;
pub mod tls;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// How long the composition engine may cache a response before re-running
/// the function
pub const DEFAULT_TTL_SECONDS: i64 = 60;

/// Default port for the function runner gRPC server
///
/// 9443 is the port the composition engine dials by convention.
pub const DEFAULT_GRPC_PORT: u16 = 9443;
