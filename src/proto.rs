//! gRPC protocol definitions for the composition function runner
//!
//! This module contains the generated Protobuf and gRPC code for the
//! request/response contract between the composition engine and this
//! function.
//!
//! # Protocol Overview
//!
//! The engine dials the function and issues unary `RunFunction` calls:
//!
//! - The request carries the observed composite resource and the desired
//!   composed resources accumulated by earlier pipeline functions
//! - The response carries the updated desired composed resources, a TTL
//!   hint, and a success/failure condition for the composite
//!
//! # Example
//!
//! ```ignore
//! use function_tenant_rbac::proto::function_runner_service_client::FunctionRunnerServiceClient;
//!
//! let mut client = FunctionRunnerServiceClient::connect("https://fn.example.com:9443").await?;
//! let rsp = client.run_function(RunFunctionRequest { ... }).await?;
//! ```

#![allow(missing_docs)] // Generated code doesn't have docs
#![allow(clippy::doc_overindented_list_items)] // Generated proto docs have formatting issues

/// Generated protobuf and gRPC code for the function runner protocol
pub mod function {
    /// Version 1 of the function runner protocol
    pub mod v1 {
        // `fn` is a Rust keyword, so tonic-build writes the generated file
        // with a raw identifier in its name; include it by that exact name.
        include!(concat!(env!("OUT_DIR"), "/apiextensions.r#fn.proto.v1.rs"));
    }
}

// Re-export commonly used types at the module level for convenience
pub use function::v1::*;
