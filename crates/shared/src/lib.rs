//! Wire contract and domain values shared by the upload client and the processing endpoint.

pub mod domain;
pub mod error;
pub mod protocol;
