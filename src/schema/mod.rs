//! Schema building: configuration in, GraphQL artifacts out.
//!
//! The builder is a pure function from `Settings` to a [`SchemaArtifact`]:
//! the SDL document, the canonical query/fragment documents used by codegen,
//! and a stable lookup table for downstream tooling.

mod builder;

pub use builder::{
    CollectionSchema, FieldSchema, LookupEntry, SchemaArtifact, SchemaBuilder,
};
