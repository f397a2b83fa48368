//! Domain primitives and the field-resolution engine.
//!
//! Purpose: define the record model, the store port and the engine that turns
//! a selection tree into a response tree. Nothing here knows about HTTP,
//! query text or SQL; adapters live under `inbound` and `outbound`.
//!
//! Public surface:
//! - `RecordStore` (in `ports`): the only seam to storage.
//! - `BatchCache`: request-scoped memoization and batching of lookups.
//! - `resolvers`: one resolver per relation and root field.
//! - `ResolutionDriver`: walks a selection tree and builds a
//!   `GraphqlResponse`.
//! - `Error` / `ErrorCode`: transport-level error payload.

pub mod batch_cache;
pub mod driver;
pub mod error;
pub mod ids;
pub mod ports;
pub mod records;
pub mod resolvers;
pub mod response;
pub mod schema;
pub mod selection;

pub use self::batch_cache::{BatchCache, CacheStats, Slot};
pub use self::driver::ResolutionDriver;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{EntityId, IdValidationError, MemberTierId, RecordId};
pub use self::records::{MemberTier, Post, Profile, Record, RecordKind, Subscription, User};
pub use self::response::{
    ErrorExtensions, GraphqlError, GraphqlResponse, PathSegment, ResolveError, ResponsePath,
};
pub use self::schema::{FieldDef, FieldResolver, ObjectType, Relation, Shape};
pub use self::selection::{Field, InputValue};

