//! Record identifiers.
//!
//! Users, profiles and posts are keyed by UUIDs; member tiers are keyed by a
//! closed set of tier names. Both are validated at the boundary so malformed
//! input never reaches a store adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::records::RecordKind;

/// Validation errors returned when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    EmptyId,
    InvalidUuid { value: String },
    UnknownMemberTier { value: String },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "identifier must not be empty"),
            Self::InvalidUuid { value } => {
                write!(f, "identifier \"{value}\" must be a valid UUID")
            }
            Self::UnknownMemberTier { value } => write!(
                f,
                "member type \"{value}\" is not one of: {}",
                MemberTierId::ALL.map(MemberTierId::as_str).join(", "),
            ),
        }
    }
}

impl std::error::Error for IdValidationError {}

/// UUID identifier shared by users, profiles and posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(Uuid);

impl EntityId {
    /// Validate and construct an [`EntityId`] from borrowed input.
    ///
    /// Surrounding whitespace is rejected rather than trimmed.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(IdValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(invalid_uuid(id));
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| invalid_uuid(id))
    }

    /// Wrap an already parsed UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`EntityId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

fn invalid_uuid(value: &str) -> IdValidationError {
    IdValidationError::InvalidUuid {
        value: value.to_owned(),
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for EntityId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Member tier identifier. Tiers are fixed reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MemberTierId {
    Basic,
    Business,
}

impl MemberTierId {
    /// Every known tier, in declaration order.
    pub const ALL: [Self; 2] = [Self::Basic, Self::Business];

    /// Wire name of the tier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for MemberTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberTierId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdValidationError::EmptyId);
        }
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| IdValidationError::UnknownMemberTier {
                value: s.to_owned(),
            })
    }
}

impl From<MemberTierId> for String {
    fn from(value: MemberTierId) -> Self {
        value.as_str().to_owned()
    }
}

impl TryFrom<String> for MemberTierId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Key of a record within its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    MemberTier(MemberTierId),
    Entity(EntityId),
}

impl RecordId {
    /// Parse a raw identifier using the id format of `kind`.
    ///
    /// # Examples
    /// ```
    /// use feedgraph::domain::{RecordId, RecordKind};
    ///
    /// assert!(RecordId::parse(RecordKind::MemberTier, "basic").is_ok());
    /// assert!(RecordId::parse(RecordKind::User, "basic").is_err());
    /// ```
    pub fn parse(kind: RecordKind, raw: &str) -> Result<Self, IdValidationError> {
        match kind {
            RecordKind::MemberTier => raw.parse().map(Self::MemberTier),
            RecordKind::User | RecordKind::Profile | RecordKind::Post => {
                EntityId::new(raw).map(Self::Entity)
            }
        }
    }

    /// Return the UUID form, if this is an entity key.
    pub const fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            Self::MemberTier(_) => None,
        }
    }

    /// Return the tier form, if this is a tier key.
    pub const fn as_member_tier(&self) -> Option<MemberTierId> {
        match self {
            Self::MemberTier(id) => Some(*id),
            Self::Entity(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemberTier(id) => write!(f, "{id}"),
            Self::Entity(id) => write!(f, "{id}"),
        }
    }
}

impl From<EntityId> for RecordId {
    fn from(value: EntityId) -> Self {
        Self::Entity(value)
    }
}

impl From<MemberTierId> for RecordId {
    fn from(value: MemberTierId) -> Self {
        Self::MemberTier(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("3fa85f64-5717-4562-b3fc-2c963f66afa")]
    fn entity_id_rejects_malformed_input(#[case] raw: &str) {
        assert!(EntityId::new(raw).is_err());
    }

    #[rstest]
    fn entity_id_normalises_case_for_display() {
        let id = EntityId::new("3FA85F64-5717-4562-B3FC-2C963F66AFA6").expect("valid uuid");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    #[case("basic", MemberTierId::Basic)]
    #[case("business", MemberTierId::Business)]
    fn member_tier_id_parses_known_tiers(#[case] raw: &str, #[case] expected: MemberTierId) {
        assert_eq!(raw.parse::<MemberTierId>(), Ok(expected));
    }

    #[rstest]
    fn member_tier_id_lists_valid_values_on_error() {
        let err = "premium".parse::<MemberTierId>().expect_err("unknown tier");
        assert_eq!(
            err.to_string(),
            "member type \"premium\" is not one of: basic, business"
        );
    }

    #[rstest]
    #[case(RecordKind::MemberTier, "business", true)]
    #[case(RecordKind::MemberTier, "3fa85f64-5717-4562-b3fc-2c963f66afa6", false)]
    #[case(RecordKind::Post, "3fa85f64-5717-4562-b3fc-2c963f66afa6", true)]
    #[case(RecordKind::Profile, "business", false)]
    fn record_id_uses_the_format_of_its_kind(
        #[case] kind: RecordKind,
        #[case] raw: &str,
        #[case] valid: bool,
    ) {
        assert_eq!(RecordId::parse(kind, raw).is_ok(), valid);
    }

    #[rstest]
    fn entity_id_round_trips_through_serde() {
        let id = EntityId::random();
        let json = serde_json::to_string(&id).expect("serialise");
        let back: EntityId = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, id);
    }
}
