use crate::domain::DomainError;
use std::fmt;

/// The kinds of keyed records the registry issues tokens for.
///
/// A decoded key only carries a numeric identity, so the kind has to be
/// bound by the caller when looking the record up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vendor,
    Product,
    Application,
    Device,
}

impl EntityKind {
    /// Builds the not-found error matching this kind
    pub fn not_found(self, what: impl Into<String>) -> DomainError {
        let what = what.into();
        match self {
            EntityKind::Vendor => DomainError::VendorNotFound(what),
            EntityKind::Product => DomainError::ProductNotFound(what),
            EntityKind::Application => DomainError::ApplicationNotFound(what),
            EntityKind::Device => DomainError::DeviceNotFound(what),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Vendor => "vendor",
            EntityKind::Product => "product",
            EntityKind::Application => "application",
            EntityKind::Device => "device",
        };
        f.write_str(name)
    }
}

/// A stored record whose identity is shared externally as an encoded key
pub trait KeyedRecord: Send + Sync {
    const KIND: EntityKind;

    /// Storage-assigned identity
    fn id(&self) -> i64;

    /// Canonical key issued when the record was created
    fn key(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_matches_kind() {
        assert!(matches!(
            EntityKind::Vendor.not_found("7"),
            DomainError::VendorNotFound(id) if id == "7"
        ));
        assert!(matches!(
            EntityKind::Product.not_found("7"),
            DomainError::ProductNotFound(_)
        ));
        assert!(matches!(
            EntityKind::Application.not_found("7"),
            DomainError::ApplicationNotFound(_)
        ));
        assert!(matches!(
            EntityKind::Device.not_found("7"),
            DomainError::DeviceNotFound(_)
        ));
    }

    #[test]
    fn test_display_is_lowercase_name() {
        assert_eq!(EntityKind::Application.to_string(), "application");
        assert_eq!(
            DomainError::KeyMismatch(EntityKind::Device).to_string(),
            "device key does not match"
        );
    }
}
