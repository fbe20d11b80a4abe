//! # Identity
//!
//! Every long-lived entity (build provider, meta service, target, option, artifact,
//! solution) is keyed by a 128-bit [`Uuid`]. Types that are registered by their
//! declared type carry the identity as an associated constant through [`Capability`].

use std::any::Any;
use uuid::Uuid;

/// A registrable capability: a type (or `dyn Trait`) with a fixed identity.
///
/// Meta services are looked up by the capability they are registered under, not by
/// their concrete type, so `impl Capability for dyn MyService` is the usual shape.
pub trait Capability: 'static {
    /// The identity the capability is registered and looked up with.
    const GUID: Uuid;
    /// Human readable name used in log lines.
    const NAME: &'static str;
}

/// Upcast helper so trait objects stored in the registry can be downcast to their
/// concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Generates a fresh random identity.
pub fn new_guid() -> Uuid {
    Uuid::new_v4()
}

/// Parses an identity, accepting the braced `{...}` form used by solution files.
pub fn parse_guid(text: &str) -> Result<Uuid, uuid::Error> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);
    Uuid::parse_str(inner)
}

/// Derives a stable identity from a string seed.
///
/// Used for manifests and options that do not declare a guid, so their identity
/// survives between runs and keeps the generation cache valid.
pub fn guid_from_name(seed: &str) -> Uuid {
    let hash = blake3::hash(seed.as_bytes());
    let mut bytes = [0u8; 16];
    if let Some(head) = hash.as_bytes().first_chunk::<16>() {
        bytes = *head;
    }
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Formats an identity the way solution files expect it: braced and upper case.
pub fn format_guid(guid: Uuid) -> String {
    guid.braced().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guid_accepts_braces_and_case() {
        let plain = parse_guid("2150e333-8fdc-42a3-9474-1a3956d46de8").unwrap();
        let braced = parse_guid(" {2150E333-8FDC-42A3-9474-1A3956D46DE8} ").unwrap();
        assert_eq!(plain, braced);
        assert!(parse_guid("not-a-guid").is_err());
    }

    #[test]
    fn test_guid_from_name_is_stable() {
        let first = guid_from_name("Code/Core.build.toml");
        let second = guid_from_name("Code/Core.build.toml");
        let other = guid_from_name("Code/Editor.build.toml");

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.get_version_num(), 4);
    }

    #[test]
    fn test_format_guid_is_braced_upper_case() {
        let guid = parse_guid("9a19103f-16f7-4668-be54-9a1e7a4f7556").unwrap();
        assert_eq!(format_guid(guid), "{9A19103F-16F7-4668-BE54-9A1E7A4F7556}");
    }
}
