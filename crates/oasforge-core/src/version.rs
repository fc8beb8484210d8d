//! The OAS version tag that every version-dependent behavior branches on.

use std::fmt;

/// An OpenAPI Specification version family.
///
/// Ordered so that "feature requires ≥ 3.2" checks read naturally as
/// `version >= OasVersion::V3_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum OasVersion {
    /// Swagger / OpenAPI 2.0.
    V2_0,
    /// OpenAPI 3.0.x.
    V3_0,
    /// OpenAPI 3.1.
    ///
    /// The default: `Document::oas_version` is `#[serde(skip)]` (the field
    /// is derived from `swagger`/`openapi` during finalization, not read
    /// back from wire data), so `Deserialize` needs a fallback value.
    #[default]
    V3_1,
    /// OpenAPI 3.2.
    V3_2,
}

impl OasVersion {
    /// Whether this version family uses the 2.0 document shape
    /// (`definitions`, body parameters, direct response schemas).
    #[must_use]
    pub fn is_v2(self) -> bool {
        matches!(self, Self::V2_0)
    }

    /// Whether this version family uses the 3.x document shape
    /// (`components`, `requestBody`, content maps).
    #[must_use]
    pub fn is_v3(self) -> bool {
        !self.is_v2()
    }

    /// Whether webhooks (`AddWebhook`) are permitted at this version.
    ///
    /// Webhooks were introduced in OpenAPI 3.1.
    #[must_use]
    pub fn supports_webhooks(self) -> bool {
        self >= Self::V3_1
    }

    /// Whether the `QUERY` HTTP method is permitted as a path item key
    /// at this version. Introduced in OpenAPI 3.2.
    #[must_use]
    pub fn supports_query_method(self) -> bool {
        self >= Self::V3_2
    }

    /// The literal `openapi`/`swagger` version string written into the
    /// document root.
    #[must_use]
    pub fn spec_version_string(self) -> &'static str {
        match self {
            Self::V2_0 => "2.0",
            Self::V3_0 => "3.0.3",
            Self::V3_1 => "3.1.1",
            Self::V3_2 => "3.2.0",
        }
    }
}

impl fmt::Display for OasVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec_version_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_places_v2_below_all_v3_families() {
        assert!(OasVersion::V2_0 < OasVersion::V3_0);
        assert!(OasVersion::V3_0 < OasVersion::V3_1);
        assert!(OasVersion::V3_1 < OasVersion::V3_2);
    }

    #[test]
    fn webhooks_require_at_least_3_1() {
        assert!(!OasVersion::V2_0.supports_webhooks());
        assert!(!OasVersion::V3_0.supports_webhooks());
        assert!(OasVersion::V3_1.supports_webhooks());
        assert!(OasVersion::V3_2.supports_webhooks());
    }

    #[test]
    fn query_method_requires_at_least_3_2() {
        assert!(!OasVersion::V3_1.supports_query_method());
        assert!(OasVersion::V3_2.supports_query_method());
    }

    #[test]
    fn is_v2_and_is_v3_are_complementary() {
        for v in [
            OasVersion::V2_0,
            OasVersion::V3_0,
            OasVersion::V3_1,
            OasVersion::V3_2,
        ] {
            assert_ne!(v.is_v2(), v.is_v3());
        }
    }
}
