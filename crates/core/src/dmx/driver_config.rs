/// Longest software version label an RDM device may report.
pub const VERSION_LABEL_MAX: usize = 32;

/// RDM product category for a fixture.
pub const PRODUCT_CATEGORY_FIXTURE: u16 = 0x0101;

/// One selectable DMX personality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personality {
    /// Number of channels the personality occupies.
    pub footprint: u16,
    pub description: String,
}

/// Device descriptor handed to the DMX receive driver on install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub alloc_size: usize,
    pub model_id: u16,
    pub product_category: u16,
    pub software_version_id: u32,
    pub software_version_label: String,
    pub current_personality: u8,
    pub personalities: Vec<Personality>,
    pub dmx_start_address: u16,
}

impl DriverConfig {
    /// Descriptor for this firmware at the given build version number.
    pub fn for_version(software_version_id: u32) -> Self {
        Self {
            alloc_size: 255,
            model_id: 0,
            product_category: PRODUCT_CATEGORY_FIXTURE,
            software_version_id,
            software_version_label: version_label(&format!("PIXELDMX_V{}", software_version_id)),
            current_personality: 1,
            personalities: vec![Personality {
                footprint: 15,
                description: "Pixel Effect Mode".to_string(),
            }],
            dmx_start_address: 1,
        }
    }

    /// Descriptor derived from this crate's version, e.g. 0.1.0 becomes 100.
    pub fn from_build() -> Self {
        Self::for_version(build_version_id())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Truncate a label to `VERSION_LABEL_MAX` bytes without splitting a character.
pub fn version_label(label: &str) -> String {
    if label.len() <= VERSION_LABEL_MAX {
        return label.to_string();
    }
    let mut end = VERSION_LABEL_MAX;
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    label[..end].to_string()
}

fn build_version_id() -> u32 {
    let part = |s: &str| s.parse::<u32>().unwrap_or(0);
    part(env!("CARGO_PKG_VERSION_MAJOR")) * 10_000
        + part(env!("CARGO_PKG_VERSION_MINOR")) * 100
        + part(env!("CARGO_PKG_VERSION_PATCH"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let config = DriverConfig::for_version(2405);
        assert_eq!(config.alloc_size, 255);
        assert_eq!(config.model_id, 0);
        assert_eq!(config.product_category, PRODUCT_CATEGORY_FIXTURE);
        assert_eq!(config.software_version_label, "PIXELDMX_V2405");
        assert_eq!(config.personalities.len(), 1);
        assert_eq!(config.personalities[0].footprint, 15);
        assert_eq!(config.current_personality, 1);
        assert_eq!(config.dmx_start_address, 1);
    }

    #[test]
    fn test_label_is_truncated() {
        let long = "X".repeat(40);
        assert_eq!(version_label(&long).len(), VERSION_LABEL_MAX);
        assert_eq!(version_label("short"), "short");

        // multi-byte character straddling the limit is dropped whole
        let tricky = format!("{}é", "a".repeat(31));
        assert_eq!(version_label(&tricky), "a".repeat(31));
    }

    #[test]
    fn test_build_version_id() {
        let config = DriverConfig::from_build();
        assert!(config.software_version_label.starts_with("PIXELDMX_V"));
        assert_eq!(
            config.software_version_label,
            format!("PIXELDMX_V{}", config.software_version_id)
        );
    }
}
