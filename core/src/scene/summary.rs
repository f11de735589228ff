//! What a viewer UI shows about a loaded scene.

/// UI-facing digest of a loaded asset's active scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSummary {
    /// Camera names; unnamed cameras appear as `Camera{index}`.
    pub cameras: Vec<String>,
    /// Animation names with their durations in seconds.
    pub animations: Vec<(String, f32)>,
    /// Whether any node carries an HDRI backdrop.
    pub has_backdrop: bool,
    /// One entry per configurable variant set, in field order.
    pub variant_fields: Vec<String>,
}

impl SceneSummary {
    pub fn is_configurable(&self) -> bool {
        !self.variant_fields.is_empty()
    }
}
