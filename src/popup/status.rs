use serde::Serialize;

/// Status line under the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLabel {
    pub text: &'static str,
    /// CSS color.
    pub color: &'static str,
}

impl StatusLabel {
    pub const ENABLED: StatusLabel = StatusLabel {
        text: "监测状态：已开启",
        color: "#28a745",
    };

    pub const DISABLED: StatusLabel = StatusLabel {
        text: "监测状态：已关闭",
        color: "#dc3545",
    };

    pub fn for_enabled(enabled: bool) -> &'static StatusLabel {
        if enabled {
            &Self::ENABLED
        } else {
            &Self::DISABLED
        }
    }
}
