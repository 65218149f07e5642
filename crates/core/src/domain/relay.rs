// Relay state model

/// Identity and switch position reported by the power relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayState {
    pub name: String,
    pub is_on: bool,
}

impl RelayState {
    pub fn matches(&self, expected_name: &str) -> bool {
        self.name == expected_name
    }
}
