/// Supreme Court registries that accept probate filings in British Columbia.
pub const BC_PROBATE_REGISTRIES: [&str; 27] = [
    "Campbell River",
    "Chilliwack",
    "Courtenay",
    "Cranbrook",
    "Dawson Creek",
    "Duncan",
    "Fort St. John",
    "Golden",
    "Kamloops",
    "Kelowna",
    "Nanaimo",
    "Nelson",
    "New Westminster",
    "Penticton",
    "Port Alberni",
    "Powell River",
    "Prince George",
    "Prince Rupert",
    "Quesnel",
    "Rossland",
    "Salmon Arm",
    "Smithers",
    "Terrace",
    "Vancouver",
    "Vernon",
    "Victoria",
    "Williams Lake",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMatch {
    Known(&'static str),
    Unknown,
}

/// Match a free-text registry against the known list, ignoring case, punctuation and a
/// trailing "registry"/"law courts" suffix.
pub fn canonical_registry(raw: &str) -> RegistryMatch {
    let key = registry_key(raw);
    if key.is_empty() {
        return RegistryMatch::Unknown;
    }

    BC_PROBATE_REGISTRIES
        .iter()
        .find(|name| registry_key(name) == key)
        .map(|name| RegistryMatch::Known(*name))
        .unwrap_or(RegistryMatch::Unknown)
}

fn registry_key(raw: &str) -> String {
    let lowered: String = raw
        .to_ascii_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || ch.is_whitespace())
        .collect();
    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    while matches!(words.last(), Some(&"registry") | Some(&"courts") | Some(&"law")) {
        words.pop();
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_common_spellings() {
        assert_eq!(canonical_registry("VANCOUVER"), RegistryMatch::Known("Vancouver"));
        assert_eq!(
            canonical_registry("Fort St John Registry"),
            RegistryMatch::Known("Fort St. John")
        );
        assert_eq!(
            canonical_registry("new westminster law courts"),
            RegistryMatch::Known("New Westminster")
        );
    }

    #[test]
    fn rejects_unknown_locations() {
        assert_eq!(canonical_registry("Calgary"), RegistryMatch::Unknown);
        assert_eq!(canonical_registry("   "), RegistryMatch::Unknown);
    }
}
