use super::domain::PersonName;

/// Split a free-text name on whitespace.
///
/// One token is a first name, two are first and last, three or more put every inner token
/// into the middle name. Suffixes ("Jr.", "III") and compound surnames are not recognized and
/// end up in the last or middle name respectively.
pub fn split_name(full_name: &str) -> PersonName {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => PersonName::default(),
        [first] => PersonName {
            first: (*first).to_string(),
            ..PersonName::default()
        },
        [first, last] => PersonName {
            first: (*first).to_string(),
            middle: String::new(),
            last: (*last).to_string(),
        },
        [first, middle @ .., last] => PersonName {
            first: (*first).to_string(),
            middle: middle.join(" "),
            last: (*last).to_string(),
        },
    }
}

/// Use explicit name parts when any are present, otherwise split the free-text name.
pub(crate) fn resolve_name(
    full_name: Option<&str>,
    first: Option<&str>,
    middle: Option<&str>,
    last: Option<&str>,
) -> PersonName {
    let part = |value: Option<&str>| value.map(str::trim).unwrap_or_default().to_string();
    let explicit = PersonName {
        first: part(first),
        middle: part(middle),
        last: part(last),
    };

    if !explicit.is_empty() {
        return explicit;
    }

    full_name.map(split_name).unwrap_or_default()
}
