//! Detection of unresolved `{{ key }}` template placeholders.

use super::ConfigError;

/// Return the key of the first `{{ key }}` placeholder in `value`, if any.
///
/// Whitespace around the key is ignored; `{{}}` with an empty key is not a
/// placeholder.
pub(crate) fn find_placeholder(value: &str) -> Option<&str> {
    let mut rest = value;
    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let close = after_open.find("}}")?;
        let key = after_open[..close].trim();
        if !key.is_empty() {
            return Some(key);
        }
        rest = &after_open[close + 2..];
    }
    None
}

/// Reject `value` if it contains a placeholder, naming the setting.
pub(super) fn check(setting: &str, value: &str) -> Result<(), ConfigError> {
    match find_placeholder(value) {
        Some(key) => Err(ConfigError::UnresolvedTemplateKey {
            key: key.to_owned(),
            setting: setting.to_owned(),
        }),
        None => Ok(()),
    }
}

/// Reject the first value of `values` that contains a placeholder.
pub(super) fn check_all<'a, I>(setting: &str, values: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().try_for_each(|value| check(setting, value))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::spaced("{{ unset_key }}", Some("unset_key"))]
    #[case::tight("{{unset_key}}", Some("unset_key"))]
    #[case::embedded("https://{{ host }}:443/path", Some("host"))]
    #[case::first_of_many("{{ a }} and {{ b }}", Some("a"))]
    #[case::empty("{{ }}", None)]
    #[case::empty_then_key("{{}} {{ later }}", Some("later"))]
    #[case::unterminated("{{ open", None)]
    #[case::plain("api.example.com", None)]
    #[case::single_braces("{'@type': x}", None)]
    fn finds_placeholders(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(find_placeholder(value), expected);
    }

    #[test]
    fn check_names_key_and_setting() {
        let err = check("app_id", "{{ unset_key }}").expect_err("placeholder must be rejected");
        match err {
            ConfigError::UnresolvedTemplateKey { key, setting } => {
                assert_eq!(key, "unset_key");
                assert_eq!(setting, "app_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
