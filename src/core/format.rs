//! String surgery on FORMAT and INFO fields.
//!
//! These are pure helpers used by the merge engine when it synthesizes a
//! consensus record. They operate on the flat wire-format strings so that
//! untouched tags keep their exact byte layout.

/// Builds an all-missing genotype string with the same arity as the given
/// colon-delimited FORMAT specification. A leading `GT` field becomes the
/// diploid placeholder `./.`, every other field becomes `.`.
///
/// `GT:GQ:AD` -> `./.:.:.` and `GQ:AD` -> `.:.`
pub fn null_format_string(format_spec: &str) -> String {
    format_spec
        .split(':')
        .enumerate()
        .map(|(i, field)| if i == 0 && field == "GT" { "./." } else { "." })
        .collect::<Vec<_>>()
        .join(":")
}

/// Returns true when every sub-value of a colon-delimited genotype string is
/// missing, treating `./.`-style allele lists as missing as well.
pub fn is_null_genotype(value: &str) -> bool {
    value
        .split(':')
        .all(|sub| sub.split(['/', '|']).all(|allele| allele == "."))
}

/// Removes the single tag starting with `tag_prefix` (e.g. `SOMETAG=`) from a
/// semicolon-delimited tag string, rejoining the remaining tags in their
/// original order. A prefix that matches nothing leaves the input unchanged.
pub fn clip_out_tag(info_string: &str, tag_prefix: &str) -> String {
    info_string
        .split(';')
        .filter(|entry| !entry.starts_with(tag_prefix))
        .collect::<Vec<_>>()
        .join(";")
}

/// Appends `:` + `disambiguator` to the value of the named origin-set tag,
/// preserving the tag's position among its neighbors. Returns the updated tag
/// string together with the original (pre-update) value, or `None` when the
/// tag is absent.
pub fn update_origin_tag(
    info_string: &str,
    tag_name: &str,
    disambiguator: &str,
) -> Option<(String, String)> {
    let prefix = format!("{tag_name}=");
    let mut original = None;
    let updated = info_string
        .split(';')
        .map(|entry| match entry.strip_prefix(prefix.as_str()) {
            Some(value) => {
                original = Some(value.to_string());
                format!("{prefix}{value}:{disambiguator}")
            }
            None => entry.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";");
    original.map(|value| (updated, value))
}

/// [`update_origin_tag`] specialized to the default `SNAME` provenance tag.
pub fn update_sname(info_string: &str, disambiguator: &str) -> Option<(String, String)> {
    update_origin_tag(info_string, crate::PROVENANCE_TAG, disambiguator)
}
