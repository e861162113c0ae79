//! Column name normalization.
//!
//! Destination field names, result column names and dynamic row lookups all go through
//! [`normalize_column_name`], so `DeviceId`, `device_id` and `DEVICEID` meet on the same key.

/// Strip everything that is not a letter or digit and lowercase the rest.
///
/// A name with no letters or digits at all is returned unchanged.
///
/// ```rust
/// use sql_mapper::naming::normalize_column_name;
///
/// assert_eq!(normalize_column_name("Device_Id"), "deviceid");
/// assert_eq!(normalize_column_name("__"), "__");
/// ```
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    let key: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if key.is_empty() {
        name.to_string()
    } else {
        key
    }
}
