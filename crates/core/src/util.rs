// Small shared helpers

/// Split a comma-separated list, trimming entries and dropping empties
pub fn split_csv_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Mask an API key, showing only the last 5 characters
pub fn mask_api_key(api_key: &str) -> String {
    let key = api_key.trim();
    if key.chars().count() >= 5 {
        let tail: String = key
            .chars()
            .skip(key.chars().count() - 5)
            .collect();
        format!("***{tail}")
    } else {
        "***".to_string()
    }
}
