/// Pure functions for permission settings (Discord-agnostic)

/// Parse a comma-separated owner list, returning the ids and the rejected entries
pub fn parse_owner_ids(raw: &str) -> (Vec<u64>, Vec<String>) {
    let mut ids = Vec::new();
    let mut rejected = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.parse::<u64>() {
            Ok(id) if id != 0 => ids.push(id),
            _ => rejected.push(entry.to_string()),
        }
    }
    (ids, rejected)
}
