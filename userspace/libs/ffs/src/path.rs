use ffs_api_types::{FResult, FsResult};

/// Split an optional `N:` drive prefix off `path` and strip leading
/// separators from the rest.
///
/// `"0:/Test.txt"` → `(Some(0), "Test.txt")`, `"Test.txt"` → `(None, "Test.txt")`.
pub fn split_drive(path: &str) -> FsResult<(Option<u8>, &str)> {
    let (drive, rest) = match path.find(':') {
        Some(i) => {
            let prefix = &path[..i];
            if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FResult::InvalidDrive);
            }
            let drive = prefix.parse::<u8>().map_err(|_| FResult::InvalidDrive)?;
            (Some(drive), &path[i + 1..])
        }
        None => (None, path),
    };
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.contains(':') {
        return Err(FResult::InvalidName);
    }
    Ok((drive, rest))
}

/// Directory part of a drive-relative path, if it has one.
pub fn parent(path: &str) -> Option<&str> {
    path.trim_end_matches('/').rfind('/').map(|i| &path[..i])
}
