use super::prelude::*;
use std::collections::HashMap;

/// Messenger file ids of photos that have been uploaded before.
///
/// Only files whose size still matches are reused, a changed file
/// has to be uploaded again.
pub fn find_file_ids<R: FileIdRepo>(
    repo: &R,
    paths: &HashMap<String, u64>,
) -> Result<HashMap<String, String>> {
    Ok(repo.find_file_ids(paths)?)
}

pub fn store_file_id<R: FileIdRepo>(repo: &R, path: &str, size: u64, file_id: &str) -> Result<()> {
    log::debug!("Remember file id {} for {}", file_id, path);
    Ok(repo.store_file_id(path, size, file_id)?)
}

pub fn find_path_for_file_id<R: FileIdRepo>(repo: &R, file_id: &str) -> Result<Option<String>> {
    Ok(repo.find_path_for_file_id(file_id)?)
}
