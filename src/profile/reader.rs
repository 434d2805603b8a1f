//! Load profiles from their JSON rendition.

use super::schema::Profile;
use crate::utils::error::ProfileError;
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read a profile from a JSON file
///
/// **Public** - main entry point for profile input
///
/// # Errors
/// * `ProfileError::ReadFailed` - file cannot be opened
/// * `ProfileError::JsonError` - content is not a profile document
/// * `ProfileError::Invalid` - sample arrays contradict each other
pub fn read_profile(input_path: impl AsRef<Path>) -> Result<Profile, ProfileError> {
    let input_path = input_path.as_ref();

    info!("Reading profile from: {}", input_path.display());

    let file = File::open(input_path)?;
    let profile: Profile = serde_json::from_reader(BufReader::new(file))?;
    profile.validate()?;

    debug!(
        "Loaded profile with {} nodes and {} samples",
        profile.nodes.len(),
        profile.samples.len()
    );

    Ok(profile)
}

/// Parse a profile from a JSON string
///
/// **Public** - useful for tests and in-memory use
pub fn parse_profile(json: &str) -> Result<Profile, ProfileError> {
    let profile: Profile = serde_json::from_str(json)?;
    profile.validate()?;
    Ok(profile)
}
