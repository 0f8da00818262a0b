use reqwest::blocking::Client;

use crate::build_number::BuildNumberSource;
use crate::error::Result;
use crate::remote::{GoogleAuth, PlayEdits};

/// Highest version code on a Google Play track
pub struct PlayTrackSource {
    client: Client,
    auth: GoogleAuth,
    track: String,
}

impl PlayTrackSource {
    pub fn new(client: Client, auth: GoogleAuth, track: impl Into<String>) -> Self {
        PlayTrackSource {
            client,
            auth,
            track: track.into(),
        }
    }
}

impl BuildNumberSource for PlayTrackSource {
    fn describe(&self) -> String {
        format!("Google Play track '{}'", self.track)
    }

    fn latest_build_number(&self, identifier: &str, _version_name: &str) -> Result<Option<u64>> {
        let token = self.auth.access_token(&self.client)?;
        let edits = PlayEdits::new(&self.client, token, identifier);

        let edit_id = edits.insert()?;
        let track = edits.track(&edit_id, &self.track);
        edits.discard(&edit_id);

        track?.max_version_code()
    }
}
