use tower_sessions::Session;

use crate::appresult::AppResult;
use crate::store::profiles::Profile;

const PROFILE_KEY: &str = "profile";

/// The device session: a snapshot of the signed-in profile. Views hydrate
/// once at mount and never watch for external changes; logout clears it.
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The signed-in profile snapshot, if any. Callers without one redirect
    /// to login.
    pub async fn hydrate(&self) -> AppResult<Option<Profile>> {
        Ok(self.session.get::<Profile>(PROFILE_KEY).await?)
    }

    pub async fn sign_in(&self, profile: &Profile) -> AppResult<()> {
        self.session.insert(PROFILE_KEY, profile).await?;
        Ok(())
    }

    /// Logout teardown: drop the whole session, not just the profile.
    pub async fn clear(&self) -> AppResult<()> {
        self.session.flush().await?;
        Ok(())
    }
}
