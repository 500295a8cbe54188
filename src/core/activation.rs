use crate::core::validation::ProfileError;
use crate::models::Profile;

/// A profile kind that can be shown to other users once complete
///
/// The base [`Profile`] has no activation of its own; concrete site
/// profiles override [`SiteProfile::activate`].
pub trait SiteProfile {
    fn profile(&self) -> &Profile;

    fn profile_mut(&mut self) -> &mut Profile;

    fn activate(&mut self) -> Result<(), ProfileError> {
        Err(ProfileError::ActivateNotImplemented)
    }

    fn deactivate(&mut self) {
        self.profile_mut().is_active = false;
    }

    fn is_active(&self) -> bool {
        self.profile().is_active
    }
}

impl SiteProfile for Profile {
    fn profile(&self) -> &Profile {
        self
    }

    fn profile_mut(&mut self) -> &mut Profile {
        self
    }
}

/// Profile taking part in matching
#[derive(Debug, Clone, PartialEq)]
pub struct MatchProfile {
    inner: Profile,
}

impl MatchProfile {
    pub fn new(profile: Profile) -> Self {
        Self { inner: profile }
    }

    pub fn into_inner(self) -> Profile {
        self.inner
    }
}

impl From<Profile> for MatchProfile {
    fn from(profile: Profile) -> Self {
        Self::new(profile)
    }
}

impl SiteProfile for MatchProfile {
    fn profile(&self) -> &Profile {
        &self.inner
    }

    fn profile_mut(&mut self) -> &mut Profile {
        &mut self.inner
    }

    fn activate(&mut self) -> Result<(), ProfileError> {
        self.inner.is_active = true;
        Ok(())
    }
}
