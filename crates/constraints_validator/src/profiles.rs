//! Profile activation.
//!
//! A check takes part in a validation only if one of its profiles is
//! active. Checks without profiles belong to [`DEFAULT_PROFILE`].

use constraints_core::DEFAULT_PROFILE;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct ProfileState {
    all_enabled_by_default: bool,
    enabled: HashSet<String>,
    disabled: HashSet<String>,
}

/// Global enable/disable state of profiles.
///
/// Starts with every profile enabled.
#[derive(Debug)]
pub struct ProfileSettings {
    state: RwLock<ProfileState>,
}

impl ProfileSettings {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ProfileState {
                all_enabled_by_default: true,
                enabled: HashSet::new(),
                disabled: HashSet::new(),
            }),
        }
    }

    /// Enables every profile not explicitly disabled afterwards.
    pub fn enable_all(&self) {
        let mut state = self.write();
        state.all_enabled_by_default = true;
        state.disabled.clear();
        debug!("All profiles enabled");
    }

    /// Disables every profile not explicitly enabled afterwards.
    pub fn disable_all(&self) {
        let mut state = self.write();
        state.all_enabled_by_default = false;
        state.enabled.clear();
        debug!("All profiles disabled");
    }

    pub fn enable(&self, profile: &str) {
        let mut state = self.write();
        state.enabled.insert(profile.to_string());
        if state.all_enabled_by_default {
            state.disabled.remove(profile);
        }
        debug!("Profile '{}' enabled", profile);
    }

    pub fn disable(&self, profile: &str) {
        let mut state = self.write();
        state.disabled.insert(profile.to_string());
        state.enabled.remove(profile);
        debug!("Profile '{}' disabled", profile);
    }

    pub fn is_enabled(&self, profile: &str) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.all_enabled_by_default {
            !state.disabled.contains(profile)
        } else {
            state.enabled.contains(profile)
        }
    }

    /// Returns true if any of `check_profiles` is active.
    ///
    /// A call-scoped profile list, when given, decides alone.
    pub fn is_any_enabled(&self, check_profiles: &[String], requested: Option<&[String]>) -> bool {
        match requested {
            Some(requested) => {
                if check_profiles.is_empty() {
                    requested.iter().any(|p| p == DEFAULT_PROFILE)
                } else {
                    check_profiles.iter().any(|p| requested.contains(p))
                }
            }
            None => {
                if check_profiles.is_empty() {
                    self.is_enabled(DEFAULT_PROFILE)
                } else {
                    check_profiles.iter().any(|p| self.is_enabled(p))
                }
            }
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ProfileState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self::new()
    }
}
