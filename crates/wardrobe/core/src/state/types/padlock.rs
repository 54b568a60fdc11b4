//! Padlock kinds and the lock state attached to lockable entities.

use super::{Timestamp, UserUid};
use crate::config::WardrobeConfig;

/// Kind of padlock placed on an ensemble or gag slot.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Padlock {
    #[default]
    None,
    Metal,
    FiveMinutes,
    Combination,
    Password,
    Timer,
    TimerPassword,
    Owner,
    OwnerTimer,
    Devotional,
    DevotionalTimer,
    /// Placed by cursed loot. Never user-lockable.
    Mimic,
}

/// Format a padlock password must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordRule {
    /// Exactly `n` ASCII digits.
    Digits(usize),
    /// Between 1 and `max` ASCII alphanumeric characters.
    Alphanumeric { max: usize },
}

impl PasswordRule {
    pub fn accepts(self, password: &str) -> bool {
        match self {
            PasswordRule::Digits(n) => {
                password.len() == n && password.bytes().all(|b| b.is_ascii_digit())
            }
            PasswordRule::Alphanumeric { max } => {
                !password.is_empty()
                    && password.len() <= max
                    && password.bytes().all(|b| b.is_ascii_alphanumeric())
            }
        }
    }
}

impl Padlock {
    /// Password format, if this padlock is secured by one.
    pub const fn password_rule(self) -> Option<PasswordRule> {
        match self {
            Padlock::Combination => Some(PasswordRule::Digits(WardrobeConfig::COMBINATION_LENGTH)),
            Padlock::Password | Padlock::TimerPassword => Some(PasswordRule::Alphanumeric {
                max: WardrobeConfig::MAX_PASSWORD_LENGTH,
            }),
            _ => None,
        }
    }

    pub const fn requires_password(self) -> bool {
        self.password_rule().is_some()
    }

    /// Padlocks that take a user-supplied timer string.
    pub const fn requires_timer(self) -> bool {
        matches!(
            self,
            Padlock::Timer | Padlock::TimerPassword | Padlock::OwnerTimer | Padlock::DevotionalTimer
        )
    }

    /// Padlocks that expire on their own once the release time passes.
    pub const fn is_timed(self) -> bool {
        self.requires_timer() || matches!(self, Padlock::FiveMinutes | Padlock::Mimic)
    }

    pub const fn is_owner(self) -> bool {
        matches!(self, Padlock::Owner | Padlock::OwnerTimer)
    }

    /// Devotional padlocks can only be removed by whoever placed them.
    pub const fn is_devotional(self) -> bool {
        matches!(self, Padlock::Devotional | Padlock::DevotionalTimer)
    }

    pub const fn is_system_only(self) -> bool {
        matches!(self, Padlock::Mimic)
    }
}

/// Details of a padlock currently in place.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveLock {
    pub padlock: Padlock,
    pub password: Option<String>,
    pub release: Option<Timestamp>,
    pub assigner: UserUid,
}

impl ActiveLock {
    pub fn new(padlock: Padlock, assigner: UserUid) -> Self {
        Self {
            padlock,
            password: None,
            release: None,
            assigner,
        }
    }

    #[must_use]
    pub fn with_release(mut self, release: Timestamp) -> Self {
        self.release = Some(release);
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// True once a timed padlock's release time has been reached.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.padlock.is_timed() && self.release.is_some_and(|release| release <= now)
    }
}

/// Lock state of a lockable entity.
///
/// An unlocked entity carries no password, timer or assigner; the enum
/// makes any other combination unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PadlockState {
    #[default]
    Unlocked,
    Locked(ActiveLock),
}

impl PadlockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, PadlockState::Locked(_))
    }

    pub fn padlock(&self) -> Padlock {
        match self {
            PadlockState::Unlocked => Padlock::None,
            PadlockState::Locked(lock) => lock.padlock,
        }
    }

    pub fn password(&self) -> Option<&str> {
        self.active().and_then(|lock| lock.password.as_deref())
    }

    pub fn release(&self) -> Option<Timestamp> {
        self.active().and_then(|lock| lock.release)
    }

    pub fn assigner(&self) -> Option<&UserUid> {
        self.active().map(|lock| &lock.assigner)
    }

    pub fn active(&self) -> Option<&ActiveLock> {
        match self {
            PadlockState::Unlocked => None,
            PadlockState::Locked(lock) => Some(lock),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.active().is_some_and(|lock| lock.is_expired(now))
    }
}
