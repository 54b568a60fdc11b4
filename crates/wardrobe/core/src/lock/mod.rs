//! Padlock state machine shared by every lockable entity.
//!
//! States are `Unlocked` and `Locked`. [`Lockable::lock`] and
//! [`Lockable::unlock`] validate their request and either perform the
//! transition or return a reason without touching the target. The forced
//! variants skip validation entirely; they back the safeword and
//! system-initiated timer expiry and cannot fail.
mod error;
mod timer;

pub use error::{LockError, UnlockError};
pub use timer::{TimerError, parse_timer};

use bitflags::bitflags;
use chrono::TimeDelta;

use crate::config::WardrobeConfig;
use crate::state::{ActiveEnsemble, ActiveLock, GagSlot, Padlock, PadlockState, Timestamp, UserUid};

bitflags! {
    /// What an enactor is allowed to do to a particular target.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LockGrants: u8 {
        const APPLY            = 1 << 0;
        const REMOVE           = 1 << 1;
        const LOCK             = 1 << 2;
        const OWNER_LOCKS      = 1 << 3;
        const DEVOTIONAL_LOCKS = 1 << 4;
        /// Unconditional unlock of any padlock.
        const OVERRIDE         = 1 << 5;
    }
}

/// Grants plus the longest timer the enactor may set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permissions {
    pub grants: LockGrants,
    pub max_lock_time: TimeDelta,
}

impl Permissions {
    pub fn new(grants: LockGrants, max_lock_time: TimeDelta) -> Self {
        Self {
            grants,
            max_lock_time,
        }
    }

    /// Full control over one's own items, without override.
    pub fn owner() -> Self {
        Self::new(
            LockGrants::all() - LockGrants::OVERRIDE,
            WardrobeConfig::new().default_max_lock_time,
        )
    }

    pub fn none() -> Self {
        Self::new(LockGrants::empty(), TimeDelta::zero())
    }

    pub fn allows(&self, grant: LockGrants) -> bool {
        self.grants.contains(grant)
    }
}

/// A request to place a padlock.
#[derive(Clone, Copy, Debug)]
pub struct LockRequest<'a> {
    pub padlock: Padlock,
    pub password: Option<&'a str>,
    pub timer: Option<&'a str>,
    pub enactor: &'a UserUid,
    pub permissions: Permissions,
}

impl<'a> LockRequest<'a> {
    pub fn new(padlock: Padlock, enactor: &'a UserUid, permissions: Permissions) -> Self {
        Self {
            padlock,
            password: None,
            timer: None,
            enactor,
            permissions,
        }
    }

    #[must_use]
    pub fn password(mut self, password: &'a str) -> Self {
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn timer(mut self, timer: &'a str) -> Self {
        self.timer = Some(timer);
        self
    }
}

/// A request to remove a padlock.
#[derive(Clone, Copy, Debug)]
pub struct UnlockRequest<'a> {
    pub password: Option<&'a str>,
    pub enactor: &'a UserUid,
    pub permissions: Permissions,
}

impl<'a> UnlockRequest<'a> {
    pub fn new(enactor: &'a UserUid, permissions: Permissions) -> Self {
        Self {
            password: None,
            enactor,
            permissions,
        }
    }

    #[must_use]
    pub fn password(mut self, password: &'a str) -> Self {
        self.password = Some(password);
        self
    }
}

/// Capability interface of anything that can carry a padlock.
///
/// Implementors only provide access to their [`PadlockState`]; the
/// transitions are shared.
pub trait Lockable {
    fn lock_state(&self) -> &PadlockState;

    fn set_lock_state(&mut self, state: PadlockState);

    /// Whether this target accepts the given padlock kind.
    fn permits(&self, padlock: Padlock) -> bool {
        padlock != Padlock::None && !padlock.is_system_only()
    }

    /// `Unlocked -> Locked`, after validating the request.
    fn lock(&mut self, request: &LockRequest<'_>, now: Timestamp) -> Result<(), LockError> {
        let permitted = self.permits(request.padlock);
        let lock = validate_lock(self.lock_state(), permitted, request, now)?;
        self.set_lock_state(PadlockState::Locked(lock));
        Ok(())
    }

    /// `Locked -> Unlocked`, after validating the request. Returns the
    /// removed lock.
    fn unlock(
        &mut self,
        request: &UnlockRequest<'_>,
        now: Timestamp,
    ) -> Result<ActiveLock, UnlockError> {
        validate_unlock(self.lock_state(), request, now)?;
        take_lock(self).ok_or(UnlockError::NotLocked)
    }

    /// Places `lock` unconditionally, returning any lock it replaced.
    fn force_lock(&mut self, lock: ActiveLock) -> Option<ActiveLock> {
        let previous = self.force_unlock();
        self.set_lock_state(PadlockState::Locked(lock));
        previous
    }

    /// Removes any lock unconditionally.
    fn force_unlock(&mut self) -> Option<ActiveLock> {
        take_lock(self)
    }
}

impl Lockable for ActiveEnsemble {
    fn lock_state(&self) -> &PadlockState {
        &self.padlock
    }

    fn set_lock_state(&mut self, state: PadlockState) {
        self.padlock = state;
    }
}

impl Lockable for GagSlot {
    fn lock_state(&self) -> &PadlockState {
        &self.padlock
    }

    fn set_lock_state(&mut self, state: PadlockState) {
        self.padlock = state;
    }

    /// An empty slot has nothing to lock.
    fn permits(&self, padlock: Padlock) -> bool {
        !self.is_empty() && padlock != Padlock::None && !padlock.is_system_only()
    }
}

fn take_lock<L: Lockable + ?Sized>(target: &mut L) -> Option<ActiveLock> {
    let previous = target.lock_state().active().cloned();
    target.set_lock_state(PadlockState::Unlocked);
    previous
}

fn validate_lock(
    current: &PadlockState,
    permitted: bool,
    request: &LockRequest<'_>,
    now: Timestamp,
) -> Result<ActiveLock, LockError> {
    if current.is_locked() {
        return Err(LockError::AlreadyLocked);
    }

    let padlock = request.padlock;
    let permissions = &request.permissions;
    if !permissions.allows(LockGrants::LOCK) {
        return Err(LockError::PermissionDenied);
    }
    if !permitted {
        return Err(LockError::PadlockNotPermitted(padlock));
    }
    if padlock.is_owner() && !permissions.allows(LockGrants::OWNER_LOCKS) {
        return Err(LockError::PermissionDenied);
    }
    if padlock.is_devotional() && !permissions.allows(LockGrants::DEVOTIONAL_LOCKS) {
        return Err(LockError::PermissionDenied);
    }

    let mut lock = ActiveLock::new(padlock, request.enactor.clone());

    if let Some(rule) = padlock.password_rule() {
        match request.password {
            Some(password) if rule.accepts(password) => {
                lock.password = Some(password.to_owned());
            }
            _ => return Err(LockError::BadPasswordFormat(padlock)),
        }
    }

    if padlock.requires_timer() {
        let duration = parse_timer(request.timer.ok_or(TimerError::Missing)?)?;
        if duration <= TimeDelta::zero() {
            return Err(TimerError::NotPositive.into());
        }
        if duration > permissions.max_lock_time {
            return Err(TimerError::ExceedsLimit {
                max_secs: permissions.max_lock_time.num_seconds(),
            }
            .into());
        }
        let release = now.checked_add_signed(duration).ok_or(TimerError::Overflow)?;
        lock.release = Some(release);
    } else if padlock == Padlock::FiveMinutes {
        lock.release = Some(now + WardrobeConfig::five_minutes());
    }

    Ok(lock)
}

fn validate_unlock(
    current: &PadlockState,
    request: &UnlockRequest<'_>,
    now: Timestamp,
) -> Result<(), UnlockError> {
    let Some(lock) = current.active() else {
        return Err(UnlockError::NotLocked);
    };

    if request.permissions.allows(LockGrants::OVERRIDE) {
        return Ok(());
    }
    if *request.enactor == lock.assigner {
        return Ok(());
    }
    if lock.is_expired(now) {
        return Ok(());
    }

    let supplied = request.password.filter(|p| !p.is_empty());
    if !lock.padlock.is_devotional() {
        if let (Some(expected), Some(supplied)) = (lock.password.as_deref(), supplied) {
            if passwords_match(expected, supplied) {
                return Ok(());
            }
            return Err(UnlockError::WrongPassword);
        }
    }

    if let Some(release) = lock.release.filter(|_| lock.padlock.is_timed()) {
        return Err(UnlockError::not_yet_expired(release - now));
    }

    Err(UnlockError::NoPermission)
}

/// Compares without short-circuiting on the first differing byte.
fn passwords_match(expected: &str, supplied: &str) -> bool {
    let (a, b) = (expected.as_bytes(), supplied.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn active() -> ActiveEnsemble {
        ActiveEnsemble::new(Uuid::new_v4(), UserUid::new("wearer"))
    }

    fn lock_with(
        target: &mut ActiveEnsemble,
        padlock: Padlock,
        password: Option<&str>,
        timer: Option<&str>,
        enactor: &UserUid,
    ) -> Result<(), LockError> {
        let mut request = LockRequest::new(padlock, enactor, Permissions::owner());
        request.password = password;
        request.timer = timer;
        target.lock(&request, t0())
    }

    #[test]
    fn lock_stores_details_and_transitions() {
        let alice = UserUid::new("alice");
        let mut target = active();
        lock_with(&mut target, Padlock::Password, Some("Kitten42"), None, &alice).unwrap();

        assert!(target.lock_state().is_locked());
        assert_eq!(target.lock_state().padlock(), Padlock::Password);
        assert_eq!(target.lock_state().password(), Some("Kitten42"));
        assert_eq!(target.lock_state().assigner(), Some(&alice));
    }

    #[test]
    fn lock_rejects_when_already_locked() {
        let alice = UserUid::new("alice");
        let mut target = active();
        lock_with(&mut target, Padlock::Metal, None, None, &alice).unwrap();
        let before = target.clone();

        let result = lock_with(&mut target, Padlock::Metal, None, None, &alice);
        assert_eq!(result, Err(LockError::AlreadyLocked));
        assert_eq!(target, before);
    }

    #[test]
    fn lock_requires_lock_grant() {
        let alice = UserUid::new("alice");
        let mut target = active();
        let request = LockRequest::new(Padlock::Metal, &alice, Permissions::none());

        assert_eq!(target.lock(&request, t0()), Err(LockError::PermissionDenied));
        assert!(!target.lock_state().is_locked());
    }

    #[test]
    fn owner_and_devotional_padlocks_need_their_grants() {
        let alice = UserUid::new("alice");
        let mut target = active();
        let limited = Permissions::new(LockGrants::LOCK, TimeDelta::hours(1));

        let owner = LockRequest::new(Padlock::Owner, &alice, limited);
        assert_eq!(target.lock(&owner, t0()), Err(LockError::PermissionDenied));

        let devotional = LockRequest::new(Padlock::Devotional, &alice, limited);
        assert_eq!(target.lock(&devotional, t0()), Err(LockError::PermissionDenied));
    }

    #[test]
    fn mimic_and_none_are_never_user_lockable() {
        let alice = UserUid::new("alice");
        let mut target = active();
        assert_eq!(
            lock_with(&mut target, Padlock::Mimic, None, None, &alice),
            Err(LockError::PadlockNotPermitted(Padlock::Mimic))
        );
        assert_eq!(
            lock_with(&mut target, Padlock::None, None, None, &alice),
            Err(LockError::PadlockNotPermitted(Padlock::None))
        );
    }

    #[test]
    fn empty_gag_slot_cannot_be_locked() {
        let alice = UserUid::new("alice");
        let mut slot = GagSlot::default();
        let request = LockRequest::new(Padlock::Metal, &alice, Permissions::owner());
        assert_eq!(
            slot.lock(&request, t0()),
            Err(LockError::PadlockNotPermitted(Padlock::Metal))
        );
    }

    #[test]
    fn lock_validates_password_format() {
        let alice = UserUid::new("alice");
        let mut target = active();
        assert_eq!(
            lock_with(&mut target, Padlock::Combination, Some("12a4"), None, &alice),
            Err(LockError::BadPasswordFormat(Padlock::Combination))
        );
        assert_eq!(
            lock_with(&mut target, Padlock::Password, None, None, &alice),
            Err(LockError::BadPasswordFormat(Padlock::Password))
        );
        assert!(!target.lock_state().is_locked());
    }

    #[test]
    fn lock_validates_timer() {
        let alice = UserUid::new("alice");
        let mut target = active();
        assert_eq!(
            lock_with(&mut target, Padlock::Timer, None, None, &alice),
            Err(LockError::BadTimer(TimerError::Missing))
        );
        assert_eq!(
            lock_with(&mut target, Padlock::Timer, None, Some("soon"), &alice),
            Err(LockError::BadTimer(TimerError::MissingAmount('s')))
        );
        assert_eq!(
            lock_with(&mut target, Padlock::Timer, None, Some("0s"), &alice),
            Err(LockError::BadTimer(TimerError::NotPositive))
        );

        let short = Permissions::new(LockGrants::LOCK, TimeDelta::hours(1));
        let request = LockRequest::new(Padlock::Timer, &alice, short).timer("2h");
        assert_eq!(
            target.lock(&request, t0()),
            Err(LockError::BadTimer(TimerError::ExceedsLimit { max_secs: 3600 }))
        );
        assert!(!target.lock_state().is_locked());
    }

    #[test]
    fn timer_lock_sets_absolute_release() {
        let alice = UserUid::new("alice");
        let mut target = active();
        lock_with(&mut target, Padlock::Timer, None, Some("10s"), &alice).unwrap();
        assert_eq!(
            target.lock_state().release(),
            Some(t0() + TimeDelta::seconds(10))
        );
    }

    #[test]
    fn five_minute_padlock_has_fixed_release() {
        let alice = UserUid::new("alice");
        let mut target = active();
        lock_with(&mut target, Padlock::FiveMinutes, None, None, &alice).unwrap();
        assert_eq!(
            target.lock_state().release(),
            Some(t0() + TimeDelta::minutes(5))
        );
    }

    #[test]
    fn unlock_requires_locked_state() {
        let bob = UserUid::new("bob");
        let mut target = active();
        let request = UnlockRequest::new(&bob, Permissions::owner());
        assert_eq!(target.unlock(&request, t0()), Err(UnlockError::NotLocked));
    }

    #[test]
    fn assigner_can_always_unlock() {
        let alice = UserUid::new("alice");
        let mut target = active();
        lock_with(&mut target, Padlock::Password, Some("secret1"), None, &alice).unwrap();

        let request = UnlockRequest::new(&alice, Permissions::none());
        let removed = target.unlock(&request, t0()).unwrap();
        assert_eq!(removed.padlock, Padlock::Password);
        assert_eq!(*target.lock_state(), PadlockState::Unlocked);
    }

    #[test]
    fn matching_password_unlocks_for_anyone() {
        let alice = UserUid::new("alice");
        let bob = UserUid::new("bob");
        let mut target = active();
        lock_with(&mut target, Padlock::Combination, Some("0420"), None, &alice).unwrap();

        let wrong = UnlockRequest::new(&bob, Permissions::owner()).password("1234");
        assert_eq!(target.unlock(&wrong, t0()), Err(UnlockError::WrongPassword));
        assert!(target.lock_state().is_locked());

        let right = UnlockRequest::new(&bob, Permissions::owner()).password("0420");
        assert!(target.unlock(&right, t0()).is_ok());
        assert!(!target.lock_state().is_locked());
    }

    #[test]
    fn timer_lock_unlocks_for_anyone_once_elapsed() {
        let alice = UserUid::new("alice");
        let bob = UserUid::new("bob");
        let mut target = active();
        lock_with(&mut target, Padlock::Timer, None, Some("10s"), &alice).unwrap();

        let early = UnlockRequest::new(&bob, Permissions::none()).password("guess");
        assert_eq!(
            target.unlock(&early, t0() + TimeDelta::seconds(5)),
            Err(UnlockError::NotYetExpired { remaining_secs: 5 })
        );
        assert!(target.lock_state().is_locked());

        let late = UnlockRequest::new(&bob, Permissions::none()).password("anything");
        assert!(target.unlock(&late, t0() + TimeDelta::seconds(11)).is_ok());
    }

    #[test]
    fn timer_password_reports_wrong_password_first() {
        let alice = UserUid::new("alice");
        let bob = UserUid::new("bob");
        let mut target = active();
        lock_with(&mut target, Padlock::TimerPassword, Some("pw1"), Some("1h"), &alice).unwrap();

        let wrong = UnlockRequest::new(&bob, Permissions::owner()).password("pw2");
        assert_eq!(target.unlock(&wrong, t0()), Err(UnlockError::WrongPassword));

        let none = UnlockRequest::new(&bob, Permissions::owner());
        assert_eq!(
            target.unlock(&none, t0()),
            Err(UnlockError::NotYetExpired { remaining_secs: 3600 })
        );
    }

    #[test]
    fn metal_lock_rejects_strangers() {
        let alice = UserUid::new("alice");
        let bob = UserUid::new("bob");
        let mut target = active();
        lock_with(&mut target, Padlock::Metal, None, None, &alice).unwrap();

        let request = UnlockRequest::new(&bob, Permissions::owner()).password("x");
        assert_eq!(target.unlock(&request, t0()), Err(UnlockError::NoPermission));
    }

    #[test]
    fn devotional_lock_ignores_password_path() {
        let alice = UserUid::new("alice");
        let bob = UserUid::new("bob");
        let mut target = active();
        let request = LockRequest::new(
            Padlock::Devotional,
            &alice,
            Permissions::new(LockGrants::all(), TimeDelta::hours(1)),
        );
        target.lock(&request, t0()).unwrap();

        let attempt = UnlockRequest::new(&bob, Permissions::owner()).password("anything");
        assert_eq!(target.unlock(&attempt, t0()), Err(UnlockError::NoPermission));
    }

    #[test]
    fn override_grant_unlocks_anything() {
        let alice = UserUid::new("alice");
        let bob = UserUid::new("bob");
        let mut target = active();
        lock_with(&mut target, Padlock::Metal, None, None, &alice).unwrap();

        let request = UnlockRequest::new(
            &bob,
            Permissions::new(LockGrants::OVERRIDE, TimeDelta::zero()),
        );
        assert!(target.unlock(&request, t0()).is_ok());
    }

    #[test]
    fn forced_transitions_never_fail() {
        let mut target = active();
        assert!(target.force_unlock().is_none());

        let mimic = ActiveLock::new(Padlock::Mimic, UserUid::system())
            .with_release(t0() + TimeDelta::minutes(30));
        assert!(target.force_lock(mimic.clone()).is_none());
        assert_eq!(target.lock_state().padlock(), Padlock::Mimic);

        let metal = ActiveLock::new(Padlock::Metal, UserUid::new("alice"));
        assert_eq!(target.force_lock(metal), Some(mimic));

        assert!(target.force_unlock().is_some());
        assert_eq!(*target.lock_state(), PadlockState::Unlocked);
    }

    #[test]
    fn unlock_succeeds_only_through_a_listed_path() {
        let assigner = UserUid::new("alice");
        let stranger = UserUid::new("mallory");
        let now = t0() + TimeDelta::seconds(30);

        for padlock in [
            Padlock::Metal,
            Padlock::Combination,
            Padlock::Password,
            Padlock::Timer,
            Padlock::TimerPassword,
            Padlock::Owner,
            Padlock::Devotional,
        ] {
            let mut target = active();
            let password = match padlock {
                Padlock::Combination => Some("1111"),
                Padlock::Password | Padlock::TimerPassword => Some("right"),
                _ => None,
            };
            let timer = padlock.requires_timer().then_some("1m");
            let permissions = Permissions::new(LockGrants::all(), TimeDelta::hours(1));
            let mut request = LockRequest::new(padlock, &assigner, permissions);
            request.password = password;
            request.timer = timer;
            target.lock(&request, t0()).unwrap();

            for guess in [None, Some("wrong"), Some("")] {
                let attempt = UnlockRequest {
                    password: guess,
                    enactor: &stranger,
                    permissions: Permissions::owner(),
                };
                assert!(
                    target.clone().unlock(&attempt, now).is_err(),
                    "{padlock} opened without a valid path"
                );
            }
        }
    }
}
