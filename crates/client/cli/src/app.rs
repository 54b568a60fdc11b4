//! Runs one subcommand against the runtime and prints the outcome.
use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use wardrobe_core::{Padlock, PadlockState, UserUid, WardrobeState};
use wardrobe_runtime::{ApplyReport, LockParams, RedrawWait, Runtime};

use crate::command::{Command, LockSubject};

pub struct WardrobeApp {
    runtime: Runtime,
    enactor: UserUid,
}

impl WardrobeApp {
    pub fn new(runtime: Runtime, enactor: UserUid) -> Self {
        Self { runtime, enactor }
    }

    pub async fn execute(self, command: Command) -> Result<()> {
        let pipeline = self.runtime.pipeline();
        let enactor = &self.enactor;
        tracing::info!(?command, enactor = %enactor.as_str(), "executing command");

        let report = match command {
            Command::Status => {
                print_status(&pipeline.state_snapshot());
                None
            }
            Command::Enable { id, layers } => {
                Some(pipeline.enable_ensemble(enactor, id, layers).await?)
            }
            Command::Disable => Some(pipeline.disable_ensemble(enactor).await?),
            Command::Gag { gag, slot } => Some(pipeline.apply_gag(enactor, slot, gag).await?),
            Command::Ungag { slot } => Some(pipeline.remove_gag(enactor, slot).await?),
            Command::Lock {
                subject,
                padlock,
                password,
                timer,
            } => {
                let mut params = LockParams::new(padlock);
                if let Some(password) = password {
                    params = params.with_password(password);
                }
                if let Some(timer) = timer {
                    params = params.with_timer(timer);
                }
                Some(match subject {
                    LockSubject::Ensemble => pipeline.lock_ensemble(enactor, &params).await?,
                    LockSubject::Gag(slot) => pipeline.lock_gag(enactor, slot, &params).await?,
                })
            }
            Command::Unlock { subject, password } => {
                let password = password.as_deref();
                Some(match subject {
                    LockSubject::Ensemble => pipeline.unlock_ensemble(enactor, password).await?,
                    LockSubject::Gag(slot) => pipeline.unlock_gag(enactor, slot, password).await?,
                })
            }
            Command::Roll => {
                let mut rng = StdRng::from_entropy();
                Some(pipeline.roll_cursed_loot(&mut rng).await?)
            }
            Command::Safeword => Some(pipeline.safeword(enactor).await?),
        };

        if let Some(report) = report {
            print_report(&report);
        }
        self.runtime.shutdown().await?;
        Ok(())
    }
}

fn print_report(report: &ApplyReport) {
    if !report.changed {
        println!("nothing changed");
        return;
    }
    match report.redraw {
        RedrawWait::Settled => println!("applied (revision {})", report.revision),
        other => println!("applied (revision {}, redraw {})", report.revision, other),
    }
}

fn print_status(state: &WardrobeState) {
    match state.active.as_ref() {
        Some(active) => {
            let label = state
                .ensemble(active.id)
                .map_or("<missing>", |ensemble| ensemble.label.as_str());
            println!("ensemble: {label} ({}){}", active.id, lock_suffix(&active.padlock));
        }
        None => println!("ensemble: none"),
    }

    for (index, slot) in state.gags.iter().enumerate() {
        match slot.gag {
            Some(gag) => println!("gag {index}: {gag}{}", lock_suffix(&slot.padlock)),
            None => println!("gag {index}: empty"),
        }
    }

    if state.blindfold.active {
        println!("blindfold: on");
    }

    for item in state.active_cursed() {
        match item.release {
            Some(release) => println!("cursed: {} until {}", item.label, release.to_rfc3339()),
            None => println!("cursed: {}", item.label),
        }
    }
}

fn lock_suffix(padlock: &PadlockState) -> String {
    match padlock.active() {
        Some(lock) if lock.padlock != Padlock::None => match lock.release {
            Some(release) => format!(" [{} until {}]", lock.padlock, release.to_rfc3339()),
            None => format!(" [{}]", lock.padlock),
        },
        _ => String::new(),
    }
}
