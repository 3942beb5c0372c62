//! Trigger engine - runs installed rules against every emitted event.
//!
//! Each rule passes through its gates in a fixed order:
//! 1. **Enabled**: `disabled` rules never fire
//! 2. **Event**: exact type or namespace prefix
//! 3. **Cooldown**: an unexpired `cooldownId` blocks the rule
//! 4. **Path/stage**: current pair state against `when.pathStage`
//! 5. **Time**: game clock against `when.time`
//! 6. **Flags**: `requireAll`, `requireAny`, `forbid`
//! 7. **Chance**: a uniform draw must fall below `chance`
//! 8. **Payload**: allow-lists on event location, witness, and item
//!
//! A rule that passes runs its actions in order and then arms its cooldown. A
//! failed gate only skips that rule. A diary failure aborts the remaining
//! actions of the failing rule, leaves its cooldown unarmed, and evaluation
//! moves on to the next rule.

mod ports;

pub use ports::*;

use sim_state::{ClockStore, CooldownStore, FlagStore, KeyValueStore};
use std::cell::RefCell;
use std::rc::Rc;

use crate::diary::{Diary, DiaryEntry, DiaryError, PairState, PairStatePatch};
use crate::events::{Bus, GameEvent, Subscription};
use crate::rules::{Action, DiaryAppend, RuleAction, TriggerRule, MAX_STAGE};

/// The character pair a rule set acts on, and the diary holding its state.
#[derive(Clone)]
pub struct TriggerContext {
    pub character_id: String,
    pub target_id: String,
    pub diary: Rc<RefCell<dyn Diary>>,
}

impl TriggerContext {
    pub fn new(
        character_id: impl Into<String>,
        target_id: impl Into<String>,
        diary: Rc<RefCell<dyn Diary>>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            target_id: target_id.into(),
            diary,
        }
    }

    pub fn pair_state(&self) -> Result<PairState, DiaryError> {
        let diary = self.diary.try_borrow().map_err(|_| DiaryError::Busy)?;
        Ok(diary.pair_state(&self.character_id, &self.target_id))
    }

    fn with_diary<T>(&self, f: impl FnOnce(&mut dyn Diary) -> T) -> Result<T, DiaryError> {
        let mut diary = self.diary.try_borrow_mut().map_err(|_| DiaryError::Busy)?;
        Ok(f(&mut *diary))
    }

    fn patch_pair(&self, patch: PairStatePatch) -> Result<(), DiaryError> {
        self.with_diary(|diary| diary.set_pair_state(&self.character_id, &self.target_id, patch))
    }
}

/// Rule interpreter bound to one session's stores.
#[derive(Clone)]
pub struct TriggerEngine {
    clock: ClockStore,
    flags: FlagStore,
    cooldowns: CooldownStore,
    wall_clock: Rc<dyn WallClock>,
    random: Rc<dyn RandomSource>,
}

impl TriggerEngine {
    /// Engine over `store` using real time and thread randomness.
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self::with_ports(
            ClockStore::new(store.clone()),
            FlagStore::new(store.clone()),
            CooldownStore::new(store),
            Rc::new(SystemWallClock),
            Rc::new(ThreadRandom),
        )
    }

    pub fn with_ports(
        clock: ClockStore,
        flags: FlagStore,
        cooldowns: CooldownStore,
        wall_clock: Rc<dyn WallClock>,
        random: Rc<dyn RandomSource>,
    ) -> Self {
        Self {
            clock,
            flags,
            cooldowns,
            wall_clock,
            random,
        }
    }

    pub fn clock(&self) -> &ClockStore {
        &self.clock
    }

    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.cooldowns
    }

    /// Subscribe one handler that evaluates `rules` for every event on `bus`.
    pub fn install(&self, bus: &Bus, rules: Vec<TriggerRule>, ctx: TriggerContext) -> Subscription {
        tracing::debug!(
            rules = rules.len(),
            character = %ctx.character_id,
            target = %ctx.target_id,
            "Installing trigger rules"
        );

        let engine = self.clone();
        bus.subscribe(move |event| {
            engine.evaluate(&rules, &ctx, event);
        })
    }

    /// Run every rule against `event`, returning the ids of rules that fired.
    pub fn evaluate(&self, rules: &[TriggerRule], ctx: &TriggerContext, event: &GameEvent) -> Vec<String> {
        let mut fired = Vec::new();

        for rule in rules {
            match self.run_rule(rule, ctx, event) {
                Ok(true) => {
                    tracing::debug!(rule = %rule.id, event = %event.kind, "Rule fired");
                    fired.push(rule.id.clone());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(rule = %rule.id, event = %event.kind, error = %e, "Rule actions aborted");
                }
            }
        }

        fired
    }

    fn run_rule(&self, rule: &TriggerRule, ctx: &TriggerContext, event: &GameEvent) -> Result<bool, DiaryError> {
        if !self.admits(rule, ctx, event)? {
            return Ok(false);
        }

        for action in rule.actions.iter().filter_map(RuleAction::known) {
            self.execute(action, ctx, event)?;
        }

        if let Some((id, ms)) = rule.cooldown() {
            self.cooldowns.arm(id, ms, self.wall_clock.now_millis());
        }
        Ok(true)
    }

    fn admits(&self, rule: &TriggerRule, ctx: &TriggerContext, event: &GameEvent) -> Result<bool, DiaryError> {
        if rule.is_disabled() {
            return Ok(rejected(rule, "disabled"));
        }
        if !rule.event.matches(&event.kind) {
            return Ok(false);
        }
        if let Some(id) = &rule.cooldown_id {
            if self.cooldowns.is_active(id, self.wall_clock.now_millis()) {
                return Ok(rejected(rule, "cooldown"));
            }
        }

        let pair = ctx.pair_state()?;
        let when = rule.when.as_ref();
        if let Some(gate) = when.and_then(|w| w.path_stage.as_ref()) {
            if !gate.admits(&pair) {
                return Ok(rejected(rule, "path_stage"));
            }
        }

        if let Some(window) = when.and_then(|w| w.time.as_ref()) {
            let clock = self.clock.get();
            if !window.contains(clock.hour, clock.day) {
                return Ok(rejected(rule, "time"));
            }
        }

        if let Some(gate) = &rule.flags {
            let set = self.flags.snapshot();
            if !gate.admits(|flag| set.contains(flag)) {
                return Ok(rejected(rule, "flags"));
            }
        }

        if let Some(chance) = rule.chance() {
            let draw = self.random.next_unit();
            if chance.is_nan() || draw >= chance {
                return Ok(rejected(rule, "chance"));
            }
        }

        if let Some(payload) = &rule.payload {
            if !payload.admits(event) {
                return Ok(rejected(rule, "payload"));
            }
        }

        Ok(true)
    }

    fn execute(&self, action: &Action, ctx: &TriggerContext, event: &GameEvent) -> Result<(), DiaryError> {
        match action {
            Action::DiaryAppend(append) => append_diary(append, ctx, event),
            Action::PathSet { path } => {
                let path = match path {
                    Some(path) => path.clone(),
                    None => ctx.pair_state()?.path,
                };
                ctx.patch_pair(PairStatePatch {
                    path: Some(path),
                    stage: None,
                })
            }
            Action::StageAdd { delta } => {
                let stage = ctx.pair_state()?.stage.saturating_add(*delta).clamp(0, MAX_STAGE);
                ctx.patch_pair(PairStatePatch {
                    path: None,
                    stage: Some(stage),
                })
            }
            Action::FlagAdd { flag } => {
                self.flags.add(flag);
                Ok(())
            }
            Action::FlagRemove { flag } => {
                self.flags.remove(flag);
                Ok(())
            }
            Action::ArmCooldown { id, ms } => {
                self.cooldowns.arm(id, *ms, self.wall_clock.now_millis());
                Ok(())
            }
        }
    }
}

fn rejected(rule: &TriggerRule, gate: &'static str) -> bool {
    tracing::trace!(rule = %rule.id, gate, "Rule gate rejected");
    false
}

fn append_diary(append: &DiaryAppend, ctx: &TriggerContext, event: &GameEvent) -> Result<(), DiaryError> {
    let pair = ctx.pair_state()?;
    let path = append.path.clone().unwrap_or(pair.path);
    let stage = append.stage.unwrap_or(pair.stage);

    ctx.with_diary(|diary| {
        let text = match (&append.text, &append.event_key) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(key)) => diary.event_line(key, &path, stage),
            (None, None) => None,
        };

        match text {
            Some(text) => {
                let mut entry = DiaryEntry::new(text, path.clone(), stage);
                entry.mood = append.mood.clone();
                entry.tags = append.tags.clone().unwrap_or_default();
                diary.append_entry(entry)?;
            }
            None => tracing::debug!(event_key = ?append.event_key, "No diary text to append"),
        }

        if append.log_witness == Some(true) {
            if let Some(witness) = &event.witness {
                diary.log_witnessed(witness, &PairState { path, stage })?;
            }
        }
        Ok(())
    })?
}
