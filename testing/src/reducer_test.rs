//! Given/When/Then harness for Staybook reducers

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use staybook_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Drive a reducer through one or more actions and check the outcome.
///
/// Queued actions are reduced in order against the same state. State checks
/// see the state after the last action; effect checks see only the effects
/// returned by the last action, which is usually the outcome event under test.
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(InventoryReducer::new())
///     .with_env(test_environment())
///     .given_state(InventoryState::default())
///     .when_action(InventoryAction::CreateHotel { request_id, hotel })
///     .then_state(|state| assert!(state.last_error.is_none()))
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    given: Option<S>,
    when: Vec<A>,
    state_checks: Vec<StateCheck<S>>,
    effect_checks: Vec<EffectCheck<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            given: None,
            when: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment handed to every `reduce` call
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    /// Given: the state before the first action
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.given = Some(state);
        self
    }

    /// When: queue one action
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.when.push(action);
        self
    }

    /// When: queue several actions, typically a command and its outcome event
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.when.extend(actions);
        self
    }

    /// Then: check the final state
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Then: check the effects of the last action
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce every queued action, then run the checks in the order given
    ///
    /// # Panics
    ///
    /// Panics when the state, the environment or the actions are missing,
    /// and whenever a check fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self.given.expect("call given_state() before run()");
        let env = self.env.expect("call with_env() before run()");
        assert!(!self.when.is_empty(), "call when_action() before run()");

        let mut last_effects = Vec::new();
        for action in self.when {
            last_effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(&last_effects);
        }
    }
}

/// Ready-made effect checks
pub mod assertions {
    use staybook_core::effect::Effect;

    /// Nothing would run: every effect is a no-op
    ///
    /// # Panics
    ///
    /// Panics if any effect does work.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_noop),
            "expected only no-op effects, got {effects:?}"
        );
    }

    /// Exactly `expected` top-level effects
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(effects.len(), expected, "unexpected number of effects");
    }

    /// At least one effect is a request (`Effect::Future`)
    ///
    /// # Panics
    ///
    /// Panics when no request would be made.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|effect| matches!(effect, Effect::Future(_))),
            "expected a request effect, found none"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::{SmallVec, smallvec};

    #[derive(Debug, Default)]
    struct Holds {
        rooms_held: u32,
        waiting: bool,
    }

    #[derive(Debug)]
    enum HoldAction {
        Hold,
        Release,
        Request,
        Granted,
    }

    struct HoldReducer;

    impl Reducer for HoldReducer {
        type State = Holds;
        type Action = HoldAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Holds,
            action: HoldAction,
            _env: &(),
        ) -> SmallVec<[Effect<HoldAction>; 4]> {
            match action {
                HoldAction::Hold => {
                    state.rooms_held += 1;
                    SmallVec::new()
                },
                HoldAction::Release => {
                    state.rooms_held = state.rooms_held.saturating_sub(1);
                    smallvec![Effect::None]
                },
                HoldAction::Request => {
                    state.waiting = true;
                    smallvec![Effect::Future(Box::pin(async { Some(HoldAction::Granted) }))]
                },
                HoldAction::Granted => {
                    state.waiting = false;
                    state.rooms_held += 1;
                    SmallVec::new()
                },
            }
        }
    }

    #[test]
    fn state_after_single_action() {
        ReducerTest::new(HoldReducer)
            .with_env(())
            .given_state(Holds::default())
            .when_action(HoldAction::Hold)
            .then_state(|state| assert_eq!(state.rooms_held, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effects_come_from_the_last_action() {
        ReducerTest::new(HoldReducer)
            .with_env(())
            .given_state(Holds {
                rooms_held: 2,
                waiting: false,
            })
            .when_actions([HoldAction::Release, HoldAction::Request])
            .then_state(|state| {
                assert_eq!(state.rooms_held, 1);
                assert!(state.waiting);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}
