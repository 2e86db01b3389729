//! Component tracking the mode of the typesetting engine
//!
//! Texlang does not typeset, so nothing in the standard library changes the mode.
//! Hosts that drive a typesetter update the component as the mode changes,
//!     and the mode conditionals `\ifvmode`, `\ifhmode`, `\ifmmode` and `\ifinner`
//!     read it through [TexlangState::mode].
//! States using this component should forward that hook to [mode].

use texlang::traits::*;
use texlang::types::Mode;

/// Component for the current mode.
#[derive(Default)]
pub struct Component {
    mode: Mode,
}

impl Component {
    pub fn get(&self) -> Mode {
        self.mode
    }

    pub fn set(&mut self, mode: Mode) {
        log::trace!("entering {:?} mode", mode);
        self.mode = mode;
    }
}

/// Mode hook for states with a mode component.
#[inline]
pub fn mode<S: HasComponent<Component>>(state: &S) -> Mode {
    state.component().get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional;
    use std::collections::HashMap;
    use texlang::*;
    use texlang_testing::*;

    #[derive(Default)]
    struct State {
        conditional: conditional::Component,
        mode: Component,
        testing: TestingComponent,
    }

    impl TexlangState for State {
        fn mode(&self) -> Mode {
            mode(self)
        }
    }

    vm::implement_has_component![
        State,
        (conditional::Component, conditional),
        (Component, mode),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("else", conditional::get_else()),
            ("fi", conditional::get_fi()),
            ("ifhmode", conditional::get_if_h_mode()),
            ("ifinner", conditional::get_if_inner()),
            ("ifmmode", conditional::get_if_m_mode()),
            ("ifvmode", conditional::get_if_v_mode()),
        ])
    }

    fn restricted_horizontal(vm: &mut vm::VM<State>) {
        vm.state.mode.set(Mode::RestrictedHorizontal);
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (default_mode_is_vertical, r"\ifvmode v\else x\fi\ifinner i\fi", "v"),
            (default_mode_is_not_math, r"\ifmmode m\else x\fi", "x"),
        ),
    ];

    #[test]
    fn conditionals_see_updated_mode() {
        run_expansion_equality_test::<State>(
            r"\ifhmode h\fi\ifinner i\fi\ifvmode v\fi",
            "hi",
            &[
                TestOption::BuiltInCommands(built_in_commands),
                TestOption::CustomVMInitialization(restricted_horizontal),
            ],
        );
    }

    #[test]
    fn set_and_get() {
        let mut component: Component = Default::default();
        assert_eq!(component.get(), Mode::Vertical);
        component.set(Mode::DisplayMath);
        assert_eq!(component.get(), Mode::DisplayMath);
    }
}
