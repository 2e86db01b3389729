//! # The Texlang standard library
//!
//! This crate contains implementations of TeX primitives for Texlang.
//! Each module provides the primitives for one area, and [StdLibState]
//!     composes every component the primitives need.

extern crate texlang;

use std::collections::HashMap;

use texlang::command;
use texlang::prelude as txl;
use texlang::token;
use texlang::traits::*;
use texlang::types::Mode;
use texlang::vm;
use texlang::vm::implement_has_component;

pub mod alias;
pub mod codes;
pub mod conditional;
pub mod def;
pub mod expansion;
pub mod group;
pub mod input;
pub mod mode;
pub mod namespace;
pub mod prefix;
pub mod registers;
pub mod the;
pub mod tracing;

/// A state struct that is compatible with every primitive in the Texlang standard library.
#[derive(Default)]
pub struct StdLibState {
    pub conditional: conditional::Component,
    pub mode: mode::Component,
    pub prefix: prefix::Component,
    pub testing: texlang_testing::TestingComponent,
}

impl TexlangState for StdLibState {
    #[inline]
    fn mode(&self) -> Mode {
        mode::mode(self)
    }

    #[inline]
    fn expansion_override_hook(
        token: token::Token,
        input: &mut vm::ExpansionInput<Self>,
        tag: Option<command::Tag>,
    ) -> txl::Result<Option<token::Token>> {
        expansion::noexpand_hook(token, input, tag)
    }

    #[inline]
    fn variable_assignment_scope_hook(state: &mut Self) -> bool {
        prefix::variable_assignment_scope_hook(state)
    }

    #[inline]
    fn group_change_hook(
        token: token::Token,
        input: &mut vm::ExecutionInput<Self>,
        change: vm::GroupChange,
    ) -> txl::Result<()> {
        tracing::group_change_hook(token, input, change)
    }
}

impl StdLibState {
    /// Returns every primitive in the standard library, keyed by name.
    pub fn all_built_ins() -> HashMap<&'static str, command::BuiltIn<StdLibState>> {
        HashMap::from([
            ("aftergroup", group::get_aftergroup()),
            //
            ("begingroup", group::get_begingroup()),
            //
            ("catcode", codes::get_catcode()),
            ("closein", input::get_closein()),
            ("count", registers::get_count()),
            //
            ("def", def::get_def()),
            ("delcode", codes::get_delcode()),
            ("dimen", registers::get_dimen()),
            //
            ("else", conditional::get_else()),
            ("endgroup", group::get_endgroup()),
            ("expandafter", expansion::get_expandafter()),
            //
            ("fi", conditional::get_fi()),
            //
            ("gdef", def::get_gdef()),
            ("global", prefix::get_global()),
            //
            ("if", conditional::get_if()),
            ("ifcase", conditional::get_if_case()),
            ("ifcat", conditional::get_if_cat()),
            ("ifdim", conditional::get_if_dim()),
            ("ifeof", input::get_ifeof()),
            ("iffalse", conditional::get_if_false()),
            ("ifhbox", conditional::get_if_h_box()),
            ("ifhmode", conditional::get_if_h_mode()),
            ("ifinner", conditional::get_if_inner()),
            ("ifmmode", conditional::get_if_m_mode()),
            ("ifnum", conditional::get_if_num()),
            ("ifodd", conditional::get_if_odd()),
            ("iftrue", conditional::get_if_true()),
            ("ifvbox", conditional::get_if_v_box()),
            ("ifvmode", conditional::get_if_v_mode()),
            ("ifvoid", conditional::get_if_void()),
            ("ifx", conditional::get_if_x()),
            ("input", input::get_input()),
            //
            ("lccode", codes::get_lccode()),
            ("let", alias::get_let()),
            //
            ("mathcode", codes::get_mathcode()),
            ("muskip", registers::get_muskip()),
            //
            ("namespace", namespace::get_namespace()),
            ("noexpand", expansion::get_noexpand()),
            //
            ("openin", input::get_openin()),
            ("or", conditional::get_or()),
            //
            ("relax", expansion::get_relax()),
            //
            ("sfcode", codes::get_sfcode()),
            ("skip", registers::get_skip()),
            //
            ("the", the::get_the()),
            ("toks", registers::get_toks()),
            ("tracinggroups", tracing::get_tracinggroups()),
            ("tracingifs", tracing::get_tracingifs()),
            //
            ("uccode", codes::get_uccode()),
        ])
    }

    /// Create a new VM that uses the standard library's state and all of its commands.
    ///
    /// The VM uses the plain TeX category codes for the special characters.
    pub fn new_vm() -> Box<vm::VM<StdLibState>> {
        let mut vm = vm::VM::<StdLibState>::new(StdLibState::all_built_ins());
        vm.groups.install_plain_tex_cat_codes();
        vm
    }
}

implement_has_component![
    StdLibState,
    (conditional::Component, conditional),
    (mode::Component, mode),
    (prefix::Component, prefix),
    (texlang_testing::TestingComponent, testing),
];

/// A TeX snippet that exercises some error case in the standard library.
pub struct ErrorCase {
    pub description: &'static str,
    pub source_code: &'static str,
}

impl ErrorCase {
    /// Returns a vector of TeX snippets that exercise the error paths of the standard library.
    pub fn all_error_cases() -> Vec<ErrorCase> {
        let mut cases = vec![];
        for (description, source_code) in [
            (r"\toks starts with a letter token", r"\toks 0 = a"),
            (
                r"end of input while scanning token list",
                r"\toks 0 = {  no closing brace",
            ),
            (r"end of input right after \toks", r"\toks 0"),
            (r"\count is out of bounds (negative)", r"\count -200"),
            (r"\count is out of bounds (positive)", r"\count 2000000"),
            ("file does not exist", r"\input doesNotExist"),
            ("end of input after \\global", r"\global"),
            ("can't be prefixed by \\global", r"\global \relax"),
            ("can't be prefixed by \\global (character)", r"\global a"),
            ("invalid relation", r"\ifnum 3 z 4"),
            ("undefined control sequence", r"\elephant"),
            ("invalid end of group", r"}"),
            ("unmatched \\endgroup", r"\endgroup"),
            ("\\endgroup closes a simple group", r"{\endgroup"),
            ("invalid start of number", r"\count X"),
            ("invalid start of number (eof)", r"\count"),
            ("invalid start of number (not a variable)", r"\count \def"),
            (
                "read positive number from negative variable value",
                r"\count 0 = -1 \count \count 0",
            ),
            ("invalid character", r"\count `\def"),
            ("invalid character (eof)", r"\count `"),
            ("invalid octal digit", r"\count '9"),
            ("invalid hexadecimal digit", "\\count \"Z"),
            (
                "decimal number too big",
                r"\count 1000000000000000000000",
            ),
            ("category code out of bounds", r"\catcode 0 = 17"),
            ("invalid command target", r"\let a = \count"),
            ("invalid command target (eof)", r"\let"),
            ("stray \\fi", r"\fi"),
            ("stray \\else", r"\else"),
            ("\\or outside \\ifcase", r"\iftrue \or \fi"),
            ("unterminated conditional", r"\iffalse never closed"),
            ("group closed inside a conditional", r"{\iftrue}\fi"),
            ("conditional closed inside a group", r"\iftrue{\fi}"),
            ("\\the applied to a character", r"\the a"),
            ("\\noexpand at the end of input", r"\noexpand"),
            ("\\expandafter at the end of input", r"\expandafter\relax"),
            ("macro parameter out of order", r"\def\A#2{}"),
            ("macro uses undeclared parameter", r"\def\A#1{#2}"),
            ("namespace without braces", r"\namespace foo"),
        ] {
            cases.push(ErrorCase {
                description,
                source_code,
            })
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texlang::error;
    use texlang_testing::*;

    type State = StdLibState;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        StdLibState::all_built_ins()
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (
                overwrite_else,
                r"\def\else{}\ifodd 2 \else should be skipped \fi",
                r""
            ),
            (
                texbook_exercise_20_7,
                r"\catcode`\[=1 \catcode`\]=2 \catcode`\!=6 \def\!!1#2![{!#]#!!2}\! x{[y]][z}",
                r"\catcode`\[=1 \catcode`\]=2 \catcode`\!=6 {#]![y][z}",
            ),
            (
                ifx_let_alias_of_macro,
                r"\def\A{x}\let\B=\A \ifx\A\B same\else different\fi",
                "same"
            ),
            (
                ifx_equal_macros,
                r"\def\A{x}\def\B{x}\ifx\A\B same\else different\fi",
                "same"
            ),
            (
                ifx_different_macros,
                r"\def\A{x}\def\B{y}\ifx\A\B same\else different\fi",
                "different"
            ),
            (
                ifx_primitive_alias,
                r"\let\B=\relax \ifx\B\relax same\else different\fi",
                "same"
            ),
            (
                ifx_different_primitives,
                r"\ifx\relax\iftrue same\else different\fi",
                "different"
            ),
            (
                ifx_undefined_commands,
                r"\ifx\undefinedA\undefinedB same\else different\fi",
                "same"
            ),
            (
                ifx_undefined_and_macro,
                r"\def\A{}\ifx\undefined\A same\else different\fi",
                "different"
            ),
            (
                ifnum_reads_register,
                r"\count 1=5 \ifnum\count 1>4 big\else small\fi",
                "big"
            ),
            (
                expandafter_into_conditional,
                r"\def\A{1 }\def\B{\A}\expandafter\ifnum\B=1 yes\else no\fi",
                "yes"
            ),
            (
                noexpand_in_ifx,
                r"\def\A{x}\expandafter\ifx\noexpand\A\A same\else different\fi",
                "same"
            ),
            (
                ifcat_noexpand_active_macros,
                r"x\def~{a}\ifcat\noexpand~\noexpand~ same\else different\fi",
                "x same"
            ),
            (
                if_noexpand_active_macro_against_primitive_alias,
                r"\def~{a}\let\B=\relax \if\noexpand~\B same\else different\fi",
                "different"
            ),
            (
                global_within_nested_groups,
                r"\count 1=1 {{\global\count 1=2 }}\the\count 1",
                "2"
            ),
            (
                let_global_within_nested_groups,
                r"{{\global\let\A=\relax}}\ifx\A\relax same\else different\fi",
                "same"
            ),
            (
                aftergroup_with_conditional,
                r"{\iftrue\aftergroup x\fi y}",
                "yx"
            ),
            (
                conditional_inside_group,
                r"{\iffalse a\else b\fi}",
                "b"
            ),
            (
                group_inside_conditional,
                r"\iftrue{a}\fi",
                "a"
            ),
            (
                semi_simple_group_inside_conditional,
                r"\iftrue\begingroup a\endgroup\fi",
                "a"
            ),
            (
                catcode_reverts_after_conditional_group,
                r"\iftrue{\catcode`\A=10 }\fi xAy",
                "xAy"
            ),
        ),
        error_kind_tests(
            (
                group_closed_inside_conditional,
                r"{\iftrue}\fi",
                conditional::ConditionalGroupMismatch
            ),
            (
                conditional_closed_inside_group,
                r"\iftrue{\fi}",
                conditional::ConditionalGroupMismatch
            ),
            (
                conditional_closed_inside_semi_simple_group,
                r"\iftrue\begingroup\fi\endgroup",
                conditional::ConditionalGroupMismatch
            ),
            (
                undefined_command,
                r"\elephant",
                error::UndefinedCommandError
            ),
        ),
    ];

    #[test]
    fn all_error_cases() {
        let options = vec![
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::AllowUndefinedCommands(false),
        ];
        for case in ErrorCase::all_error_cases() {
            println!("CASE {}", case.description);
            run_failure_test::<StdLibState>(case.source_code, &options)
        }
    }

    #[test]
    fn new_vm_has_plain_cat_codes() {
        let vm = StdLibState::new_vm();
        assert_eq!(vm.groups.cat_code('{'), token::CatCode::BeginGroup);
        assert_eq!(vm.groups.cat_code('#'), token::CatCode::Parameter);
        assert_eq!(vm.groups.cat_code('a'), token::CatCode::Letter);
    }

    #[test]
    fn all_built_ins_have_docs() {
        for (name, built_in) in StdLibState::all_built_ins() {
            assert!(built_in.doc().is_some(), "{name} has no documentation");
        }
    }
}
