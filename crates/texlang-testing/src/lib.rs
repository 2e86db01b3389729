/*!
Texlang unit testing library

This is a crate for writing unit tests for code that uses Texlang.
It is used extensively in the Texlang standard library,
    so the unit tests there are good examples of what this crate can do.

## Basic setup

As is common in all Texlang code,
    each unit test built with this library works with a specific user-defined Texlang state type.
This state type is provided by the unit test writer.
In addition to implementing the [`TexlangState`] trait, this state must also:

1. Include the [`TestingComponent`] type as a component.
    I.e., the state must implement the [`HasComponent<TestingComponent>`](texlang::traits::HasComponent<TestingComponent>) trait.

1. Implement [`Default`].

If the unit test doesn't require anything else from the state,
    the [`State`] type defined in this library can simply be used.

## Test types

### Expansion equality tests

Run using [`run_expansion_equality_test`].

These tests verify that two different TeX snippets expand to the same output.
For example, an output equality test can verify that
```tex
\def\HelloWorld{Hola Mundo}\HelloWorld - \HelloWorld
```
and
```tex
Hola Mundo - Hola Mundo
```
produce the same output.

These tests do _not_ verify that the state of the VM is the same in both cases.

### Failure tests

Run using [`run_failure_test`] or [`run_error_kind_test`].

These tests verify that a specific TeX snippet fails to execute.
The error kind variant additionally checks the concrete type of the error.

### Terminal output tests

Run using [`run_terminal_output_test`].

These tests verify what a TeX snippet writes to the terminal,
    for example the lines written by `\tracingifs`.

## The test suite macro

The preferred way to write a suite of unit tests is to use the [`test_suite`] macro.
This macro removes a bunch of boilerplate and makes it easy to add new test cases.

Run the tests with `RUST_LOG=trace` to see the VM's developer logs.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use texlang::prelude as txl;
use texlang::traits::*;
use texlang::vm::implement_has_component;
use texlang::vm::VM;
use texlang::*;

/// Texlang component that every unit testing state needs to have.
#[derive(Default)]
pub struct TestingComponent {
    allow_undefined_command: bool,
    tokens: Vec<token::Token>,
}

impl TestingComponent {
    fn take_tokens(&mut self) -> Vec<token::Token> {
        std::mem::take(&mut self.tokens)
    }

    /// Returns an integer variable command for use in tests.
    ///
    /// If you're writing a unit test that needs an integer variable it's easiest to use this
    ///     rather than building your own variable.
    /// The integer is stored in the group chain like any other TeX integer.
    pub fn get_integer<S: TexlangState>() -> command::BuiltIn<S> {
        variable::Command::new_singleton(variable::Kind::Int, "testing_integer").into()
    }
}

/// Simple state type for simple unit tests.
///
/// If the primitives under test don't require custom components or
/// other pieces in the state, it is easier to use this type rather than defining a custom one.
#[derive(Default)]
pub struct State {
    testing: TestingComponent,
}

impl TexlangState for State {}

implement_has_component![State, TestingComponent, testing];

/// An in-memory file system for tests.
#[derive(Default, Clone)]
pub struct InMemoryFileSystem {
    files: Rc<RefCell<HashMap<PathBuf, Vec<u8>>>>,
}

impl InMemoryFileSystem {
    /// Create a new file system containing the provided (path, content) pairs.
    ///
    /// Relative paths are resolved against the VM's working directory,
    ///     which is why the working directory is an argument.
    pub fn new(working_directory: &Path, files: &[(&str, &str)]) -> InMemoryFileSystem {
        let file_system: InMemoryFileSystem = Default::default();
        for (path, content) in files {
            file_system
                .files
                .borrow_mut()
                .insert(working_directory.join(path), content.as_bytes().to_vec());
        }
        file_system
    }

    /// Returns the content of the file at the path, if it exists.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }
}

impl vm::FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        match self.files.borrow().get(path) {
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no file at {}", path.display()),
            )),
            Some(content) => String::from_utf8(content.clone())
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err)),
        }
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

/// Option passed to a test runner.
pub enum TestOption<'a, S> {
    /// The built-in commands are the result of invoking the provided static function.
    ///
    /// Overrides previous `BuiltInCommands` or `BuiltInCommandsDyn` options.
    BuiltInCommands(fn() -> HashMap<&'static str, command::BuiltIn<S>>),

    /// The built-in commands are the result of invoking the provided closure.
    ///
    /// Overrides previous `BuiltInCommands` or `BuiltInCommandsDyn` options.
    BuiltInCommandsDyn(Box<dyn Fn() -> HashMap<&'static str, command::BuiltIn<S>> + 'a>),

    /// The provided static function is invoked after the VM is created and before execution starts.
    /// This can be used to provide more custom VM initialization.
    ///
    /// Overrides previous `CustomVMInitialization` or `CustomVMInitializationDyn` options.
    CustomVMInitialization(fn(&mut VM<S>)),

    /// The provided closure is invoked after the VM is created and before execution starts.
    /// This can be used to provide more custom VM initialization.
    ///
    /// Overrides previous `CustomVMInitialization` or `CustomVMInitializationDyn` options.
    #[allow(clippy::type_complexity)]
    CustomVMInitializationDyn(Box<dyn Fn(&mut VM<S>) + 'a>),

    /// Whether undefined commands raise an error.
    ///
    /// Overrides previous `AllowUndefinedCommands` options.
    AllowUndefinedCommands(bool),
}

/// Run an expansion equality test.
///
/// The test passes if the two provided input strings expand to the same tokens.
pub fn run_expansion_equality_test<S>(lhs: &str, rhs: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let mut vm_1 = initialize_vm(&options);
    let output_1 = match execute_source_code(&mut vm_1, lhs, &options) {
        Ok(output) => output,
        Err(err) => panic!("left hand side failed to run:\n{err}"),
    };

    let mut vm_2 = initialize_vm(&options);
    let output_2 = match execute_source_code(&mut vm_2, rhs, &options) {
        Ok(output) => output,
        Err(err) => panic!("right hand side failed to run:\n{err}"),
    };
    compare_output(output_1, &vm_1, output_2, &vm_2);
}

fn compare_output<S>(
    mut output_1: Vec<token::Token>,
    vm_1: &vm::VM<S>,
    mut output_2: Vec<token::Token>,
    vm_2: &vm::VM<S>,
) {
    let trim_space = |v: &mut Vec<token::Token>| {
        let last = match v.last() {
            None => return,
            Some(last) => last,
        };
        if last.cat_code() == Some(types::CatCode::Space) {
            v.pop();
        }
    };
    trim_space(&mut output_1);
    trim_space(&mut output_2);

    use ::texlang::token::CommandRef::ControlSequence;
    use ::texlang::token::Value::CommandRef;
    let equal = output_1.len() == output_2.len()
        && output_1
            .iter()
            .zip(output_2.iter())
            .all(|(token_1, token_2)| match (token_1.value(), token_2.value()) {
                (
                    CommandRef(ControlSequence(cs_name_1)),
                    CommandRef(ControlSequence(cs_name_2)),
                ) => {
                    vm_1.cs_name_interner().resolve(cs_name_1)
                        == vm_2.cs_name_interner().resolve(cs_name_2)
                }
                _ => token_1 == token_2,
            });

    if !equal {
        println!("Expansion output is different:");
        println!("------[lhs]------");
        println!(
            "'{}'",
            ::texlang::token::write_tokens(&output_1, vm_1.cs_name_interner())
        );
        println!("------[rhs]------");
        println!(
            "'{}'",
            ::texlang::token::write_tokens(&output_2, vm_2.cs_name_interner())
        );
        println!("-----------------");
        panic!("Expansion test failed");
    }
}

/// Run a failure test.
///
/// The test passes if execution of the provided input fails.
pub fn run_failure_test<S>(input: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    run_failure_test_impl(input, options);
}

/// Run a failure test that also checks the type of the error.
///
/// The test passes if execution of the provided input fails with an error of type `E`.
pub fn run_error_kind_test<S, E>(input: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
    E: error::TexError,
{
    let err = run_failure_test_impl(input, options);
    if err.downcast_ref::<E>().is_none() {
        panic!(
            "expected an error of type {}, got:\n{err}",
            std::any::type_name::<E>()
        );
    }
}

fn run_failure_test_impl<S>(input: &str, options: &[TestOption<S>]) -> Box<error::TracedTexError>
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let mut vm = initialize_vm(&options);
    match execute_source_code(&mut vm, input, &options) {
        Ok(output) => {
            println!("Expansion succeeded:");
            println!(
                "{}",
                ::texlang::token::write_tokens(&output, vm.cs_name_interner())
            );
            panic!("Expansion failure test did not pass: expansion successful");
        }
        Err(err) => {
            println!("{err}");
            err
        }
    }
}

/// Run a terminal output test.
///
/// The test passes if the input runs successfully
///     and writes exactly the expected string to the terminal.
pub fn run_terminal_output_test<S>(input: &str, expected: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let mut vm = initialize_vm(&options);
    let terminal_out: Rc<RefCell<Vec<u8>>> = Default::default();
    let writer: Rc<RefCell<dyn std::io::Write>> = terminal_out.clone();
    vm.terminal_out = writer;
    if let Err(err) = execute_source_code(&mut vm, input, &options) {
        panic!("input failed to run:\n{err}");
    }
    let got = String::from_utf8_lossy(&terminal_out.borrow()).to_string();
    assert_eq!(got, expected);
}

struct ResolvedOptions<'a, S> {
    built_in_commands: &'a dyn Fn() -> HashMap<&'static str, command::BuiltIn<S>>,
    custom_vm_initialization: &'a dyn Fn(&mut VM<S>),
    allow_undefined_commands: bool,
}

impl<'a, S> ResolvedOptions<'a, S> {
    pub fn new(options: &'a [TestOption<S>]) -> Self {
        let mut resolved = Self {
            built_in_commands: &HashMap::new,
            custom_vm_initialization: &|_| {},
            allow_undefined_commands: false,
        };
        for option in options {
            match option {
                TestOption::BuiltInCommands(f) => resolved.built_in_commands = f,
                TestOption::BuiltInCommandsDyn(f) => resolved.built_in_commands = f,
                TestOption::CustomVMInitialization(f) => resolved.custom_vm_initialization = f,
                TestOption::CustomVMInitializationDyn(f) => resolved.custom_vm_initialization = f,
                TestOption::AllowUndefinedCommands(b) => resolved.allow_undefined_commands = *b,
            }
        }
        resolved
    }
}

fn initialize_vm<S: Default>(options: &ResolvedOptions<S>) -> Box<vm::VM<S>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut vm = VM::<S>::new((options.built_in_commands)());
    vm.groups.install_plain_tex_cat_codes();
    (options.custom_vm_initialization)(&mut vm);
    vm
}

/// Execute source code in a VM with the provided options.
fn execute_source_code<S>(
    vm: &mut vm::VM<S>,
    source: &str,
    options: &ResolvedOptions<S>,
) -> Result<Vec<token::Token>, Box<error::TracedTexError>>
where
    S: Default + HasComponent<TestingComponent>,
{
    log::debug!("running test input {source:?}");
    if let Err(err) = vm.push_source("testing.tex", source) {
        panic!("failed to push the test source: {err:?}");
    }
    vm.state.component_mut().allow_undefined_command = options.allow_undefined_commands;
    vm.run::<Handlers>()?;
    Ok(vm.state.component_mut().take_tokens())
}

struct Handlers;

impl<S: HasComponent<TestingComponent>> vm::Handlers<S> for Handlers {
    fn character_handler(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        input.state_mut().component_mut().tokens.push(token);
        Ok(())
    }

    fn undefined_command_handler(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        if input.state().component().allow_undefined_command {
            input.state_mut().component_mut().tokens.push(token);
            Ok(())
        } else {
            Err(error::UndefinedCommandError::new(input.vm(), token).into())
        }
    }

    fn unexpanded_expansion_command(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        input.state_mut().component_mut().tokens.push(token);
        Ok(())
    }
}

/// Macro to generate a suite of unit tests
///
/// The general use of this macros looks like this:
/// ```
/// # use texlang_testing::*;
/// # use std::collections::HashMap;
/// # fn built_in_commands() -> HashMap<&'static str, texlang::command::BuiltIn<State>> {
/// #   HashMap::new()
/// # }
/// test_suite![
///     state(State),
///     options(TestOption::BuiltInCommands(built_in_commands)),
///     expansion_equality_tests(
///         (case_1, "lhs_1", "lhs_1"),
///         (case_2, "lhs_2", "lhs_2"),
///     ),
///     failure_tests(
///         (case_3, "}"),
///     ),
///     error_kind_tests(
///         (case_4, "}", texlang::vm::EndOfGroupError),
///     ),
///     terminal_output_tests(
///         (case_5, "a", ""),
///     ),
/// ];
/// ```
///
/// The arguments to the macro are:
///
/// - `state(State)`: defines which Rust type to use as the VM state in the tests.
///     This can be omitted, in which case it defaults to the type name `State` in the current scope.
///
/// - `options(option_1, option_2, ..., option_n)`: options to pass to the test runner.
///     This is a list of values of type [TestOption].
///     The options can be omitted, in which case they default to `options(TestOption::BuiltInCommands(built_in_commands))`.
///     In this case `built_in_commands` is a static function that returns a list of built-in primitives
///     to initialize the VM with.
///
/// - `expansion_equality_tests(cases...)`: a list of expansion equality test cases.
///     Each case is of the form (case name, left hand side, right hand side).
///     The data here is fed into the [run_expansion_equality_test] test runner.
///
/// - `failure_tests(cases...)`: a list of failure test cases.
///     Each case is of the form (case name, input).
///     The data here is fed into the [run_failure_test] test runner.
///
/// - `error_kind_tests(cases...)`: a list of failure test cases that check the error type.
///     Each case is of the form (case name, input, error type).
///     The data here is fed into the [run_error_kind_test] test runner.
///
/// - `terminal_output_tests(cases...)`: each case is of the form (case name, input, expected output).
///     The data here is fed into the [run_terminal_output_test] test runner.
///
/// Only one `state()` argument may be provided, and if provided it must be in the first position.
/// Only one `options()` argument may be provided, and if provided it must be in the first position
///     or after the `state()` argument.
/// Zero or more of the other arguments may be provided, and in any order.
#[macro_export]
macro_rules! test_suite {
    ( state($state: ty), options $options: tt, expansion_equality_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let lhs = $lhs;
                let rhs = $rhs;
                let options = vec! $options;
                texlang_testing::run_expansion_equality_test::<$state>(&lhs, &rhs, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, expansion_equality_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for expansion_equality_tests: must be a list of tuples (name, lhs, rhs)");
    );
    ( state($state: ty), options $options: tt, failure_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                texlang_testing::run_failure_test::<$state>(&input, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, error_kind_tests ( $( ($name: ident, $input: expr, $error: ty $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                texlang_testing::run_error_kind_test::<$state, $error>(&input, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, terminal_output_tests ( $( ($name: ident, $input: expr, $expected: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let expected = $expected;
                let options = vec! $options;
                texlang_testing::run_terminal_output_test::<$state>(&input, &expected, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `state, `options`, `expansion_equality_tests`, `failure_tests`, `error_kind_tests`, `terminal_output_tests`");
    );
    ( state($state: ty), options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            texlang_testing::test_suite![state($state), options $options, $test_kind $test_cases,];
        )+
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        texlang_testing::test_suite![state(State), options $options, $( $test_kind $test_cases, )+ ];
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        texlang_testing::test_suite![options (texlang_testing::TestOption::BuiltInCommands(built_in_commands)), $( $test_kind $test_cases, )+ ];
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("integer", TestingComponent::get_integer()),
            ("write", command::BuiltIn::new_execution(write)),
        ])
    }

    fn write(token: token::Token, input: &mut vm::ExecutionInput<State>) -> txl::Result<()> {
        let terminal_out = input.vm().terminal_out.clone();
        if write!(terminal_out.borrow_mut(), "written").is_err() {
            return Err(error::SimpleTokenError::new(token, "failed to write").into());
        }
        Ok(())
    }

    fn options() -> Vec<TestOption<'static, State>> {
        vec![TestOption::BuiltInCommands(built_in_commands)]
    }

    #[test]
    fn expansion_equality() {
        run_expansion_equality_test::<State>("abc", "abc", &options());
        run_expansion_equality_test::<State>(r"\integer=3 a", "a", &options());
        run_expansion_equality_test::<State>("{a}b", "ab", &options());
    }

    #[test]
    #[should_panic]
    fn expansion_inequality() {
        run_expansion_equality_test::<State>("abc", "abd", &options());
    }

    #[test]
    fn failure() {
        run_failure_test::<State>(r"\undefined", &options());
    }

    #[test]
    #[should_panic]
    fn failure_test_with_successful_input() {
        run_failure_test::<State>("a", &options());
    }

    #[test]
    fn error_kind() {
        run_error_kind_test::<State, texlang::vm::EndOfGroupError>("a}", &options());
        run_error_kind_test::<State, texlang::error::UndefinedCommandError>(
            r"\undefined",
            &options(),
        );
    }

    #[test]
    #[should_panic]
    fn wrong_error_kind() {
        run_error_kind_test::<State, texlang::error::UndefinedCommandError>("a}", &options());
    }

    #[test]
    fn terminal_output() {
        run_terminal_output_test::<State>(r"\write a", "written", &options());
    }

    fn allow_undefined() -> Vec<TestOption<'static, State>> {
        vec![
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::AllowUndefinedCommands(true),
        ]
    }

    #[test]
    fn undefined_commands_can_be_allowed() {
        run_expansion_equality_test::<State>(r"\undefined", r"\undefined", &allow_undefined());
    }

    #[test]
    fn in_memory_file_system() {
        use texlang::vm::FileSystem;
        let file_system = InMemoryFileSystem::new(Path::new("/root"), &[("a.tex", "content")]);
        assert_eq!(
            file_system.read_to_string(Path::new("/root/a.tex")).unwrap(),
            "content"
        );
        assert!(file_system.read_to_string(Path::new("/root/b.tex")).is_err());
        file_system
            .write_bytes(Path::new("/root/b.tex"), b"new")
            .unwrap();
        assert_eq!(file_system.get(Path::new("/root/b.tex")), Some(b"new".to_vec()));
    }
}
