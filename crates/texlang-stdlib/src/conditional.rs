//! Conditional primitives (`\if...`, `\else`, `\or`, `\fi` and `\ifcase`)
//!
//! Every open conditional is recorded on a stack that lives in this module's [Component].
//! The stack is independent of the group chain:
//!     a conditional opened inside a group must also be closed inside it,
//!     and the reverse.
//! Interleavings like `{\iftrue}\fi` are errors.
//!
//! When a conditional evaluates to false the input is skipped, without expansion,
//!     until the matching `\else` or `\fi` is found.
//! Tokens are classified while skipping by the [tag](command::Tag) of their command:
//!     every `\if`-like primitive shares one tag,
//!     and `\else`, `\or` and `\fi` each have their own.
//! Nested conditionals in the skipped text are counted so that their delimiters
//!     don't end the skip early.
//!
//! # Writing new conditional primitives
//!
//! A new conditional is a type implementing the [Condition] trait.
//! The trait's [build_if_command](Condition::build_if_command) method returns
//!     a primitive that handles the stack, the branch skipping and tracing.
//! The `\ifeof` primitive in the [input](crate::input) module is written this way.

use std::cmp::Ordering;
use texlang::parse::{self, Uint};
use texlang::prelude as txl;
use texlang::token::{CommandRef, Value};
use texlang::traits::*;
use texlang::types::{CatCode, Orientation, Scaled};
use texlang::*;

use crate::tracing;

pub const IF_DOC: &str = "Compare the character codes of two tokens";
pub const IFCAT_DOC: &str = "Compare the category codes of two tokens";
pub const IFX_DOC: &str = "Compare the meanings of two unexpanded tokens";
pub const IFNUM_DOC: &str = "Compare two integers";
pub const IFDIM_DOC: &str = "Compare two dimensions";
pub const IFODD_DOC: &str = "Check if an integer is odd";
pub const IFVMODE_DOC: &str = "Check if the current mode is vertical";
pub const IFHMODE_DOC: &str = "Check if the current mode is horizontal";
pub const IFMMODE_DOC: &str = "Check if the current mode is math";
pub const IFINNER_DOC: &str = "Check if the current mode is internal vertical, restricted horizontal or non-display math";
pub const IFTRUE_DOC: &str = "Evaluate the true branch";
pub const IFFALSE_DOC: &str = "Evaluate the false branch";
pub const IFVOID_DOC: &str = "Check if a box register is void";
pub const IFHBOX_DOC: &str = "Check if a box register contains a horizontal box";
pub const IFVBOX_DOC: &str = "Check if a box register contains a vertical box";
pub const IFCASE_DOC: &str = "Begin a switch statement";
pub const ELSE_DOC: &str = "Start the else branch of a conditional or switch statement";
pub const OR_DOC: &str = "Begin the next branch of a switch statement";
pub const FI_DOC: &str = "End a conditional or switch statement";

static IF_TAG: command::StaticTag = command::StaticTag::new();
static ELSE_TAG: command::StaticTag = command::StaticTag::new();
static OR_TAG: command::StaticTag = command::StaticTag::new();
static FI_TAG: command::StaticTag = command::StaticTag::new();

/// The tag shared by every `\if`-like primitive.
pub fn if_tag() -> command::Tag {
    IF_TAG.get()
}

/// The result of evaluating a conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The condition is still being evaluated.
    Pending,
    Boolean(bool),
    /// The case selected by `\ifcase`.
    Case(i32),
}

/// Where the input currently is relative to a conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The operands of the condition are being read.
    Evaluating,
    /// The branch that was selected is being expanded.
    InTrueBranch,
    /// The `\else` branch is being expanded.
    InFalseBranch,
    /// The matching `\fi` has been reached.
    Closed,
}

/// An open conditional.
#[derive(Debug, Clone, Copy)]
pub struct Conditional {
    /// The token that opened the conditional, like `\ifnum`.
    pub token: token::Token,
    pub outcome: Outcome,
    pub state: State,
    /// Level of the group chain when the conditional was opened.
    pub group_level: usize,
}

/// Component for the conditional primitives.
#[derive(Default)]
pub struct Component {
    // Innermost conditional last.
    conditionals: Vec<Conditional>,
    // Levels of the open groups that already have a group end check registered, ascending.
    checked_group_levels: Vec<usize>,
}

impl Component {
    /// The conditionals that are currently open, innermost last.
    pub fn conditionals(&self) -> &[Conditional] {
        &self.conditionals
    }
}

/// A condition that can be turned into an `\if`-like primitive.
pub trait Condition<S: HasComponent<Component>>: Sized {
    /// Reads the operands of the condition from the input and evaluates it.
    fn evaluate(token: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool>;

    /// Builds the primitive for this condition.
    fn build_if_command() -> command::BuiltIn<S> {
        command::BuiltIn::new_expansion(if_primitive_fn::<S, Self>).with_tag(IF_TAG.get())
    }
}

fn if_primitive_fn<S: HasComponent<Component>, C: Condition<S>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let index = push(token, input)?;
    let result = C::evaluate(token, input)?;
    resolve(token, input, index, Outcome::Boolean(result))?;
    if result {
        set_state(input, index, State::InTrueBranch);
        return Ok(());
    }
    loop {
        let (delimiter, delimiter_token) = skip(token, input, true)?;
        if close_inner(input, index, delimiter) {
            continue;
        }
        trace_delimiter(delimiter_token, input, index)?;
        return match delimiter {
            Delimiter::Else => {
                set_state(input, index, State::InFalseBranch);
                Ok(())
            }
            Delimiter::Fi => {
                pop(input);
                Ok(())
            }
            Delimiter::Or => Err(StrayBranchDelimiter {
                token: delimiter_token,
                reason: StrayReason::OrOutsideCase,
            }
            .into()),
        };
    }
}

/// Get the `\ifcase` primitive.
pub fn get_if_case<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_case_primitive_fn)
        .with_tag(IF_TAG.get())
        .with_doc(IFCASE_DOC)
}

fn if_case_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let index = push(token, input)?;
    let n = i32::parse(input)?;
    resolve(token, input, index, Outcome::Case(n))?;
    if n == 0 {
        set_state(input, index, State::InTrueBranch);
        return Ok(());
    }
    let mut ors_seen = 0_i32;
    loop {
        let (delimiter, delimiter_token) = skip(token, input, true)?;
        if close_inner(input, index, delimiter) {
            continue;
        }
        trace_delimiter(delimiter_token, input, index)?;
        match delimiter {
            Delimiter::Or => {
                // A negative case never matches an \or.
                ors_seen += 1;
                if ors_seen == n {
                    set_state(input, index, State::InTrueBranch);
                    return Ok(());
                }
            }
            Delimiter::Else => {
                set_state(input, index, State::InFalseBranch);
                return Ok(());
            }
            Delimiter::Fi => {
                pop(input);
                return Ok(());
            }
        }
    }
}

/// Get the `\else` primitive.
pub fn get_else<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(else_primitive_fn)
        .with_tag(ELSE_TAG.get())
        .with_doc(ELSE_DOC)
}

fn else_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let conditional = check_delimiter(token, input, Delimiter::Else)?;
    finish_true_branch(token, input, conditional)
}

/// Get the `\or` primitive.
pub fn get_or<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(or_primitive_fn)
        .with_tag(OR_TAG.get())
        .with_doc(OR_DOC)
}

fn or_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let conditional = check_delimiter(token, input, Delimiter::Or)?;
    finish_true_branch(token, input, conditional)
}

// The selected branch has ended at an \else or \or; everything up to the matching \fi is skipped.
fn finish_true_branch<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
    index: usize,
) -> txl::Result<()> {
    trace_delimiter(token, input, index)?;
    loop {
        let (delimiter, delimiter_token) = skip(token, input, false)?;
        if close_inner(input, index, delimiter) {
            continue;
        }
        trace_delimiter(delimiter_token, input, index)?;
        pop(input);
        return Ok(());
    }
}

/// Get the `\fi` primitive.
pub fn get_fi<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(fi_primitive_fn)
        .with_tag(FI_TAG.get())
        .with_doc(FI_DOC)
}

fn fi_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let index = check_delimiter(token, input, Delimiter::Fi)?;
    trace_delimiter(token, input, index)?;
    pop(input);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Else,
    Or,
    Fi,
}

impl Delimiter {
    fn name(&self) -> &'static str {
        match self {
            Delimiter::Else => r"\else",
            Delimiter::Or => r"\or",
            Delimiter::Fi => r"\fi",
        }
    }
}

fn conditionals<S: HasComponent<Component>, T: TokenStream<S = S>>(input: &T) -> &[Conditional] {
    &input.state().component().conditionals
}

fn push<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<usize> {
    let group_level = input.vm().groups.level();
    let conditional = Conditional {
        token,
        outcome: Outcome::Pending,
        state: State::Evaluating,
        group_level,
    };
    log::trace!("pushing conditional {conditional:?}");
    let stack = &mut input.state_mut().component_mut().conditionals;
    stack.push(conditional);
    let index = stack.len() - 1;
    let checked_group_levels = &mut input.state_mut().component_mut().checked_group_levels;
    if group_level > 0 && checked_group_levels.last() != Some(&group_level) {
        checked_group_levels.push(group_level);
        input.after_group_callback(Box::new(check_group_end::<S>));
    }
    if tracing::tracing_ifs(input.vm()) {
        let name = token.value().to_string(input.vm().cs_name_interner());
        let line = input.trace(token).line_number;
        let level = index + 1;
        tracing::write_line(
            input.vm(),
            token,
            &format!("{{{name}: (level {level}) entered on line {line}}}"),
        )?;
    }
    Ok(index)
}

fn pop<S: HasComponent<Component>>(input: &mut vm::ExpansionInput<S>) {
    if let Some(mut conditional) = input.state_mut().component_mut().conditionals.pop() {
        conditional.state = State::Closed;
        log::trace!("popped conditional {conditional:?}");
    }
}

fn set_state<S: HasComponent<Component>>(
    input: &mut vm::ExpansionInput<S>,
    index: usize,
    state: State,
) {
    if let Some(conditional) = input
        .state_mut()
        .component_mut()
        .conditionals
        .get_mut(index)
    {
        conditional.state = state;
    }
}

// Records the outcome of the conditional at the index, after checking it is still open.
fn resolve<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
    index: usize,
    outcome: Outcome,
) -> txl::Result<()> {
    match input
        .state_mut()
        .component_mut()
        .conditionals
        .get_mut(index)
    {
        Some(conditional) if conditional.token == token && conditional.state == State::Evaluating => {
            conditional.outcome = outcome;
            Ok(())
        }
        _ => Err(ImpossibleState { token }.into()),
    }
}

// Conditionals opened while the operands of an outer conditional were read may still be open
// when the outer conditional starts skipping.
// A \fi found at depth zero closes the innermost of these,
// and any other delimiter found in this situation is passed over.
fn close_inner<S: HasComponent<Component>>(
    input: &mut vm::ExpansionInput<S>,
    index: usize,
    delimiter: Delimiter,
) -> bool {
    if conditionals(input).len() <= index + 1 {
        return false;
    }
    if delimiter == Delimiter::Fi {
        pop(input);
    }
    true
}

// Checks that an \else, \or or \fi is valid and returns the index of its conditional.
fn check_delimiter<S: HasComponent<Component>>(
    token: token::Token,
    input: &vm::ExpansionInput<S>,
    delimiter: Delimiter,
) -> txl::Result<usize> {
    let stack = conditionals(input);
    let (index, conditional) = match stack.last() {
        None => {
            return Err(StrayBranchDelimiter {
                token,
                reason: StrayReason::NoOpenConditional(delimiter.name()),
            }
            .into())
        }
        Some(conditional) => (stack.len() - 1, *conditional),
    };
    let valid = match (delimiter, conditional.state) {
        (_, State::Evaluating) => {
            return Err(StrayBranchDelimiter {
                token,
                reason: StrayReason::WhileEvaluating(delimiter.name(), conditional.token),
            }
            .into())
        }
        (Delimiter::Fi, State::InTrueBranch | State::InFalseBranch) => true,
        (Delimiter::Else, State::InTrueBranch) => true,
        (Delimiter::Or, State::InTrueBranch) => matches!(conditional.outcome, Outcome::Case(_)),
        _ => false,
    };
    if !valid {
        let reason = if delimiter == Delimiter::Or && conditional.state == State::InTrueBranch {
            StrayReason::OrOutsideCase
        } else {
            StrayReason::InFalseBranch(delimiter.name(), conditional.token)
        };
        return Err(StrayBranchDelimiter { token, reason }.into());
    }
    let current_level = input.vm().groups.level();
    if conditional.group_level != current_level {
        return Err(ConditionalGroupMismatch {
            token,
            conditional: conditional.token,
            opened_at_level: conditional.group_level,
            current_level,
        }
        .into());
    }
    Ok(index)
}

fn check_group_end<S: HasComponent<Component>>(
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let current_level = input.groups().level();
    let component = input.state_mut().component_mut();
    while component
        .checked_group_levels
        .last()
        .is_some_and(|level| *level > current_level)
    {
        component.checked_group_levels.pop();
    }
    match component
        .conditionals
        .iter()
        .find(|conditional| conditional.group_level > current_level)
    {
        None => Ok(()),
        Some(conditional) => Err(ConditionalGroupMismatch {
            token: conditional.token,
            conditional: conditional.token,
            opened_at_level: conditional.group_level,
            current_level,
        }
        .into()),
    }
}

fn trace_delimiter<S: HasComponent<Component>>(
    delimiter_token: token::Token,
    input: &vm::ExpansionInput<S>,
    index: usize,
) -> txl::Result<()> {
    if !tracing::tracing_ifs(input.vm()) {
        return Ok(());
    }
    let conditional = match conditionals(input).get(index) {
        None => return Ok(()),
        Some(conditional) => *conditional,
    };
    let interner = input.vm().cs_name_interner();
    let delimiter = delimiter_token.value().to_string(interner);
    let name = conditional.token.value().to_string(interner);
    let line = input.trace(conditional.token).line_number;
    let level = index + 1;
    tracing::write_line(
        input.vm(),
        delimiter_token,
        &format!("{{{delimiter}: {name} (level {level}) entered on line {line}}}"),
    )
}

// Skips raw tokens until a delimiter at depth zero is found.
//
// If `stop_at_branch` is false, only a \fi ends the skip.
fn skip<S: HasComponent<Component>>(
    started_by: token::Token,
    input: &mut vm::ExpansionInput<S>,
    stop_at_branch: bool,
) -> txl::Result<(Delimiter, token::Token)> {
    let if_tag = IF_TAG.get();
    let else_tag = ELSE_TAG.get();
    let or_tag = OR_TAG.get();
    let fi_tag = FI_TAG.get();
    let mut depth = 0_usize;
    let mut skipped = 0_usize;
    while let Some(token) = input.unexpanded().next()? {
        skipped += 1;
        let tag = match token.value() {
            Value::CommandRef(command_ref) => input
                .vm()
                .groups
                .command(&command_ref)
                .and_then(command::Command::tag),
            _ => None,
        };
        let delimiter = match tag {
            None => continue,
            Some(tag) if tag == if_tag => {
                depth += 1;
                continue;
            }
            Some(tag) if tag == fi_tag => {
                if depth > 0 {
                    depth -= 1;
                    continue;
                }
                Delimiter::Fi
            }
            Some(tag) if tag == else_tag && depth == 0 && stop_at_branch => Delimiter::Else,
            Some(tag) if tag == or_tag && depth == 0 && stop_at_branch => Delimiter::Or,
            Some(_) => continue,
        };
        log::debug!(
            "skipped {skipped} tokens to reach {} at conditional depth 0",
            delimiter.name()
        );
        return Ok((delimiter, token));
    }
    Err(UnterminatedConditional {
        token: started_by,
        line: input.trace(started_by).line_number,
    }
    .into())
}

macro_rules! conditional {
    ( $( $struct: ident, $get_fn: ident, $name: literal, $doc: ident, $evaluate: ident; )* ) => {
        $(
            struct $struct;

            impl<S: HasComponent<Component>> Condition<S> for $struct {
                fn evaluate(token: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
                    $evaluate(token, input)
                }
            }

            #[doc = concat!("Get the `\\", $name, "` primitive.")]
            pub fn $get_fn<S: HasComponent<Component>>() -> command::BuiltIn<S> {
                <$struct as Condition<S>>::build_if_command().with_doc($doc)
            }
        )*
    };
}

conditional![
    IfChar, get_if, "if", IF_DOC, if_char;
    IfCat, get_if_cat, "ifcat", IFCAT_DOC, if_cat;
    IfX, get_if_x, "ifx", IFX_DOC, if_x;
    IfNum, get_if_num, "ifnum", IFNUM_DOC, if_num;
    IfDim, get_if_dim, "ifdim", IFDIM_DOC, if_dim;
    IfOdd, get_if_odd, "ifodd", IFODD_DOC, if_odd;
    IfVMode, get_if_v_mode, "ifvmode", IFVMODE_DOC, if_v_mode;
    IfHMode, get_if_h_mode, "ifhmode", IFHMODE_DOC, if_h_mode;
    IfMMode, get_if_m_mode, "ifmmode", IFMMODE_DOC, if_m_mode;
    IfInner, get_if_inner, "ifinner", IFINNER_DOC, if_inner;
    IfTrue, get_if_true, "iftrue", IFTRUE_DOC, if_true;
    IfFalse, get_if_false, "iffalse", IFFALSE_DOC, if_false;
    IfVoid, get_if_void, "ifvoid", IFVOID_DOC, if_void;
    IfHBox, get_if_h_box, "ifhbox", IFHBOX_DOC, if_h_box;
    IfVBox, get_if_v_box, "ifvbox", IFVBOX_DOC, if_v_box;
];

fn if_true<S>(_: token::Token, _: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(true)
}

fn if_false<S>(_: token::Token, _: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(false)
}

fn if_v_mode<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(input.state().mode().is_vertical())
}

fn if_h_mode<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(input.state().mode().is_horizontal())
}

fn if_m_mode<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(input.state().mode().is_math())
}

fn if_inner<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(input.state().mode().is_inner())
}

fn if_char<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<bool> {
    let (a, b) = read_comparison_operands(token, input)?;
    Ok(a.0 == b.0)
}

fn if_cat<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<bool> {
    let (a, b) = read_comparison_operands(token, input)?;
    Ok(a.1 == b.1)
}

// No category code is 16, so this is the category code of tokens that have none.
const NO_CAT_CODE: u8 = 16;

// Reads two expanded tokens and returns their character and category code.
fn read_comparison_operands<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<((Option<char>, u8), (Option<char>, u8))> {
    let mut operands = [(None, NO_CAT_CODE); 2];
    for operand in &mut operands {
        let t = match input.next()? {
            None => return Err(end_of_input_during_comparison(token, input).into()),
            Some(t) => t,
        };
        *operand = match t.value() {
            Value::CommandRef(command_ref) => match input.vm().groups.command(&command_ref) {
                Some(command::Command::CharacterTokenAlias(value)) => char_and_cat_code(*value),
                // An expandable active character seen here was not expanded, as after \noexpand.
                Some(command::Command::Expansion(..) | command::Command::Macro(_)) => {
                    match command_ref {
                        CommandRef::ControlSequence(_) => (None, NO_CAT_CODE),
                        CommandRef::ActiveCharacter(c) => (Some(c), CatCode::Active as u8),
                    }
                }
                _ => (None, NO_CAT_CODE),
            },
            value => char_and_cat_code(value),
        };
    }
    Ok((operands[0], operands[1]))
}

fn char_and_cat_code(value: Value) -> (Option<char>, u8) {
    (
        value.char(),
        value.cat_code().map(|c| c as u8).unwrap_or(NO_CAT_CODE),
    )
}

fn end_of_input_during_comparison<S>(
    token: token::Token,
    input: &vm::ExpansionInput<S>,
) -> EndOfInputDuringComparison
where
    S: TexlangState,
{
    EndOfInputDuringComparison {
        conditional: token.value().to_string(input.vm().cs_name_interner()),
    }
}

fn if_x<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<bool> {
    let a = next_unexpanded_operand(token, input)?;
    let b = next_unexpanded_operand(token, input)?;
    let groups = &input.vm().groups;
    Ok(match (a, b) {
        (Value::CommandRef(a), Value::CommandRef(b)) => {
            command::equal(groups.command(&a), groups.command(&b))
        }
        (Value::CommandRef(command_ref), value) | (value, Value::CommandRef(command_ref)) => {
            match groups.command(&command_ref) {
                Some(command::Command::CharacterTokenAlias(alias)) => *alias == value,
                _ => false,
            }
        }
        (a, b) => a == b,
    })
}

fn next_unexpanded_operand<S: TexlangState>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<Value> {
    match input.unexpanded().next()? {
        None => Err(end_of_input_during_comparison(token, input).into()),
        Some(t) => Ok(t.value()),
    }
}

fn if_num<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<bool> {
    let a = i32::parse(input)?;
    let relation = parse_relation(token, input)?;
    let b = i32::parse(input)?;
    Ok(a.cmp(&b) == relation)
}

fn if_dim<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<bool> {
    let a = Scaled::parse(input)?;
    let relation = parse_relation(token, input)?;
    let b = Scaled::parse(input)?;
    Ok(a.cmp(&b) == relation)
}

fn parse_relation<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<Ordering> {
    parse::Spaces::parse(input)?;
    let got = input.next()?;
    match got.map(|t| t.value()) {
        Some(Value::Other('<')) => Ok(Ordering::Less),
        Some(Value::Other('=')) => Ok(Ordering::Equal),
        Some(Value::Other('>')) => Ok(Ordering::Greater),
        _ => Err(IllegalRelationalOperator {
            conditional: token.value().to_string(input.vm().cs_name_interner()),
            got,
        }
        .into()),
    }
}

fn if_odd<S: HasComponent<Component>>(
    _: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<bool> {
    let n = i32::parse(input)?;
    Ok(n % 2 != 0)
}

fn if_void<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(box_orientation(input)?.is_none())
}

fn if_h_box<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(box_orientation(input)? == Some(Orientation::Horizontal))
}

fn if_v_box<S: TexlangState>(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
    Ok(box_orientation(input)? == Some(Orientation::Vertical))
}

// Reads a box register number and returns the orientation of the box, or None if it is void.
fn box_orientation<S: TexlangState>(
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<Option<Orientation>> {
    let Uint(n) = Uint::<32768>::parse(input)?;
    Ok(input
        .vm()
        .groups
        .box_register(n)
        .map(|tex_box| tex_box.orientation))
}

/// Error returned when the input ends while `\if`, `\ifcat` or `\ifx` reads its operands.
#[derive(Debug)]
pub struct EndOfInputDuringComparison {
    pub conditional: String,
}

impl error::TexError for EndOfInputDuringComparison {
    fn kind(&self) -> error::Kind {
        error::Kind::EndOfInput
    }

    fn title(&self) -> String {
        format!(
            "unexpected end of input while reading the tokens to compare in {}",
            self.conditional
        )
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![format!("{} compares the two tokens that follow it", self.conditional).into()]
    }
}

/// Error returned when `\ifnum` or `\ifdim` is not followed by `<`, `=` or `>`.
#[derive(Debug)]
pub struct IllegalRelationalOperator {
    pub conditional: String,
    /// The token found instead of the relation, or [None] if the input ended.
    pub got: Option<token::Token>,
}

impl error::TexError for IllegalRelationalOperator {
    fn kind(&self) -> error::Kind {
        match self.got {
            None => error::Kind::EndOfInput,
            Some(token) => error::Kind::Token(token),
        }
    }

    fn title(&self) -> String {
        format!("missing relation for {}", self.conditional)
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![format!(
            "a relation is a token with category code {} and one of the following values: <, =, >",
            CatCode::Other
        )
        .into()]
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StrayReason {
    /// No conditional is open. The string is the delimiter's name.
    NoOpenConditional(&'static str),
    /// The innermost conditional is still reading its operands.
    WhileEvaluating(&'static str, token::Token),
    /// The innermost conditional is already in its `\else` branch.
    InFalseBranch(&'static str, token::Token),
    /// An `\or` appeared in a conditional that is not `\ifcase`.
    OrOutsideCase,
}

/// Error returned when `\else`, `\or` or `\fi` does not match an open conditional.
#[derive(Debug)]
pub struct StrayBranchDelimiter {
    pub token: token::Token,
    pub reason: StrayReason,
}

impl error::TexError for StrayBranchDelimiter {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        match self.reason {
            StrayReason::NoOpenConditional(name) => {
                format!("extra {name}: there is no open conditional")
            }
            StrayReason::WhileEvaluating(name, _) => {
                format!("extra {name}: the conditional has not been evaluated yet")
            }
            StrayReason::InFalseBranch(name, _) => {
                format!("extra {name}: the conditional is already in its else branch")
            }
            StrayReason::OrOutsideCase => r"extra \or: the conditional is not a \ifcase".into(),
        }
    }

    fn notes(&self) -> Vec<error::Note> {
        match self.reason {
            StrayReason::WhileEvaluating(_, conditional) => vec![error::Note::SourceCodeTrace(
                "the conditional is reading its operands here:".into(),
                conditional,
            )],
            StrayReason::InFalseBranch(_, conditional) => vec![error::Note::SourceCodeTrace(
                "the conditional was opened here:".into(),
                conditional,
            )],
            StrayReason::NoOpenConditional(_) | StrayReason::OrOutsideCase => vec![],
        }
    }
}

/// Error returned when the input ends while skipping a branch.
#[derive(Debug)]
pub struct UnterminatedConditional {
    /// The token after which skipping began.
    pub token: token::Token,
    /// Line that token is on.
    pub line: usize,
}

impl error::TexError for UnterminatedConditional {
    fn kind(&self) -> error::Kind {
        error::Kind::EndOfInput
    }

    fn title(&self) -> String {
        format!(
            r"input ended while skipping a conditional branch; the skip began on line {}",
            self.line
        )
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![
            error::Note::SourceCodeTrace("skipping began here:".into(), self.token),
            r"every conditional must be closed by a matching \fi".into(),
        ]
    }
}

/// Error returned when the conditional stack is not in the state a primitive requires.
///
/// This happens when the conditional being evaluated is closed while its operands are read.
#[derive(Debug)]
pub struct ImpossibleState {
    pub token: token::Token,
}

impl error::TexError for ImpossibleState {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "the conditional was closed before it finished evaluating".into()
    }
}

/// Error returned when conditionals and groups are interleaved.
///
/// This is raised for a delimiter in a different group than its conditional,
///     like `\iftrue{\fi}`,
///     and for the end of a group while a conditional opened inside it is still open,
///     like `{\iftrue}\fi`.
#[derive(Debug)]
pub struct ConditionalGroupMismatch {
    pub token: token::Token,
    /// The token that opened the conditional.
    pub conditional: token::Token,
    pub opened_at_level: usize,
    pub current_level: usize,
}

impl error::TexError for ConditionalGroupMismatch {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        if self.token == self.conditional {
            format!(
                "a group ended while a conditional opened inside it (at group level {}) was still open",
                self.opened_at_level
            )
        } else {
            format!(
                "this delimiter is at group level {} but its conditional was opened at group level {}",
                self.current_level, self.opened_at_level
            )
        }
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![
            error::Note::SourceCodeTrace("the conditional was opened here:".into(), self.conditional),
            "each conditional must begin and end inside the same group".into(),
        ]
    }
}
