//! The group chain: TeX's dynamically scoped storage.
//!
//! Almost every piece of TeX state is scoped to the current group.
//! After `{\count1=5}` the register is back to whatever it was before the brace;
//!     after `{\global\count1=5}` it is 5 everywhere.
//! The [GroupChain] implements this for every kind of binding:
//!     registers, the six character code tables, command definitions,
//!     file handles, the current namespace and so on.
//! Each kind of binding is a _category_ and categories are scoped independently.
//!
//! The chain is a stack of [Group]s.
//! The group at the bottom is the root group, it is created with the chain and cannot be ended.
//! Reading a binding searches the groups from the newest to the root.
//! If no group binds the key, the category's default is returned.
//! As a result reading never fails.
//!
//! Writing a binding either touches the current group only (a local assignment),
//!     or the current group and every group below it (a global assignment).
//! A local binding disappears when its group ends, because the group itself is discarded.
//! A global binding survives because every enclosing group holds the same value.
//!
//! Groups create their binding maps lazily, per category, on the first write.
//! A group that only changes a few category codes therefore allocates one small map.
//!
//! ## Code lookup and namespaces
//!
//! Command definitions are keyed by the current [Namespace] and the command reference.
//! When a lookup misses in a namespace other than the root namespace `tex`,
//!     the chain retries in the root namespace.
//! Primitives are defined in the root namespace and so they are visible everywhere.
//! This resolution can be switched off with [GroupChain::set_namespace_resolution].

mod defaults;
mod files;

use crate::command::Command;
use crate::prelude as txl;
use crate::token::{CommandRef, Token};
use crate::types::*;
use crate::vm;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::num;
use std::rc::Rc;
use texcraft_stdext::collections::interner;

pub use files::{InputFile, OutputFile};

/// Name of the root namespace.
pub const ROOT_NAMESPACE: &str = "tex";

/// The construct that opened a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    /// The root group, which exists for the whole run.
    Bottom,
    /// Opened by a begin group character like `{`.
    Simple,
    /// Opened by `\begingroup`.
    SemiSimple,
    HBox,
    VBox,
    Math,
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroupType::Bottom => "bottom level",
            GroupType::Simple => "simple group",
            GroupType::SemiSimple => "semi simple group",
            GroupType::HBox => "hbox group",
            GroupType::VBox => "vbox group",
            GroupType::Math => "math shift group",
        };
        write!(f, "{name}")
    }
}

/// Key of a register-like binding.
///
/// Numbered registers are the ones accessed like `\count 5`.
/// Named registers are parameters like `\tracingifs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKey {
    Numbered(usize),
    Named(&'static str),
}

/// An interned namespace name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace(num::NonZeroU32);

impl Namespace {
    /// The root namespace, [ROOT_NAMESPACE].
    pub const ROOT: Namespace = Namespace(num::NonZeroU32::MIN);
}

impl interner::Key for Namespace {
    fn try_from_usize(index: usize) -> Option<Self> {
        <num::NonZeroU32 as interner::Key>::try_from_usize(index).map(Namespace)
    }

    fn into_usize(self) -> usize {
        <num::NonZeroU32 as interner::Key>::into_usize(self.0)
    }
}

/// Typesetting parameters that travel together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypesettingContext {
    pub font: Font,
    pub language: i32,
}

/// A callback that runs after a group ends.
///
/// The callback runs in the enclosing group, so any bindings it reads are the restored ones.
pub type AfterGroupCallback<S> = Box<dyn FnOnce(&mut vm::ExecutionInput<S>) -> txl::Result<()>>;

type Map<K, V> = Option<Box<HashMap<K, V>>>;

struct Bindings<S> {
    ints: Map<RegisterKey, i32>,
    dimens: Map<RegisterKey, Scaled>,
    glues: Map<RegisterKey, Glue>,
    mu_glues: Map<RegisterKey, Glue>,
    token_lists: Map<RegisterKey, Rc<Vec<Token>>>,
    boxes: Map<usize, Option<Rc<TexBox>>>,
    fonts: Map<RegisterKey, Font>,
    cat_codes: Map<char, CatCode>,
    math_codes: Map<char, MathCode>,
    del_codes: Map<char, Option<DelCode>>,
    sf_codes: Map<char, u16>,
    lc_codes: Map<char, Option<char>>,
    uc_codes: Map<char, Option<char>>,
    // A value of None is an explicit undefinition; it stops the search.
    commands: Map<(Namespace, CommandRef), Option<Command<S>>>,
    flags: Map<RegisterKey, bool>,
    input_files: Map<usize, Option<Rc<RefCell<InputFile>>>>,
    output_files: Map<usize, Option<Rc<OutputFile>>>,
    namespace: Option<Namespace>,
    typesetting_context: Option<TypesettingContext>,
    extensions: Map<TypeId, Rc<dyn Any>>,
}

impl<S> Default for Bindings<S> {
    fn default() -> Self {
        Bindings {
            ints: None,
            dimens: None,
            glues: None,
            mu_glues: None,
            token_lists: None,
            boxes: None,
            fonts: None,
            cat_codes: None,
            math_codes: None,
            del_codes: None,
            sf_codes: None,
            lc_codes: None,
            uc_codes: None,
            commands: None,
            flags: None,
            input_files: None,
            output_files: None,
            namespace: None,
            typesetting_context: None,
            extensions: None,
        }
    }
}

/// One scope frame in the [GroupChain].
pub struct Group<S> {
    group_type: GroupType,
    locator: Option<Token>,
    after_group_tokens: Vec<Token>,
    after_group_callbacks: Vec<AfterGroupCallback<S>>,
    bindings: Bindings<S>,
}

impl<S> Group<S> {
    fn new(group_type: GroupType, locator: Option<Token>) -> Group<S> {
        Group {
            group_type,
            locator,
            after_group_tokens: vec![],
            after_group_callbacks: vec![],
            bindings: Default::default(),
        }
    }
}

/// What is left of a group after it ends.
pub struct EndedGroup<S> {
    pub group_type: GroupType,
    pub locator: Option<Token>,
    /// Tokens registered with `\aftergroup`, in registration order.
    pub after_group_tokens: Vec<Token>,
    /// Callbacks in registration order.
    pub after_group_callbacks: Vec<AfterGroupCallback<S>>,
}

// Defaults that are expensive enough to cache.
// The memo is only consulted after every group misses, so it never shadows a binding.
#[derive(Default)]
struct Memo {
    math_codes: HashMap<char, MathCode>,
    lc_codes: HashMap<char, Option<char>>,
    uc_codes: HashMap<char, Option<char>>,
}

/// The stack of groups.
///
/// See the module documentation.
pub struct GroupChain<S> {
    // Index 0 is the root. The parent of group i is group i-1.
    groups: Vec<Group<S>>,
    memo: RefCell<Memo>,
    namespaces: interner::Interner<Namespace>,
    resolve_namespaces: bool,
}

impl<S> Default for GroupChain<S> {
    fn default() -> Self {
        GroupChain::new(std::iter::empty())
    }
}

macro_rules! category {
    (
        $( #[$read_meta: meta] )*
        $field: ident, $read: ident, $write: ident, $key: ty, $value: ty, $default: expr
    ) => {
        $( #[$read_meta] )*
        pub fn $read(&self, key: $key) -> $value {
            match self.find(|bindings| bindings.$field.as_deref(), &key) {
                Some(value) => value.clone(),
                None => $default(key),
            }
        }

        pub fn $write(&mut self, key: $key, value: $value, global: bool) {
            for group in self.writable_groups(global) {
                group
                    .bindings
                    .$field
                    .get_or_insert_with(Default::default)
                    .insert(key, value.clone());
            }
        }
    };
}

macro_rules! memoized_category {
    (
        $( #[$read_meta: meta] )*
        $field: ident, $read: ident, $write: ident, $value: ty, $default: path
    ) => {
        $( #[$read_meta] )*
        pub fn $read(&self, c: char) -> $value {
            if let Some(value) = self.find(|bindings| bindings.$field.as_deref(), &c) {
                return *value;
            }
            let mut memo = self.memo.borrow_mut();
            let value = *memo.$field.entry(c).or_insert_with(|| $default(c));
            value
        }

        pub fn $write(&mut self, c: char, value: $value, global: bool) {
            for group in self.writable_groups(global) {
                group
                    .bindings
                    .$field
                    .get_or_insert_with(Default::default)
                    .insert(c, value);
            }
        }
    };
}

impl<S> GroupChain<S> {
    /// Create a new chain containing only the root group.
    ///
    /// The provided commands are defined in the root group and the root namespace.
    pub fn new<I: IntoIterator<Item = (CommandRef, Command<S>)>>(built_ins: I) -> GroupChain<S> {
        let mut namespaces: interner::Interner<Namespace> = Default::default();
        let root = namespaces.get_or_intern(ROOT_NAMESPACE);
        debug_assert_eq!(root, Namespace::ROOT);
        let mut root_group = Group::new(GroupType::Bottom, None);
        let commands: HashMap<(Namespace, CommandRef), Option<Command<S>>> = built_ins
            .into_iter()
            .map(|(command_ref, command)| ((Namespace::ROOT, command_ref), Some(command)))
            .collect();
        root_group.bindings.commands = Some(Box::new(commands));
        GroupChain {
            groups: vec![root_group],
            memo: Default::default(),
            namespaces,
            resolve_namespaces: true,
        }
    }

    /// Binds the plain TeX special characters, like `{` and `#`, in the root group.
    pub fn install_plain_tex_cat_codes(&mut self) {
        for (c, cat_code) in CatCode::PLAIN_TEX_SPECIALS {
            self.set_cat_code(c, cat_code, true);
        }
    }

    fn find<'a, K: Eq + Hash + 'a, V: 'a>(
        &'a self,
        map: impl Fn(&'a Bindings<S>) -> Option<&'a HashMap<K, V>>,
        key: &K,
    ) -> Option<&'a V> {
        self.groups
            .iter()
            .rev()
            .find_map(|group| map(&group.bindings)?.get(key))
    }

    fn writable_groups(&mut self, global: bool) -> impl Iterator<Item = &mut Group<S>> {
        let n = if global { self.groups.len() } else { 1 };
        self.groups.iter_mut().rev().take(n)
    }

    fn current(&self) -> &Group<S> {
        // The root group is never removed.
        &self.groups[self.groups.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Group<S> {
        let i = self.groups.len() - 1;
        &mut self.groups[i]
    }

    /// Opens a new group.
    pub fn begin_group(&mut self, group_type: GroupType, locator: Option<Token>) {
        self.groups.push(Group::new(group_type, locator));
        log::trace!("began {group_type} at level {}", self.level());
    }

    /// Ends the current group, discarding its bindings.
    ///
    /// Returns [None] if the current group is the root group, which cannot be ended.
    pub fn end_group(&mut self) -> Option<EndedGroup<S>> {
        if self.groups.len() <= 1 {
            return None;
        }
        let level = self.level();
        let group = self.groups.pop()?;
        log::trace!("ended {} at level {level}", group.group_type);
        Some(EndedGroup {
            group_type: group.group_type,
            locator: group.locator,
            after_group_tokens: group.after_group_tokens,
            after_group_callbacks: group.after_group_callbacks,
        })
    }

    /// Number of groups above the root group.
    pub fn level(&self) -> usize {
        self.groups.len() - 1
    }

    pub fn group_type(&self) -> GroupType {
        self.current().group_type
    }

    pub fn set_group_type(&mut self, group_type: GroupType) {
        self.current_mut().group_type = group_type;
    }

    /// The token that opened the current group, if known.
    pub fn locator(&self) -> Option<Token> {
        self.current().locator
    }

    pub fn set_locator(&mut self, token: Token) {
        self.current_mut().locator = Some(token);
    }

    /// Registers a token to be inserted into the input after the current group ends.
    ///
    /// In the root group the token is discarded, as the root group never ends.
    pub fn after_group_token(&mut self, token: Token) {
        if self.level() == 0 {
            return;
        }
        self.current_mut().after_group_tokens.push(token);
    }

    /// Registers a callback to run after the current group ends.
    pub fn after_group_callback(&mut self, callback: AfterGroupCallback<S>) {
        self.current_mut().after_group_callbacks.push(callback);
    }

    /// Removes the callbacks registered in the current group.
    ///
    /// Each callback is handed out exactly once.
    pub fn take_after_group_callbacks(&mut self) -> Vec<AfterGroupCallback<S>> {
        std::mem::take(&mut self.current_mut().after_group_callbacks)
    }

    category!(
        /// Value of an integer register or parameter. Defaults to 0.
        ints, int, set_int, RegisterKey, i32, |_| 0
    );
    category!(
        /// Value of a dimension register or parameter. Defaults to 0pt.
        dimens, dimen, set_dimen, RegisterKey, Scaled, |_| Scaled::ZERO
    );
    category!(
        glues, glue, set_glue, RegisterKey, Glue, |_| Glue::default()
    );
    category!(
        mu_glues, mu_glue, set_mu_glue, RegisterKey, Glue, |_| Glue::default()
    );
    category!(
        token_lists, token_list, set_token_list, RegisterKey, Rc<Vec<Token>>, |_| Default::default()
    );
    category!(
        /// Contents of a box register. Defaults to void ([None]).
        boxes, box_register, set_box_register, usize, Option<Rc<TexBox>>, |_| None
    );
    category!(
        fonts, font, set_font, RegisterKey, Font, |_| Font::NULL_FONT
    );
    category!(
        cat_codes, cat_code, set_cat_code, char, CatCode, defaults::cat_code
    );
    category!(
        /// Delimiter code of a character, or [None] if the character is not a delimiter.
        del_codes, del_code, set_del_code, char, Option<DelCode>, defaults::del_code
    );
    category!(
        sf_codes, sf_code, set_sf_code, char, u16, defaults::sf_code
    );
    category!(
        flags, flag, set_flag, RegisterKey, bool, |_| false
    );
    category!(
        /// The file open for reading at a stream number, if any.
        input_files, input_file, set_input_file, usize, Option<Rc<RefCell<InputFile>>>, |_| None
    );
    category!(
        output_files, output_file, set_output_file, usize, Option<Rc<OutputFile>>, |_| None
    );

    memoized_category!(
        math_codes, math_code, set_math_code, MathCode, defaults::math_code
    );
    memoized_category!(
        /// Lower case form of a character, or [None] if it has none.
        lc_codes, lc_code, set_lc_code, Option<char>, defaults::lc_code
    );
    memoized_category!(
        /// Upper case form of a character, or [None] if it has none.
        uc_codes, uc_code, set_uc_code, Option<char>, defaults::uc_code
    );

    /// The current namespace.
    pub fn namespace(&self) -> Namespace {
        self.groups
            .iter()
            .rev()
            .find_map(|group| group.bindings.namespace)
            .unwrap_or(Namespace::ROOT)
    }

    /// Sets the current namespace, interning the name if needed.
    pub fn set_namespace(&mut self, name: &str, global: bool) -> Namespace {
        let namespace = self.namespaces.get_or_intern(name);
        for group in self.writable_groups(global) {
            group.bindings.namespace = Some(namespace);
        }
        namespace
    }

    pub fn namespace_name(&self, namespace: Namespace) -> &str {
        self.namespaces.resolve(namespace).unwrap_or(ROOT_NAMESPACE)
    }

    /// Enables or disables the fallback to the root namespace in command lookup.
    pub fn set_namespace_resolution(&mut self, enabled: bool) {
        self.resolve_namespaces = enabled;
    }

    pub fn typesetting_context(&self) -> TypesettingContext {
        self.groups
            .iter()
            .rev()
            .find_map(|group| group.bindings.typesetting_context)
            .unwrap_or_default()
    }

    pub fn set_typesetting_context(&mut self, context: TypesettingContext, global: bool) {
        for group in self.writable_groups(global) {
            group.bindings.typesetting_context = Some(context);
        }
    }

    /// Returns the value of type `T` in the extension slot, if there is one.
    pub fn extension<T: Any>(&self) -> Option<Rc<T>> {
        let value = self.find(|bindings| bindings.extensions.as_deref(), &TypeId::of::<T>())?;
        value.clone().downcast::<T>().ok()
    }

    pub fn set_extension<T: Any>(&mut self, value: T, global: bool) {
        let value: Rc<dyn Any> = Rc::new(value);
        for group in self.writable_groups(global) {
            group
                .bindings
                .extensions
                .get_or_insert_with(Default::default)
                .insert(TypeId::of::<T>(), value.clone());
        }
    }

    /// Returns the command a command reference points to, or [None] if it is undefined.
    pub fn command(&self, command_ref: &CommandRef) -> Option<&Command<S>> {
        let namespace = self.namespace();
        if let Some(binding) = self.find_command(namespace, command_ref) {
            return binding.as_ref();
        }
        if self.resolve_namespaces && namespace != Namespace::ROOT {
            return self.find_command(Namespace::ROOT, command_ref)?.as_ref();
        }
        None
    }

    fn find_command(
        &self,
        namespace: Namespace,
        command_ref: &CommandRef,
    ) -> Option<&Option<Command<S>>> {
        self.find(
            |bindings| bindings.commands.as_deref(),
            &(namespace, *command_ref),
        )
    }

    /// Binds a command reference in the current namespace.
    ///
    /// Binding [None] makes the command undefined.
    pub fn set_command(
        &mut self,
        command_ref: CommandRef,
        command: Option<Command<S>>,
        global: bool,
    ) {
        let key = (self.namespace(), command_ref);
        for group in self.writable_groups(global) {
            group
                .bindings
                .commands
                .get_or_insert_with(Default::default)
                .insert(key, command.clone());
        }
    }

    /// Returns every currently defined command reference.
    ///
    /// This function is slow and is intended for error paths, like spell checking.
    pub fn command_refs_slow(&self) -> Vec<CommandRef> {
        let mut seen: HashSet<CommandRef> = Default::default();
        for group in &self.groups {
            if let Some(commands) = &group.bindings.commands {
                seen.extend(commands.keys().map(|(_, command_ref)| *command_ref));
            }
        }
        seen.into_iter()
            .filter(|command_ref| self.command(command_ref).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::trace;

    type Chain = GroupChain<()>;

    const KEY: RegisterKey = RegisterKey::Numbered(3);

    #[test]
    fn level_arithmetic() {
        let mut chain = Chain::default();
        assert_eq!(chain.level(), 0);
        for k in 1..=5 {
            chain.begin_group(GroupType::Simple, None);
            assert_eq!(chain.level(), k);
        }
        for k in (0..5).rev() {
            assert!(chain.end_group().is_some());
            assert_eq!(chain.level(), k);
        }
    }

    #[test]
    fn root_group_cannot_end() {
        let mut chain = Chain::default();
        assert!(chain.end_group().is_none());
        assert_eq!(chain.level(), 0);
        assert_eq!(chain.group_type(), GroupType::Bottom);
    }

    #[test]
    fn local_write_is_undone_by_group_end() {
        let mut chain = Chain::default();
        chain.set_int(KEY, 4, false);
        chain.begin_group(GroupType::Simple, None);
        chain.set_int(KEY, 5, false);
        assert_eq!(chain.int(KEY), 5);
        chain.end_group();
        assert_eq!(chain.int(KEY), 4);
    }

    #[test]
    fn global_write_survives_group_end() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        chain.begin_group(GroupType::Simple, None);
        chain.set_dimen(KEY, Scaled::ONE, true);
        assert_eq!(chain.dimen(KEY), Scaled::ONE);
        chain.end_group();
        assert_eq!(chain.dimen(KEY), Scaled::ONE);
        chain.end_group();
        assert_eq!(chain.dimen(KEY), Scaled::ONE);
    }

    #[test]
    fn global_write_is_visible_in_parent() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        chain.set_int(KEY, 7, true);
        assert_eq!(chain.groups[0].bindings.ints.as_ref().unwrap().get(&KEY), Some(&7));
    }

    #[test]
    fn local_write_after_global_write() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        chain.set_int(KEY, 7, true);
        chain.begin_group(GroupType::Simple, None);
        chain.set_int(KEY, 8, false);
        chain.end_group();
        assert_eq!(chain.int(KEY), 7);
    }

    #[test]
    fn maps_are_created_lazily() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        chain.set_cat_code('a', CatCode::Other, false);
        let bindings = &chain.current().bindings;
        assert!(bindings.cat_codes.is_some());
        assert!(bindings.ints.is_none());
        assert!(bindings.math_codes.is_none());
    }

    #[test]
    fn default_values() {
        let chain = Chain::default();
        assert_eq!(chain.cat_code('a'), CatCode::Letter);
        assert_eq!(chain.sf_code('a'), 999);
        assert_eq!(chain.sf_code('-'), 1000);
        assert_eq!(chain.int(KEY), 0);
        assert_eq!(chain.glue(KEY), Glue::default());
        assert!(chain.token_list(KEY).is_empty());
        assert_eq!(chain.box_register(3), None);
        assert_eq!(chain.font(KEY), Font::NULL_FONT);
        assert!(!chain.flag(KEY));
        assert!(chain.input_file(0).is_none());
        assert!(chain.output_file(0).is_none());
        assert_eq!(chain.del_code('.'), Some(DelCode::NULL));
        assert_eq!(chain.del_code('a'), None);
        assert_eq!(chain.typesetting_context(), TypesettingContext::default());
    }

    #[test]
    fn memoized_default_never_shadows_binding() {
        let mut chain = Chain::default();
        assert_eq!(chain.lc_code('A'), Some('a'));
        chain.begin_group(GroupType::Simple, None);
        chain.set_lc_code('A', Some('z'), false);
        assert_eq!(chain.lc_code('A'), Some('z'));
        chain.end_group();
        assert_eq!(chain.lc_code('A'), Some('a'));
        chain.set_lc_code('A', None, false);
        assert_eq!(chain.lc_code('A'), None);
    }

    #[test]
    fn memoized_math_code() {
        let mut chain = Chain::default();
        let code = chain.math_code('x');
        assert_eq!(code, MathCode::new(MathClass::Variable, 1, b'x'));
        assert_eq!(chain.memo.borrow().math_codes.get(&'x'), Some(&code));
        chain.set_math_code('x', MathCode(5), false);
        assert_eq!(chain.math_code('x'), MathCode(5));
    }

    #[test]
    fn meta_operations() {
        let mut chain = Chain::default();
        let token = Token::new_begin_group('{', trace::Key::dummy());
        chain.begin_group(GroupType::Simple, Some(token));
        assert_eq!(chain.locator(), Some(token));
        chain.set_group_type(GroupType::HBox);
        assert_eq!(chain.group_type(), GroupType::HBox);
        let other = Token::new_letter('a', trace::Key::dummy());
        chain.set_locator(other);
        assert_eq!(chain.locator(), Some(other));
    }

    #[test]
    fn after_group_tokens_in_order() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        let a = Token::new_letter('a', trace::Key::dummy());
        let b = Token::new_letter('b', trace::Key::dummy());
        chain.after_group_token(a);
        chain.after_group_token(b);
        chain.after_group_callback(Box::new(|_| Ok(())));
        let ended = chain.end_group().unwrap();
        assert_eq!(ended.after_group_tokens, vec![a, b]);
        assert_eq!(ended.after_group_callbacks.len(), 1);
    }

    #[test]
    fn after_group_token_discarded_at_root() {
        let mut chain = Chain::default();
        chain.after_group_token(Token::new_letter('a', trace::Key::dummy()));
        assert!(chain.groups[0].after_group_tokens.is_empty());
        chain.begin_group(GroupType::Simple, None);
        let ended = chain.end_group().unwrap();
        assert!(ended.after_group_tokens.is_empty());
    }

    #[test]
    fn take_after_group_callbacks_once() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        chain.after_group_callback(Box::new(|_| Ok(())));
        assert_eq!(chain.take_after_group_callbacks().len(), 1);
        assert_eq!(chain.take_after_group_callbacks().len(), 0);
    }

    #[test]
    fn namespace_scoping() {
        let mut chain = Chain::default();
        assert_eq!(chain.namespace(), Namespace::ROOT);
        chain.begin_group(GroupType::Simple, None);
        let foo = chain.set_namespace("foo", false);
        assert_eq!(chain.namespace(), foo);
        assert_eq!(chain.namespace_name(foo), "foo");
        chain.end_group();
        assert_eq!(chain.namespace(), Namespace::ROOT);
        chain.begin_group(GroupType::Simple, None);
        chain.set_namespace("foo", true);
        chain.end_group();
        assert_eq!(chain.namespace(), foo);
    }

    fn command_ref(c: char) -> CommandRef {
        CommandRef::ActiveCharacter(c)
    }

    #[test]
    fn command_namespace_fallback() {
        let mut chain: Chain =
            GroupChain::new([(command_ref('a'), Command::CharacterTokenAlias(crate::token::Value::Letter('x')))]);
        chain.set_namespace("foo", false);
        assert!(chain.command(&command_ref('a')).is_some());
        chain.set_namespace_resolution(false);
        assert!(chain.command(&command_ref('a')).is_none());
        chain.set_namespace_resolution(true);
        chain.set_command(command_ref('b'), Some(Command::CharacterTokenAlias(crate::token::Value::Letter('y'))), false);
        assert!(chain.command(&command_ref('b')).is_some());
        chain.set_namespace(ROOT_NAMESPACE, false);
        assert!(chain.command(&command_ref('b')).is_none());
    }

    #[test]
    fn explicit_undefinition_stops_lookup() {
        let mut chain: Chain =
            GroupChain::new([(command_ref('a'), Command::CharacterTokenAlias(crate::token::Value::Letter('x')))]);
        chain.begin_group(GroupType::Simple, None);
        chain.set_command(command_ref('a'), None, false);
        assert!(chain.command(&command_ref('a')).is_none());
        assert!(chain.command_refs_slow().is_empty());
        chain.end_group();
        assert!(chain.command(&command_ref('a')).is_some());
        assert_eq!(chain.command_refs_slow(), vec![command_ref('a')]);
    }

    #[test]
    fn box_registers() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        chain.set_box_register(2, Some(Rc::new(TexBox::new(Orientation::Vertical))), false);
        assert_eq!(
            chain.box_register(2).map(|b| b.orientation),
            Some(Orientation::Vertical)
        );
        chain.end_group();
        assert_eq!(chain.box_register(2), None);
    }

    #[test]
    fn extension_slot() {
        #[derive(Debug, PartialEq)]
        struct Custom(u8);
        let mut chain = Chain::default();
        assert_eq!(chain.extension::<Custom>(), None);
        chain.begin_group(GroupType::Simple, None);
        chain.set_extension(Custom(3), false);
        assert_eq!(chain.extension::<Custom>().as_deref(), Some(&Custom(3)));
        assert_eq!(chain.extension::<u8>(), None);
        chain.end_group();
        assert_eq!(chain.extension::<Custom>(), None);
    }

    #[test]
    fn file_handles() {
        let mut chain = Chain::default();
        let file = Rc::new(RefCell::new(InputFile::new("a.tex".into(), "line")));
        chain.set_input_file(3, Some(file), true);
        assert!(!chain.input_file(3).unwrap().borrow().is_eof());
        chain.set_output_file(1, Some(Rc::new(OutputFile { path: "b.tex".into() })), false);
        assert_eq!(chain.output_file(1).unwrap().path, std::path::PathBuf::from("b.tex"));
    }

    #[test]
    fn typesetting_context_scoping() {
        let mut chain = Chain::default();
        chain.begin_group(GroupType::Simple, None);
        let context = TypesettingContext {
            font: Font(2),
            language: 1,
        };
        chain.set_typesetting_context(context, false);
        assert_eq!(chain.typesetting_context(), context);
        chain.end_group();
        assert_eq!(chain.typesetting_context(), TypesettingContext::default());
    }
}
