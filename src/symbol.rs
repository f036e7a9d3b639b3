//! Interned action and property names.
//!
//! Property dispatch inside every element's `set()` runs on each delivered
//! action, so the well-known names are interned into a fixed table once and
//! compared as small integers instead of strings. `find()` resolves a
//! lowercase name to its [`Symbol`]; the same name always yields the same
//! symbol for the lifetime of the process.
//!
//! Names not in this table (element-specific properties like `readtime`)
//! are matched by plain string comparison in the element that owns them.

/// An interned name handle.
///
/// Two symbols compare equal iff they were resolved from the same name.
/// Cheap to copy and compare; stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u16);

impl Symbol {
    /// The interned name this symbol stands for.
    pub fn name(self) -> &'static str {
        NAMES[self.0 as usize]
    }
}

/// All well-known action/property names. Must stay lowercase and sorted;
/// `find()` binary-searches it and the `Symbol` constants below index it.
static NAMES: &[&str] = &[
    "address",
    "border",
    "clear",
    "description",
    "down",
    "height",
    "invert",
    "label",
    "loglevel",
    "max",
    "min",
    "mode",
    "next",
    "onhigh",
    "onlow",
    "onreference",
    "onvalue",
    "pin",
    "prev",
    "redraw",
    "reference",
    "start",
    "startup",
    "step",
    "stop",
    "text",
    "title",
    "toggle",
    "type",
    "up",
    "usestate",
    "value",
    "width",
    "x",
    "y",
];

pub const ADDRESS: Symbol = Symbol(0);
pub const BORDER: Symbol = Symbol(1);
pub const CLEAR: Symbol = Symbol(2);
pub const DESCRIPTION: Symbol = Symbol(3);
pub const DOWN: Symbol = Symbol(4);
pub const HEIGHT: Symbol = Symbol(5);
pub const INVERT: Symbol = Symbol(6);
pub const LABEL: Symbol = Symbol(7);
pub const LOGLEVEL: Symbol = Symbol(8);
pub const MAX: Symbol = Symbol(9);
pub const MIN: Symbol = Symbol(10);
pub const MODE: Symbol = Symbol(11);
pub const NEXT: Symbol = Symbol(12);
pub const ON_HIGH: Symbol = Symbol(13);
pub const ON_LOW: Symbol = Symbol(14);
pub const ON_REFERENCE: Symbol = Symbol(15);
pub const ON_VALUE: Symbol = Symbol(16);
pub const PIN: Symbol = Symbol(17);
pub const PREV: Symbol = Symbol(18);
pub const REDRAW: Symbol = Symbol(19);
pub const REFERENCE: Symbol = Symbol(20);
pub const START: Symbol = Symbol(21);
pub const STARTUP: Symbol = Symbol(22);
pub const STEP: Symbol = Symbol(23);
pub const STOP: Symbol = Symbol(24);
pub const TEXT: Symbol = Symbol(25);
pub const TITLE: Symbol = Symbol(26);
pub const TOGGLE: Symbol = Symbol(27);
pub const TYPE: Symbol = Symbol(28);
pub const UP: Symbol = Symbol(29);
pub const USE_STATE: Symbol = Symbol(30);
pub const VALUE: Symbol = Symbol(31);
pub const WIDTH: Symbol = Symbol(32);
pub const X: Symbol = Symbol(33);
pub const Y: Symbol = Symbol(34);

/// Look up a lowercase name in the interned table.
///
/// Case-sensitive: callers lowercase names at the board boundary before
/// dispatch. Returns `None` for names outside the table.
///
/// # Example
///
/// ```
/// use tickboard::symbol;
///
/// assert_eq!(symbol::find("value"), Some(symbol::VALUE));
/// assert_eq!(symbol::find("doesnotexist"), None);
/// ```
pub fn find(name: &str) -> Option<Symbol> {
    NAMES
        .binary_search(&name)
        .ok()
        .map(|i| Symbol(i as u16))
}
