// Space2Super Role Table
// Dense code -> role lookup built once from resolver symbol data

use std::fmt;

use crate::config::ConfigError;
use crate::key::{key_from_name, key_name, KEY_CNT};
use crate::Key;

/// Symbols treated as Companion keys unless configured otherwise
pub const DEFAULT_COMPANIONS: &[&str] = &["LEFT_META", "RIGHT_META"];

/// Symbols treated as generic modifiers unless configured otherwise.
///
/// Latching and locking keys (CAPSLOCK, NUMLOCK) are deliberately absent:
/// they never form part of a chord.
pub const DEFAULT_MODIFIERS: &[&str] = &[
    "LEFT_SHIFT",
    "RIGHT_SHIFT",
    "LEFT_CTRL",
    "RIGHT_CTRL",
    "LEFT_ALT",
    "RIGHT_ALT",
];

/// Semantic role of a key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum KeyRole {
    /// The key being disambiguated
    Target,
    /// A key whose chord with a held Target emits immediately
    Companion,
    /// A modifier whose concurrent hold suppresses the tap
    Modifier,
    /// Anything else
    Other,
}

/// Maps raw codes to the host's symbolic names and back.
pub trait RoleResolver {
    /// Unmodified symbol for a code
    fn symbol(&self, code: u16) -> Option<&str>;

    /// Code producing a symbol
    fn code(&self, symbol: &str) -> Option<u16>;
}

/// Built-in resolver over Linux input-event-codes names
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyNames;

impl RoleResolver for KeyNames {
    fn symbol(&self, code: u16) -> Option<&str> {
        key_name(code)
    }

    fn code(&self, symbol: &str) -> Option<u16> {
        key_from_name(symbol).map(Key::code)
    }
}

/// Default Companion predicate: Super/Meta keys
pub fn is_super_symbol(symbol: &str) -> bool {
    DEFAULT_COMPANIONS.contains(&symbol)
}

/// Default Modifier predicate: Shift, Control and Alt keys
pub fn is_modifier_symbol(symbol: &str) -> bool {
    DEFAULT_MODIFIERS.contains(&symbol)
}

/// Immutable lookup from key code to role.
///
/// Pointer buttons always classify as `Other` here; the engine sees them as
/// a separate event class.
#[derive(Clone)]
pub struct RoleTable {
    roles: Box<[KeyRole]>,
    target: Key,
}

impl RoleTable {
    /// Build the table, resolving the target key by symbol.
    pub fn build<R, C, M>(
        resolver: &R,
        target_symbol: &str,
        is_companion: C,
        is_modifier: M,
    ) -> Result<Self, ConfigError>
    where
        R: RoleResolver + ?Sized,
        C: Fn(&str) -> bool,
        M: Fn(&str) -> bool,
    {
        let code = resolver
            .code(target_symbol)
            .ok_or_else(|| ConfigError::UnknownTargetKey(target_symbol.to_string()))?;
        Self::with_target_code(resolver, Key::from(code), is_companion, is_modifier)
    }

    /// Build the table around an already-resolved target code.
    pub fn with_target_code<R, C, M>(
        resolver: &R,
        target: Key,
        is_companion: C,
        is_modifier: M,
    ) -> Result<Self, ConfigError>
    where
        R: RoleResolver + ?Sized,
        C: Fn(&str) -> bool,
        M: Fn(&str) -> bool,
    {
        if target.code() as usize >= KEY_CNT || target.is_pointer_button() {
            return Err(ConfigError::UnknownTargetKey(target.code().to_string()));
        }

        let mut roles = vec![KeyRole::Other; KEY_CNT].into_boxed_slice();
        for (code, role) in roles.iter_mut().enumerate() {
            let key = Key::from(code as u16);
            if key == target {
                *role = KeyRole::Target;
                continue;
            }
            if key.is_pointer_button() {
                continue;
            }
            let Some(symbol) = resolver.symbol(key.code()) else {
                continue;
            };
            if is_companion(symbol) {
                *role = KeyRole::Companion;
            } else if is_modifier(symbol) {
                *role = KeyRole::Modifier;
            }
        }

        let table = Self { roles, target };
        log::debug!("Role table built: {}", table);
        Ok(table)
    }

    /// Role of a raw code; out-of-range codes are `Other`
    #[inline]
    pub fn classify(&self, code: u16) -> KeyRole {
        self.roles
            .get(code as usize)
            .copied()
            .unwrap_or(KeyRole::Other)
    }

    /// The single Target key
    pub fn target(&self) -> Key {
        self.target
    }

    /// All codes holding a role, ascending
    pub fn keys_with_role(&self, role: KeyRole) -> Vec<Key> {
        self.roles
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == role)
            .map(|(code, _)| Key::from(code as u16))
            .collect()
    }

    pub fn companions(&self) -> Vec<Key> {
        self.keys_with_role(KeyRole::Companion)
    }

    pub fn modifiers(&self) -> Vec<Key> {
        self.keys_with_role(KeyRole::Modifier)
    }
}

fn write_keys(f: &mut fmt::Formatter<'_>, keys: &[Key]) -> fmt::Result {
    write!(f, "[")?;
    let mut separator = "";
    for key in keys {
        write!(f, "{}{}", separator, key)?;
        separator = " ";
    }
    write!(f, "]")
}

impl fmt::Display for RoleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target={} companions=", self.target)?;
        write_keys(f, &self.companions())?;
        write!(f, " modifiers=")?;
        write_keys(f, &self.modifiers())
    }
}

impl fmt::Debug for RoleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleTable({})", self)
    }
}
