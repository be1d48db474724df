//! Locale scoping for numeric parsing and formatting.
//!
//! Numeric field types read the active [`NumericLocale`] from a thread-local
//! stack. [`locale_scope`] pushes a locale and returns a [`LocaleGuard`] that
//! pops back to the immediately prior state when dropped, so nested scopes
//! compose and the prior state is restored on early return, `?` propagation,
//! and unwinding alike. Outside of any scope numbers are handled locale-naively.
//!
//! Separator characters are explicit policy: the built-in table mirrors common
//! platform locale data, and further locales can be registered or loaded from
//! YAML through [`LocaleRegistry`].

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    marker::PhantomData,
    path::Path,
    sync::LazyLock,
};

use anyhow::{Context, Result as AnyResult, ensure};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_GROUP_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericLocale {
    pub name: String,
    pub decimal_point: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thousands_sep: Option<char>,
    #[serde(default = "NumericLocale::default_group_size")]
    pub grouping: usize,
}

impl NumericLocale {
    pub fn new(name: impl Into<String>, decimal_point: char, thousands_sep: Option<char>) -> Self {
        Self {
            name: name.into(),
            decimal_point,
            thousands_sep,
            grouping: DEFAULT_GROUP_SIZE,
        }
    }

    pub const fn default_group_size() -> usize {
        DEFAULT_GROUP_SIZE
    }

    pub fn with_grouping(mut self, grouping: usize) -> Self {
        self.grouping = grouping;
        self
    }
}

/// Normalizes `pt_BR.UTF-8`, `pt-br` and `pt_BR@euro` to the same lookup key.
fn locale_key(name: &str) -> String {
    let base = name
        .trim()
        .split(['.', '@'])
        .next()
        .unwrap_or_default();
    base.replace('-', "_").to_ascii_lowercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocaleFile {
    #[serde(default)]
    locales: Vec<NumericLocale>,
}

#[derive(Debug, Clone, Default)]
pub struct LocaleRegistry {
    locales: BTreeMap<String, NumericLocale>,
}

static BUILTIN_LOCALES: LazyLock<LocaleRegistry> = LazyLock::new(LocaleRegistry::builtin);

impl LocaleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for locale in [
            NumericLocale::new("C", '.', None),
            NumericLocale::new("POSIX", '.', None),
            NumericLocale::new("en_US", '.', Some(',')),
            NumericLocale::new("en_GB", '.', Some(',')),
            NumericLocale::new("pt_BR", ',', Some('.')),
            NumericLocale::new("pt_PT", ',', Some('\u{a0}')),
            NumericLocale::new("de_DE", ',', Some('.')),
            NumericLocale::new("es_ES", ',', Some('.')),
            NumericLocale::new("it_IT", ',', Some('.')),
            NumericLocale::new("nl_NL", ',', Some('.')),
            NumericLocale::new("fr_FR", ',', Some('\u{202f}')),
        ] {
            registry.register(locale);
        }
        registry
    }

    /// Adds or replaces a locale under its normalized name.
    pub fn register(&mut self, locale: NumericLocale) {
        self.locales.insert(locale_key(&locale.name), locale);
    }

    pub fn get(&self, name: &str) -> Result<&NumericLocale> {
        self.locales
            .get(&locale_key(name))
            .ok_or_else(|| Error::UnknownLocale(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.locales.values().map(|locale| locale.name.as_str()).collect()
    }

    pub fn scope(&self, name: &str) -> Result<LocaleGuard> {
        let locale = self.get(name)?.clone();
        Ok(LocaleGuard::enter(locale))
    }

    /// Parses a YAML document of the form `locales: [{name, decimal_point, thousands_sep}]`
    /// and merges it over the built-in table.
    pub fn from_yaml_str(source: &str) -> AnyResult<Self> {
        let file: LocaleFile = serde_yaml::from_str(source).context("Parsing locale YAML")?;
        Self::merged_with_builtin(file)
    }

    pub fn load(path: &Path) -> AnyResult<Self> {
        let file = File::open(path).with_context(|| format!("Opening locale file {path:?}"))?;
        let reader = BufReader::new(file);
        let parsed: LocaleFile = serde_yaml::from_reader(reader).context("Parsing locale YAML")?;
        Self::merged_with_builtin(parsed).with_context(|| format!("Loading locales from {path:?}"))
    }

    fn merged_with_builtin(file: LocaleFile) -> AnyResult<Self> {
        let mut registry = Self::builtin();
        for locale in file.locales {
            ensure!(
                Some(locale.decimal_point) != locale.thousands_sep,
                "Locale '{}' uses '{}' as both decimal point and thousands separator",
                locale.name,
                locale.decimal_point
            );
            ensure!(
                locale.grouping > 0,
                "Locale '{}' must use a positive group size",
                locale.name
            );
            registry.register(locale);
        }
        Ok(registry)
    }
}

thread_local! {
    static LOCALE_STACK: RefCell<Vec<NumericLocale>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a locale active until dropped. Not `Send`: the scope belongs to the
/// thread that opened it. Guards must be dropped in reverse order of
/// creation; dropping an outer guard also ends every scope opened after it.
#[must_use = "the locale is only active while the guard is alive"]
#[derive(Debug)]
pub struct LocaleGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl LocaleGuard {
    pub fn enter(locale: NumericLocale) -> Self {
        debug!("Entering numeric locale '{}'", locale.name);
        let depth = LOCALE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let depth = stack.len();
            stack.push(locale);
            depth
        });
        Self {
            depth,
            _not_send: PhantomData,
        }
    }
}

impl Drop for LocaleGuard {
    fn drop(&mut self) {
        let live = LOCALE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let live = stack.len();
            stack.truncate(self.depth);
            live
        });
        if !std::thread::panicking() {
            debug_assert_eq!(
                live,
                self.depth + 1,
                "locale guard dropped while an inner scope is still open"
            );
        }
    }
}

/// Activates the built-in locale `name` (e.g. `"pt_BR.UTF-8"`) for the
/// lifetime of the returned guard.
pub fn locale_scope(name: &str) -> Result<LocaleGuard> {
    BUILTIN_LOCALES.scope(name)
}

/// Runs `body` with the built-in locale `name` active.
pub fn with_locale<R>(name: &str, body: impl FnOnce() -> R) -> Result<R> {
    let _guard = locale_scope(name)?;
    Ok(body())
}

pub fn should_use_native_locale() -> bool {
    LOCALE_STACK.with(|stack| !stack.borrow().is_empty())
}

pub fn current_locale() -> Option<NumericLocale> {
    with_current_locale(|locale| locale.cloned())
}

pub fn with_current_locale<R>(body: impl FnOnce(Option<&NumericLocale>) -> R) -> R {
    LOCALE_STACK.with(|stack| body(stack.borrow().last()))
}

pub fn builtin_locale(name: &str) -> Result<NumericLocale> {
    BUILTIN_LOCALES.get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_key_strips_encoding_and_modifier() {
        assert_eq!(locale_key("pt_BR.UTF-8"), "pt_br");
        assert_eq!(locale_key("de-DE@euro"), "de_de");
        assert_eq!(locale_key(" C "), "c");
    }

    #[test]
    fn nested_scopes_restore_prior_locale() {
        assert!(!should_use_native_locale());
        let outer = locale_scope("pt_BR.UTF-8").unwrap();
        {
            let _inner = locale_scope("en_US").unwrap();
            assert_eq!(current_locale().unwrap().name, "en_US");
        }
        assert_eq!(current_locale().unwrap().name, "pt_BR");
        drop(outer);
        assert!(!should_use_native_locale());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "inner scope is still open")]
    fn dropping_outer_guard_first_is_caught() {
        let outer = locale_scope("pt_BR").unwrap();
        let _inner = locale_scope("en_US").unwrap();
        drop(outer);
    }

    #[test]
    fn unknown_locale_is_rejected() {
        let err = locale_scope("xx_XX").unwrap_err();
        assert!(matches!(err, Error::UnknownLocale(name) if name == "xx_XX"));
        assert!(!should_use_native_locale());
    }

    #[test]
    fn yaml_registry_merges_over_builtins() {
        let registry = LocaleRegistry::from_yaml_str(
            "locales:\n  - name: de_CH\n    decimal_point: '.'\n    thousands_sep: \"'\"\n",
        )
        .unwrap();
        let swiss = registry.get("de_CH.UTF-8").unwrap();
        assert_eq!(swiss.thousands_sep, Some('\''));
        assert_eq!(swiss.grouping, 3);
        assert!(registry.get("pt_BR").is_ok());
    }

    #[test]
    fn yaml_registry_rejects_ambiguous_separators() {
        let err = LocaleRegistry::from_yaml_str(
            "locales:\n  - name: bad\n    decimal_point: ','\n    thousands_sep: ','\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("both decimal point"));
    }
}
