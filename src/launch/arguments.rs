//! Game command line arguments
//!
//! Launchers pass arguments in three shapes:
//!
//! ```text
//! -key=value      value argument
//! -key value      value argument (value does not start with '-')
//! -flag           solo flag
//! anything        positional
//! ```
//!
//! Keys and flags are stored without their leading dashes.

/// Parsed game arguments, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameArguments {
    flags: Vec<String>,
    values: Vec<(String, String)>,
    positional: Vec<String>,
}

fn strip_dashes(arg: &str) -> &str {
    arg.trim_start_matches('-')
}

impl GameArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a launcher argument list
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let mut parsed = Self::new();
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_ref();
            i += 1;

            if !arg.starts_with('-') || strip_dashes(arg).is_empty() {
                parsed.positional.push(arg.to_string());
                continue;
            }
            if let Some((key, value)) = strip_dashes(arg).split_once('=') {
                parsed.put(key, value);
                continue;
            }
            match args.get(i).map(AsRef::as_ref) {
                Some(next) if !next.starts_with('-') => {
                    parsed.put(strip_dashes(arg), next);
                    i += 1;
                }
                _ => parsed.add_flag(strip_dashes(arg)),
            }
        }
        parsed
    }

    /// Sets a value argument, replacing an earlier value for the key
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
    }

    /// Sets a value argument only when the key is absent
    pub fn put_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.contains_key(&key) {
            self.put(key, value);
        }
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether a solo flag was given
    pub fn contains(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.values.iter().position(|(k, _)| k == key)?;
        Some(self.values.remove(pos).1)
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Renders the arguments back into launcher form
    ///
    /// Flags come first, then `-key=value` pairs, then positionals.
    pub fn to_vec(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|f| format!("-{f}"))
            .chain(self.values.iter().map(|(k, v)| format!("-{k}={v}")))
            .chain(self.positional.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        let args = GameArguments::parse(&[
            "world1",
            "-debug",
            "-cachedir=/tmp/game",
            "-gamemode",
            "sandbox",
            "--nosteam",
            "-port",
            "-x",
        ]);
        assert!(args.contains("debug"));
        assert!(args.contains("nosteam"));
        assert!(args.contains("port"));
        assert_eq!(args.get("cachedir"), Some("/tmp/game"));
        assert_eq!(args.get("gamemode"), Some("sandbox"));
        assert!(args.contains("x"));
        assert_eq!(args.positional(), &["world1".to_string()]);
    }

    #[test]
    fn test_value_with_equals_sign() {
        let args = GameArguments::parse(&["-opt=a=b"]);
        assert_eq!(args.get("opt"), Some("a=b"));
    }

    #[test]
    fn test_put_and_remove() {
        let mut args = GameArguments::new();
        args.put("version", "41");
        args.put("version", "42");
        args.put_if_absent("version", "43");
        assert_eq!(args.get_or("version", "?"), "42");
        assert_eq!(args.remove("version"), Some("42".to_string()));
        assert_eq!(args.get_or("version", "?"), "?");
    }

    #[test]
    fn test_to_vec() {
        let args = GameArguments::parse(&["save", "-a", "-k=v"]);
        assert_eq!(args.to_vec(), vec!["-a", "-k=v", "save"]);
    }
}
