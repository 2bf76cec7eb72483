//! Environment loading lives in its own test binary so that it never shares a
//! process with tests that read `HOST`, `PORT`, `USER` or `PW` concurrently.

use digestcall::{Api, Error};
use serial_test::serial;

const KEYS: [&str; 4] = ["HOST", "PORT", "USER", "PW"];

/// Restores the previous values of [`KEYS`] when dropped, panics included.
struct SavedEnv(Vec<(&'static str, Option<String>)>);

impl SavedEnv {
    fn capture() -> Self {
        SavedEnv(KEYS.iter().map(|&key| (key, std::env::var(key).ok())).collect())
    }
}

impl Drop for SavedEnv {
    fn drop(&mut self) {
        for (key, value) in &self.0 {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

#[test]
#[serial]
fn test_api_from_env() {
    let _saved = SavedEnv::capture();

    std::env::set_var("HOST", "api.example.com");
    std::env::set_var("PORT", "8443");
    std::env::set_var("USER", "alice");
    std::env::set_var("PW", "secret");

    let api = Api::from_env().unwrap();
    assert_eq!(api.client().base_url(), "https://api.example.com:8443");

    std::env::remove_var("PORT");
    let api = Api::from_env().unwrap();
    assert_eq!(api.client().base_url(), "https://api.example.com");

    std::env::remove_var("HOST");
    assert!(matches!(Api::from_env(), Err(Error::ConfigurationError(_))));
}

#[test]
#[serial]
fn test_env_values_are_restored() {
    let before: Vec<Option<String>> = KEYS.iter().map(|key| std::env::var(key).ok()).collect();

    {
        let _saved = SavedEnv::capture();
        std::env::set_var("USER", "mallory");
        std::env::remove_var("PW");
    }

    let after: Vec<Option<String>> = KEYS.iter().map(|key| std::env::var(key).ok()).collect();
    assert_eq!(before, after);
}
