/// Loads a service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field names map to upper-case
/// variable names, optionally behind a shared prefix.
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Variable prefix stripped before matching field names, e.g. `BOTASKAF_`.
    const PREFIX: Option<&'static str> = None;

    fn from_env() -> Result<Self, envy::Error> {
        match Self::PREFIX {
            Some(prefix) => envy::prefixed(prefix).from_env(),
            None => envy::from_env(),
        }
    }

    fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        match Self::PREFIX {
            Some(prefix) => envy::prefixed(prefix).from_iter(vars),
            None => envy::from_iter(vars),
        }
    }
}
