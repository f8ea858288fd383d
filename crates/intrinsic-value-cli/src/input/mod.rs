pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Structured input from `--input`, else from piped stdin. `None` means the
/// caller should build the input from flags.
pub fn read_structured<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(file::read_input(path)?)),
        None => stdin::read_stdin(),
    }
}
