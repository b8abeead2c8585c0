//! Credential encoding filters: `{{ parameter.password | b64encode }}`.

use base64::{Engine, engine::general_purpose::STANDARD};
use minijinja::{Environment, Error, ErrorKind, Value};

pub(super) fn register(env: &mut Environment<'static>) {
    env.add_filter("b64encode", b64encode);
    env.add_filter("b64decode", b64decode);
}

fn b64encode(value: Value) -> Result<String, Error> {
    value
        .as_bytes()
        .map(|bytes| STANDARD.encode(bytes))
        .ok_or_else(|| invalid(format!("b64encode needs a string, got {}", value.kind())))
}

fn b64decode(value: &str) -> Result<String, Error> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| invalid(format!("b64decode: {e}")))?;
    String::from_utf8(bytes).map_err(|_| invalid("b64decode: the result is not UTF-8".into()))
}

fn invalid(message: String) -> Error {
    Error::new(ErrorKind::InvalidOperation, message)
}
